// Copyright 2026 The Vigil Project
// SPDX-License-Identifier: Apache-2.0

//! Latency benchmarks for the decision core.
//!
//! Measures:
//! - fuse_signals on small and full detector sets
//! - validate on a representative evidence bundle
//!
//! Run: cargo bench --bench fusion_latency

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use vigil::evidence::{DetectedObject, EvidenceBundle, OcrItem, SegmentScore};
use vigil::fusion::FusionEngine;
use vigil::signal::{Signal, SignalSource};
use vigil::validate::ViolenceValidator;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn signal_pair() -> Vec<Signal> {
    vec![
        Signal::new(SignalSource::YoloWeapons, 0.9, 0.9, 0.9),
        Signal::new(SignalSource::YoloObjects, 0.85, 0.85, 0.9),
    ]
}

fn full_detector_set() -> Vec<Signal> {
    vec![
        Signal::new(SignalSource::XClip, 0.55, 0.8, 0.9),
        Signal::new(SignalSource::VideoMae, 0.6, 0.85, 0.9),
        Signal::new(SignalSource::Pose, 0.4, 0.6, 0.7),
        Signal::new(SignalSource::YoloObjects, 0.3, 0.9, 0.95),
        Signal::new(SignalSource::YoloWeapons, 0.7, 0.9, 0.95),
        Signal::new(SignalSource::NsfwVisual, 0.05, 0.9, 0.95),
        Signal::new(SignalSource::Transcript, 0.45, 0.7, 1.0),
        Signal::new(SignalSource::Ocr, 0.2, 0.5, 0.4),
    ]
}

fn gym_evidence() -> EvidenceBundle {
    EvidenceBundle {
        violence_segments: (0..20)
            .map(|i| SegmentScore {
                start_time: i as f64,
                score: 0.5 + 0.02 * (i % 3) as f64,
            })
            .collect(),
        ocr_items: vec![OcrItem {
            text: "FULL BODY WORKOUT - 30 minute gym fitness session".to_string(),
        }],
        transcript: "keep your training steady, this exercise works the core, cardio next"
            .to_string(),
        objects: vec![
            DetectedObject {
                label: "treadmill".to_string(),
                category: None,
            },
            DetectedObject {
                label: "dumbbell".to_string(),
                category: None,
            },
        ],
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_fuse_signals(c: &mut Criterion) {
    let engine = FusionEngine::new();
    let mut group = c.benchmark_group("fuse_signals");

    for (name, signals) in [("pair", signal_pair()), ("full_set", full_detector_set())] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &signals, |b, signals| {
            b.iter(|| engine.fuse_signals(black_box(signals), black_box("violence")));
        });
    }

    group.finish();
}

fn bench_validate(c: &mut Criterion) {
    let validator = ViolenceValidator::new();
    let evidence = gym_evidence();

    c.bench_function("validate/gym_evidence", |b| {
        b.iter(|| validator.validate(black_box(0.6), black_box(&evidence)));
    });
}

criterion_group!(benches, bench_fuse_signals, bench_validate);
criterion_main!(benches);
