// Copyright 2026 The Vigil Project
// SPDX-License-Identifier: Apache-2.0

// Signal types for the fusion engine.
//
// Detectors emit Signals (normalized observations for one criterion).
// The FusionEngine combines them into a FusionResult. A Signal carries
// its own confidence (the model's certainty) and coverage (how much of
// the content the detector actually analyzed) — the two are distinct
// and both feed the reliability weighting.

pub mod reliability;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Signal source
// ---------------------------------------------------------------------------

/// Identifies which detector produced a signal.
///
/// Closed set: adding a source means adding a reliability profile in
/// `reliability::RELIABILITY_TABLE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalSource {
    #[serde(rename = "xclip")]
    XClip,
    #[serde(rename = "videomae")]
    VideoMae,
    #[serde(rename = "pose")]
    Pose,
    #[serde(rename = "yolo_objects")]
    YoloObjects,
    #[serde(rename = "yolo_weapons")]
    YoloWeapons,
    #[serde(rename = "yoloworld")]
    YoloWorld,
    #[serde(rename = "nsfw_visual")]
    NsfwVisual,
    #[serde(rename = "transcript")]
    Transcript,
    #[serde(rename = "ocr")]
    Ocr,
}

impl SignalSource {
    /// The serialized spelling, shared with every boundary format.
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalSource::XClip => "xclip",
            SignalSource::VideoMae => "videomae",
            SignalSource::Pose => "pose",
            SignalSource::YoloObjects => "yolo_objects",
            SignalSource::YoloWeapons => "yolo_weapons",
            SignalSource::YoloWorld => "yoloworld",
            SignalSource::NsfwVisual => "nsfw_visual",
            SignalSource::Transcript => "transcript",
            SignalSource::Ocr => "ocr",
        }
    }
}

impl std::fmt::Display for SignalSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Signal
// ---------------------------------------------------------------------------

/// One observation for one criterion from one detector at fusion time.
///
/// Immutable once constructed; `score`, `confidence`, and `coverage`
/// are clamped to [0.0, 1.0] at construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub source: SignalSource,
    /// Raw severity of the observation.
    pub score: f64,
    /// The model's own certainty in the observation.
    pub confidence: f64,
    /// Fraction of the content this detector actually analyzed.
    pub coverage: f64,
    /// Number of detection occurrences behind this signal.
    #[serde(default = "default_count")]
    pub count: u32,
    /// Free-form detector metadata. Carries no control meaning.
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

fn default_count() -> u32 {
    1
}

impl Signal {
    /// Construct a signal with clamped score, confidence, and coverage.
    ///
    /// NaN and -INFINITY clamp to 0.0; INFINITY clamps to 1.0.
    pub fn new(source: SignalSource, score: f64, confidence: f64, coverage: f64) -> Self {
        Self {
            source,
            score: clamp01(score),
            confidence: clamp01(confidence),
            coverage: clamp01(coverage),
            count: 1,
            metadata: HashMap::new(),
        }
    }

    /// Set the detection occurrence count.
    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// Clamp an f64 to [0.0, 1.0], handling NaN and infinities.
pub(crate) fn clamp01(v: f64) -> f64 {
    if v.is_nan() || v == f64::NEG_INFINITY {
        0.0
    } else if v == f64::INFINITY {
        1.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_new_clamps_nan_to_zero() {
        let s = Signal::new(SignalSource::XClip, f64::NAN, f64::NAN, f64::NAN);
        assert_eq!(s.score, 0.0);
        assert_eq!(s.confidence, 0.0);
        assert_eq!(s.coverage, 0.0);
    }

    #[test]
    fn signal_new_clamps_neg_infinity_to_zero() {
        let s = Signal::new(SignalSource::Pose, f64::NEG_INFINITY, 0.5, 0.5);
        assert_eq!(s.score, 0.0);
    }

    #[test]
    fn signal_new_clamps_infinity_to_one() {
        let s = Signal::new(SignalSource::Pose, f64::INFINITY, 0.5, 0.5);
        assert_eq!(s.score, 1.0);
    }

    #[test]
    fn signal_new_clamps_out_of_range() {
        let s = Signal::new(SignalSource::Ocr, -0.5, 1.5, 2.0);
        assert_eq!(s.score, 0.0);
        assert_eq!(s.confidence, 1.0);
        assert_eq!(s.coverage, 1.0);
    }

    #[test]
    fn signal_new_preserves_valid_values() {
        let s = Signal::new(SignalSource::VideoMae, 0.7, 0.9, 0.8);
        assert!((s.score - 0.7).abs() < f64::EPSILON);
        assert!((s.confidence - 0.9).abs() < f64::EPSILON);
        assert!((s.coverage - 0.8).abs() < f64::EPSILON);
        assert_eq!(s.count, 1);
    }

    #[test]
    fn source_spellings_are_stable() {
        assert_eq!(SignalSource::XClip.as_str(), "xclip");
        assert_eq!(SignalSource::VideoMae.as_str(), "videomae");
        assert_eq!(SignalSource::YoloObjects.as_str(), "yolo_objects");
        assert_eq!(SignalSource::YoloWeapons.as_str(), "yolo_weapons");
        assert_eq!(SignalSource::YoloWorld.as_str(), "yoloworld");
        assert_eq!(SignalSource::NsfwVisual.as_str(), "nsfw_visual");
    }

    #[test]
    fn source_serde_round_trips_spellings() {
        let json = serde_json::to_string(&SignalSource::YoloWeapons).unwrap();
        assert_eq!(json, "\"yolo_weapons\"");
        let back: SignalSource = serde_json::from_str("\"videomae\"").unwrap();
        assert_eq!(back, SignalSource::VideoMae);
    }

    #[test]
    fn signal_deserializes_with_default_count() {
        let s: Signal = serde_json::from_str(
            r#"{"source": "ocr", "score": 0.8, "confidence": 0.5, "coverage": 0.4}"#,
        )
        .unwrap();
        assert_eq!(s.count, 1);
        assert!(s.metadata.is_empty());
    }
}
