// Static signal reliability knowledge base.
//
// Per-source trust profiles, set empirically from offline evaluation
// runs and fixed at compile time. The table is a plain static slice —
// defined once, read-only, no lazy initialization — and lookup falls
// back to a moderate default profile for any source absent from the
// effective table, so an unmodeled source degrades fusion instead of
// breaking it.

use serde::{Deserialize, Serialize};

use super::SignalSource;

// ---------------------------------------------------------------------------
// Reliability profile
// ---------------------------------------------------------------------------

/// Static per-source reliability profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalReliability {
    /// Trust in this source when the model fires, in [0, 1].
    pub base_reliability: f64,
    /// How strongly incomplete coverage should discount this source.
    pub coverage_weight: f64,
    /// Observed false-positive rate; calibration input, informational.
    pub false_positive_rate: f64,
    /// This signal alone cannot justify an UNSAFE verdict.
    pub requires_confirmation: bool,
}

/// Profile applied to any source absent from the effective table.
///
/// Moderately trustworthy on purpose: an unknown source must not crash
/// fusion, and must not dominate it either.
pub const DEFAULT_RELIABILITY: SignalReliability = SignalReliability {
    base_reliability: 0.5,
    coverage_weight: 0.5,
    false_positive_rate: 0.1,
    requires_confirmation: false,
};

// ---------------------------------------------------------------------------
// Built-in table
// ---------------------------------------------------------------------------

/// Reliability profiles for the nine modeled sources.
///
/// Frame-level video classifiers (xclip, videomae) are trusted but
/// punished hard for sparse sampling. Object detectors are the most
/// reliable when they fire. OCR is noisy enough that a high score
/// needs corroboration before an UNSAFE verdict; the open-vocabulary
/// detector (yoloworld) carries the same restriction.
pub static RELIABILITY_TABLE: &[(SignalSource, SignalReliability)] = &[
    (
        SignalSource::XClip,
        SignalReliability {
            base_reliability: 0.75,
            coverage_weight: 0.8,
            false_positive_rate: 0.15,
            requires_confirmation: false,
        },
    ),
    (
        SignalSource::VideoMae,
        SignalReliability {
            base_reliability: 0.80,
            coverage_weight: 0.8,
            false_positive_rate: 0.12,
            requires_confirmation: false,
        },
    ),
    (
        SignalSource::Pose,
        SignalReliability {
            base_reliability: 0.65,
            coverage_weight: 0.6,
            false_positive_rate: 0.20,
            requires_confirmation: false,
        },
    ),
    (
        SignalSource::YoloObjects,
        SignalReliability {
            base_reliability: 0.85,
            coverage_weight: 0.7,
            false_positive_rate: 0.10,
            requires_confirmation: false,
        },
    ),
    (
        SignalSource::YoloWeapons,
        SignalReliability {
            base_reliability: 0.90,
            coverage_weight: 0.7,
            false_positive_rate: 0.08,
            requires_confirmation: false,
        },
    ),
    (
        SignalSource::YoloWorld,
        SignalReliability {
            base_reliability: 0.70,
            coverage_weight: 0.6,
            false_positive_rate: 0.18,
            requires_confirmation: true,
        },
    ),
    (
        SignalSource::NsfwVisual,
        SignalReliability {
            base_reliability: 0.85,
            coverage_weight: 0.9,
            false_positive_rate: 0.10,
            requires_confirmation: false,
        },
    ),
    (
        SignalSource::Transcript,
        SignalReliability {
            base_reliability: 0.75,
            coverage_weight: 0.4,
            false_positive_rate: 0.12,
            requires_confirmation: false,
        },
    ),
    (
        SignalSource::Ocr,
        SignalReliability {
            base_reliability: 0.60,
            coverage_weight: 0.3,
            false_positive_rate: 0.25,
            requires_confirmation: true,
        },
    ),
];

/// Look up a source's profile in a table, falling back to
/// `DEFAULT_RELIABILITY` when the source is not listed.
pub fn reliability_for(
    table: &[(SignalSource, SignalReliability)],
    source: SignalSource,
) -> SignalReliability {
    table
        .iter()
        .find(|(s, _)| *s == source)
        .map(|(_, r)| *r)
        .unwrap_or(DEFAULT_RELIABILITY)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_table_covers_all_sources() {
        for source in [
            SignalSource::XClip,
            SignalSource::VideoMae,
            SignalSource::Pose,
            SignalSource::YoloObjects,
            SignalSource::YoloWeapons,
            SignalSource::YoloWorld,
            SignalSource::NsfwVisual,
            SignalSource::Transcript,
            SignalSource::Ocr,
        ] {
            let profile = reliability_for(RELIABILITY_TABLE, source);
            assert_ne!(
                profile, DEFAULT_RELIABILITY,
                "{source} should have an explicit profile"
            );
        }
    }

    #[test]
    fn missing_source_falls_back_to_default() {
        // A table that only models weapons: everything else degrades
        // to the default profile instead of failing the lookup.
        let partial = &[(
            SignalSource::YoloWeapons,
            reliability_for(RELIABILITY_TABLE, SignalSource::YoloWeapons),
        )];
        let profile = reliability_for(partial, SignalSource::Ocr);
        assert_eq!(profile, DEFAULT_RELIABILITY);
        assert_eq!(profile.base_reliability, 0.5);
        assert!(!profile.requires_confirmation);
    }

    #[test]
    fn profiles_are_in_range() {
        for (_, r) in RELIABILITY_TABLE {
            assert!((0.0..=1.0).contains(&r.base_reliability));
            assert!((0.0..=1.0).contains(&r.coverage_weight));
            assert!((0.0..=1.0).contains(&r.false_positive_rate));
        }
    }

    #[test]
    fn confirmation_required_for_ocr_and_open_vocabulary() {
        assert!(reliability_for(RELIABILITY_TABLE, SignalSource::Ocr).requires_confirmation);
        assert!(reliability_for(RELIABILITY_TABLE, SignalSource::YoloWorld).requires_confirmation);
        assert!(
            !reliability_for(RELIABILITY_TABLE, SignalSource::YoloWeapons).requires_confirmation
        );
    }
}
