// Copyright 2026 The Vigil Project
// SPDX-License-Identifier: Apache-2.0

// Reliability-weighted fusion — combines per-criterion signals into a
// calibrated score, a confidence estimate, and a discrete verdict.
//
// Pipeline, in order: coverage filter -> reliability-weighted pooling
// -> coverage sigmoid -> agreement assessment -> calibration sigmoid
// -> confidence blend -> verdict policy. The engine is a pure function
// of its inputs; the only shared state is the read-only reliability
// table fixed at construction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::signal::reliability::{reliability_for, SignalReliability, RELIABILITY_TABLE};
use crate::signal::{clamp01, Signal, SignalSource};


// ---------------------------------------------------------------------------
// Tuned constants
// ---------------------------------------------------------------------------

/// Signals at or below this raw score are noise and never enter
/// pooling.
const SCORE_FLOOR: f64 = 0.01;

/// Surviving signals above this score are listed as contributing.
const CONTRIBUTING_FLOOR: f64 = 0.1;

/// Discount applied to the best raw score when no signal passes the
/// coverage filter: we saw something but cannot trust it.
const INSUFFICIENT_DATA_DISCOUNT: f64 = 0.3;

/// Fixed confidence reported on the insufficient-data path.
const INSUFFICIENT_DATA_CONFIDENCE: f64 = 0.2;

/// Steepness of the coverage sigmoid (centered at 50% coverage).
const COVERAGE_SIGMOID_STEEPNESS: f64 = 8.0;

/// Steepness of the calibration sigmoid; polarizes mid-range scores.
const CALIBRATION_SIGMOID_STEEPNESS: f64 = 6.0;

/// Score above which a signal lands in the high agreement bucket.
const HIGH_BUCKET_FLOOR: f64 = 0.6;

/// Score at or below which a signal lands in the low bucket.
const LOW_BUCKET_CEILING: f64 = 0.3;

/// Penalty when high- and low-bucket signals coexist.
const CONFLICT_PENALTY: f64 = -0.10;

/// Bonus for high agreement backed by two or more high scores.
const HIGH_AGREEMENT_BONUS: f64 = 0.15;

/// Bonus for high agreement on weaker scores, and for moderate
/// agreement.
const WEAK_AGREEMENT_BONUS: f64 = 0.05;

/// Agreement ratio at or above which agreement is high.
const HIGH_AGREEMENT_RATIO: f64 = 0.75;

/// Agreement ratio at or above which agreement is moderate.
const MODERATE_AGREEMENT_RATIO: f64 = 0.5;

/// Score above which a signal counts as strong for the verdict policy.
const STRONG_SIGNAL_FLOOR: f64 = 0.6;

/// Score above which a confirmation-requiring source triggers the
/// needs-confirmation rule.
const CONFIRMATION_SCORE_FLOOR: f64 = 0.5;

/// Confidence gate for the corroborated UNSAFE path.
const UNSAFE_HIGH_CONFIDENCE: f64 = 0.6;

/// Confidence gate for the uncorroborated UNSAFE path and for CAUTION.
const DECISION_CONFIDENCE: f64 = 0.5;

/// Strong-signal count that upgrades to UNSAFE even at low confidence.
const MIN_CORROBORATING_STRONG: usize = 2;

// ---------------------------------------------------------------------------
// Verdict and agreement types
// ---------------------------------------------------------------------------

/// The engine's recommended verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    #[serde(rename = "safe")]
    Safe,
    #[serde(rename = "caution")]
    Caution,
    #[serde(rename = "unsafe")]
    Unsafe,
    #[serde(rename = "needs_review")]
    NeedsReview,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Safe => "safe",
            Verdict::Caution => "caution",
            Verdict::Unsafe => "unsafe",
            Verdict::NeedsReview => "needs_review",
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How consistent the surviving signals are with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgreementLevel {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "insufficient_data")]
    InsufficientData,
    #[serde(rename = "single_source")]
    SingleSource,
    #[serde(rename = "high")]
    High,
    #[serde(rename = "moderate")]
    Moderate,
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "conflicting")]
    Conflicting,
}

impl AgreementLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgreementLevel::None => "none",
            AgreementLevel::InsufficientData => "insufficient_data",
            AgreementLevel::SingleSource => "single_source",
            AgreementLevel::High => "high",
            AgreementLevel::Moderate => "moderate",
            AgreementLevel::Low => "low",
            AgreementLevel::Conflicting => "conflicting",
        }
    }

    /// Contribution of the agreement level to the confidence blend.
    fn confidence_factor(&self) -> f64 {
        match self {
            AgreementLevel::High => 1.0,
            AgreementLevel::Moderate => 0.8,
            AgreementLevel::Low => 0.6,
            AgreementLevel::Conflicting => 0.4,
            AgreementLevel::SingleSource => 0.5,
            AgreementLevel::InsufficientData => 0.2,
            AgreementLevel::None => 0.0,
        }
    }
}

impl std::fmt::Display for AgreementLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Fusion result
// ---------------------------------------------------------------------------

/// Output of one fusion call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FusionResult {
    /// Calibrated probability-like score in [0, 1].
    pub final_score: f64,
    /// Confidence in the verdict, in [0, 1].
    pub confidence: f64,
    pub verdict: Verdict,
    /// Serialized source names of surviving signals with score above
    /// the contributing floor, in input order.
    pub contributing_signals: Vec<String>,
    pub agreement_level: AgreementLevel,
    /// Purely explanatory diagnostics. Carries no control meaning.
    pub debug_info: HashMap<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Engine configuration
// ---------------------------------------------------------------------------

/// Fusion thresholds. All overridable via config.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Calibrated score at or above which UNSAFE becomes reachable.
    pub unsafe_threshold: f64,
    /// Calibrated score at or above which CAUTION becomes reachable.
    pub caution_threshold: f64,
    /// Mid-band score above which low confidence escalates to review.
    pub review_threshold: f64,
    /// Coverage below which a signal is excluded from pooling.
    pub min_coverage: f64,
    /// Strong signals required for the high-confidence UNSAFE path.
    pub min_signals_for_unsafe: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            unsafe_threshold: 0.70,
            caution_threshold: 0.35,
            review_threshold: 0.50,
            min_coverage: 0.3,
            min_signals_for_unsafe: 2,
        }
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Combines per-criterion signals into a `FusionResult`.
///
/// Stateless apart from configuration and the reliability table, both
/// fixed at construction; safe to share across threads.
pub struct FusionEngine {
    config: FusionConfig,
    reliability: Vec<(SignalSource, SignalReliability)>,
}

impl FusionEngine {
    pub fn new() -> Self {
        Self::with_config(FusionConfig::default())
    }

    pub fn with_config(config: FusionConfig) -> Self {
        Self {
            config,
            reliability: RELIABILITY_TABLE.to_vec(),
        }
    }

    /// Replace the reliability table. Sources absent from the table
    /// fall back to the default profile.
    pub fn with_reliability_table(
        mut self,
        table: Vec<(SignalSource, SignalReliability)>,
    ) -> Self {
        self.reliability = table;
        self
    }

    pub fn config(&self) -> &FusionConfig {
        &self.config
    }

    fn reliability(&self, source: SignalSource) -> SignalReliability {
        reliability_for(&self.reliability, source)
    }

    /// Fuse an ordered set of signals for one criterion.
    ///
    /// `criterion` labels the call in logs and diagnostics; thresholds
    /// are engine-global and no logic branches on it.
    pub fn fuse_signals(&self, signals: &[Signal], criterion: &str) -> FusionResult {
        if signals.is_empty() {
            let mut debug_info = HashMap::new();
            debug_info.insert("criterion".to_string(), criterion.into());
            debug_info.insert("reason".to_string(), "no_signals".into());
            return FusionResult {
                final_score: 0.0,
                confidence: 0.0,
                verdict: Verdict::Safe,
                contributing_signals: Vec::new(),
                agreement_level: AgreementLevel::None,
                debug_info,
            };
        }

        // Step 1: coverage filter.
        let surviving: Vec<&Signal> = signals
            .iter()
            .filter(|s| s.score > SCORE_FLOOR && s.coverage >= self.config.min_coverage)
            .collect();

        tracing::debug!(
            criterion,
            total = signals.len(),
            surviving = surviving.len(),
            "fusion filter applied"
        );

        if surviving.is_empty() {
            return self.insufficient_data_result(signals, criterion);
        }

        // Step 2: reliability-weighted pooling.
        let mut weighted_sum = 0.0;
        let mut weight_sum = 0.0;
        for s in &surviving {
            let reliability = self.reliability(s.source);
            let effective_weight = reliability.base_reliability * s.confidence;
            let coverage_adjusted_weight =
                effective_weight * (1.0 - reliability.coverage_weight * (1.0 - s.coverage));
            weighted_sum += s.score * coverage_adjusted_weight;
            weight_sum += coverage_adjusted_weight;
        }
        let weighted_mean = if weight_sum > 0.0 {
            weighted_sum / weight_sum
        } else {
            0.0
        };

        // Step 3: coverage factor over mean surviving coverage.
        let avg_coverage =
            surviving.iter().map(|s| s.coverage).sum::<f64>() / surviving.len() as f64;
        let coverage_factor = sigmoid(COVERAGE_SIGMOID_STEEPNESS * (avg_coverage - 0.5));

        // Step 4: agreement assessment.
        let (agreement, agreement_bonus) = assess_agreement(&surviving);

        // Step 5: calibration. The coverage factor only discounts
        // toward a half-effect floor, never fully zeroes the score.
        let coverage_adjusted = weighted_mean * (0.5 + 0.5 * coverage_factor);
        let agreement_adjusted = coverage_adjusted + agreement_bonus;
        let final_score = clamp01(sigmoid(
            CALIBRATION_SIGMOID_STEEPNESS * (agreement_adjusted - 0.5),
        ));

        // Step 6: confidence blend.
        let avg_confidence =
            surviving.iter().map(|s| s.confidence).sum::<f64>() / surviving.len() as f64;
        let count_factor = (surviving.len() as f64 / 3.0).min(1.0);
        let confidence = clamp01(
            0.4 * avg_confidence
                + 0.3 * count_factor
                + 0.2 * agreement.confidence_factor()
                + 0.1 * coverage_factor,
        );

        // Step 7: verdict policy.
        let (verdict, strong_signals, needs_confirmation) =
            self.determine_verdict(final_score, confidence, &surviving, agreement);

        // Step 8: contributing signals, in input order.
        let contributing_signals: Vec<String> = surviving
            .iter()
            .filter(|s| s.score > CONTRIBUTING_FLOOR)
            .map(|s| s.source.as_str().to_string())
            .collect();

        tracing::debug!(
            criterion,
            final_score,
            confidence,
            verdict = %verdict,
            agreement = %agreement,
            "fusion complete"
        );

        let mut debug_info = HashMap::new();
        debug_info.insert("criterion".to_string(), criterion.into());
        debug_info.insert("weighted_mean".to_string(), weighted_mean.into());
        debug_info.insert("avg_coverage".to_string(), avg_coverage.into());
        debug_info.insert("coverage_factor".to_string(), coverage_factor.into());
        debug_info.insert("agreement_bonus".to_string(), agreement_bonus.into());
        debug_info.insert("agreement_adjusted".to_string(), agreement_adjusted.into());
        debug_info.insert("num_signals".to_string(), signals.len().into());
        debug_info.insert("num_surviving".to_string(), surviving.len().into());
        debug_info.insert("strong_signals".to_string(), strong_signals.into());
        debug_info.insert("needs_confirmation".to_string(), needs_confirmation.into());

        FusionResult {
            final_score,
            confidence,
            verdict,
            contributing_signals,
            agreement_level: agreement,
            debug_info,
        }
    }

    /// No signal passed the coverage filter: report the best raw score
    /// heavily discounted, at fixed low confidence.
    fn insufficient_data_result(&self, signals: &[Signal], criterion: &str) -> FusionResult {
        let max_raw = signals.iter().map(|s| s.score).fold(0.0_f64, f64::max);
        let final_score = max_raw * INSUFFICIENT_DATA_DISCOUNT;
        let verdict = if max_raw > self.config.review_threshold {
            Verdict::NeedsReview
        } else {
            Verdict::Safe
        };

        if max_raw > self.config.review_threshold {
            tracing::warn!(
                criterion,
                max_raw,
                "high raw score with insufficient coverage; escalating to review"
            );
        }

        let mut debug_info = HashMap::new();
        debug_info.insert("criterion".to_string(), criterion.into());
        debug_info.insert("reason".to_string(), "insufficient_coverage".into());
        debug_info.insert("max_raw_score".to_string(), max_raw.into());
        debug_info.insert("num_signals".to_string(), signals.len().into());

        FusionResult {
            final_score,
            confidence: INSUFFICIENT_DATA_CONFIDENCE,
            verdict,
            contributing_signals: Vec::new(),
            agreement_level: AgreementLevel::InsufficientData,
            debug_info,
        }
    }

    /// Ordered verdict rules. Conflict detection and the
    /// requires-confirmation rule come first so a single unreliable
    /// high-scoring signal cannot produce a false UNSAFE.
    fn determine_verdict(
        &self,
        score: f64,
        confidence: f64,
        surviving: &[&Signal],
        agreement: AgreementLevel,
    ) -> (Verdict, usize, bool) {
        let strong_signals = surviving
            .iter()
            .filter(|s| s.score > STRONG_SIGNAL_FLOOR)
            .count();
        let needs_confirmation = surviving.iter().any(|s| {
            self.reliability(s.source).requires_confirmation && s.score > CONFIRMATION_SCORE_FLOOR
        });

        let verdict = if score >= self.config.unsafe_threshold {
            if agreement == AgreementLevel::Conflicting {
                Verdict::NeedsReview
            } else if confidence >= UNSAFE_HIGH_CONFIDENCE
                && strong_signals >= self.config.min_signals_for_unsafe
            {
                Verdict::Unsafe
            } else if confidence >= DECISION_CONFIDENCE && !needs_confirmation {
                Verdict::Unsafe
            } else if strong_signals >= MIN_CORROBORATING_STRONG {
                Verdict::Unsafe
            } else {
                Verdict::NeedsReview
            }
        } else if score >= self.config.caution_threshold {
            if agreement == AgreementLevel::Conflicting {
                Verdict::NeedsReview
            } else if confidence >= DECISION_CONFIDENCE {
                Verdict::Caution
            } else if score > self.config.review_threshold {
                Verdict::NeedsReview
            } else {
                Verdict::Caution
            }
        } else {
            Verdict::Safe
        };

        (verdict, strong_signals, needs_confirmation)
    }
}

impl Default for FusionEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Bucket surviving signals and classify their agreement.
///
/// Conflict (a high-bucket and a low-bucket signal coexisting) is
/// checked before the ratio branches: conflicting evidence overrides
/// an otherwise-high agreement ratio.
fn assess_agreement(surviving: &[&Signal]) -> (AgreementLevel, f64) {
    if surviving.len() < 2 {
        return (AgreementLevel::SingleSource, 0.0);
    }

    let mut high = 0usize;
    let mut medium = 0usize;
    let mut low = 0usize;
    for s in surviving {
        if s.score > HIGH_BUCKET_FLOOR {
            high += 1;
        } else if s.score > LOW_BUCKET_CEILING {
            medium += 1;
        } else {
            low += 1;
        }
    }

    if high > 0 && low > 0 {
        return (AgreementLevel::Conflicting, CONFLICT_PENALTY);
    }

    let total = surviving.len() as f64;
    let agreement_ratio = high.max(medium).max(low) as f64 / total;

    if agreement_ratio >= HIGH_AGREEMENT_RATIO {
        let bonus = if high >= 2 {
            HIGH_AGREEMENT_BONUS
        } else {
            WEAK_AGREEMENT_BONUS
        };
        (AgreementLevel::High, bonus)
    } else if agreement_ratio >= MODERATE_AGREEMENT_RATIO {
        (AgreementLevel::Moderate, WEAK_AGREEMENT_BONUS)
    } else {
        (AgreementLevel::Low, 0.0)
    }
}
