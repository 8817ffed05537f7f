// Copyright 2026 The Vigil Project
// SPDX-License-Identifier: Apache-2.0

// Violence validation — false-positive suppression for raw violence
// scores.
//
// Five independent strategies each inspect the evidence bundle and
// contribute a signed score adjustment:
// - temporal consistency (isolated spikes vs sustained violence)
// - scene classification (gym/entertainment contexts raise the bar)
// - audio-visual agreement (calm narration over "violent" frames)
// - motion pattern analysis (exercise and choreography look violent)
// - object context (gym equipment vs weapons in frame)
//
// Adjustments are additive; the validated score is the clamped sum.
// A score only flips to "likely false positive" when at least two
// strategies independently pulled it down — a single mitigating
// factor must not flip a genuine positive.

use serde::Serialize;

use crate::evidence::{EvidenceBundle, SegmentScore};
use crate::keywords::{count_hits, matched_keywords, KeywordSets};
use crate::normalize::normalize;
use crate::signal::clamp01;

// ---------------------------------------------------------------------------
// Tuned constants
// ---------------------------------------------------------------------------

/// Per-segment score above which a segment counts as violence-like.
const SEGMENT_VIOLENCE_THRESHOLD: f64 = 0.35;

/// Applied when the violence signal is not temporally consistent.
const TEMPORAL_INCONSISTENCY_ADJUSTMENT: f64 = -0.15;

/// Applied when the scene classifies as sports/gym or entertainment.
const SCENE_CONTEXT_ADJUSTMENT: f64 = -0.20;

/// Applied when audio contradicts the visual violence signal.
const AV_DISAGREEMENT_ADJUSTMENT: f64 = -0.15;

/// Applied when audio strongly corroborates the visual signal.
const AV_AGREEMENT_ADJUSTMENT: f64 = 0.10;

/// Applied for repetitive low-variance motion (exercise, dance).
const MOTION_REPETITIVE_ADJUSTMENT: f64 = -0.20;

/// Applied for controlled sub-maximal motion (sports, choreography).
const MOTION_CONTROLLED_ADJUSTMENT: f64 = -0.10;

/// Applied when gym equipment is visible in frame.
const OBJECT_GYM_ADJUSTMENT: f64 = -0.15;

/// Applied when a weapon is visible in frame.
const OBJECT_WEAPON_ADJUSTMENT: f64 = 0.20;

/// Score gate for the false-positive flag: original above, validated
/// below.
const FALSE_POSITIVE_SCORE_GATE: f64 = 0.3;

/// Minimum count of negative-adjustment strategies before the
/// false-positive flag may be set.
const MIN_NEGATIVE_STRATEGIES: usize = 2;

// ---------------------------------------------------------------------------
// Scene categories
// ---------------------------------------------------------------------------

/// Scene classification derived from on-screen text, transcript, and
/// detected objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SceneCategory {
    #[serde(rename = "sports_gym")]
    SportsGym,
    #[serde(rename = "entertainment")]
    Entertainment,
    #[serde(rename = "educational")]
    Educational,
    #[serde(rename = "public_space")]
    PublicSpace,
    #[serde(rename = "workplace")]
    Workplace,
    #[serde(rename = "residential")]
    Residential,
    #[serde(rename = "unknown")]
    Unknown,
}

impl SceneCategory {
    /// Scene-specific violence threshold. Diagnostic context for the
    /// reporting layer; the validator itself applies only the flat
    /// scene adjustment.
    pub fn violence_threshold(&self) -> f64 {
        match self {
            SceneCategory::SportsGym => 0.75,
            SceneCategory::Entertainment => 0.70,
            SceneCategory::PublicSpace => 0.50,
            SceneCategory::Educational => 0.40,
            SceneCategory::Workplace => 0.45,
            SceneCategory::Residential => 0.50,
            SceneCategory::Unknown => 0.50,
        }
    }
}

// ---------------------------------------------------------------------------
// Per-strategy diagnostics
// ---------------------------------------------------------------------------

/// Temporal consistency diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemporalFactor {
    pub consistent: bool,
    /// Longest run of consecutive violence-like segments.
    pub longest_run: usize,
    pub segments_analyzed: usize,
    /// Set to "insufficient_segments" when fewer than two segments
    /// were available.
    pub reason: Option<String>,
}

/// Scene classification diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneFactor {
    pub scene: SceneCategory,
    pub sports_gym_hits: usize,
    pub entertainment_hits: usize,
    pub educational_hits: usize,
    /// The classified scene's violence threshold, exposed for
    /// downstream interpretation. Never gates anything here.
    pub scene_threshold: f64,
}

/// Audio-visual agreement assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AvAssessment {
    #[serde(rename = "agreement")]
    Agreement,
    #[serde(rename = "disagreement")]
    Disagreement,
    #[serde(rename = "neutral")]
    Neutral,
}

/// Audio-visual agreement diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioVisualFactor {
    pub assessment: AvAssessment,
    pub max_visual_score: f64,
    pub max_text_score: f64,
    pub violence_keyword_hits: usize,
    pub non_violence_keyword_hits: usize,
}

/// Motion pattern diagnostics. Repetitive and controlled are evaluated
/// independently and may both hold; chaotic is classification only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MotionFactor {
    pub repetitive: bool,
    pub controlled: bool,
    pub chaotic: bool,
    pub mean: f64,
    pub std_dev: f64,
    pub samples: usize,
    /// Set to "insufficient_data" with fewer than three samples.
    pub reason: Option<String>,
}

/// Object context diagnostics: labels that matched either list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectFactor {
    pub gym_equipment: Vec<String>,
    pub weapons: Vec<String>,
}

/// Structured diagnostics for all five strategies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationFactors {
    pub temporal_consistency: TemporalFactor,
    pub scene_classification: SceneFactor,
    pub audio_visual: AudioVisualFactor,
    pub motion_pattern: MotionFactor,
    pub object_context: ObjectFactor,
}

// ---------------------------------------------------------------------------
// Validation result
// ---------------------------------------------------------------------------

/// Outcome of validating one raw violence score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    pub original_score: f64,
    pub validated_score: f64,
    /// Signed sum of all fired strategy adjustments.
    pub confidence_adjustment: f64,
    pub is_likely_false_positive: bool,
    pub validation_factors: ValidationFactors,
    pub recommendations: Vec<String>,
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

/// Validator configuration.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Minimum run of consecutive violence-like segments for the
    /// signal to count as temporally consistent.
    pub min_consecutive: usize,
    pub keywords: KeywordSets,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            min_consecutive: 2,
            keywords: KeywordSets::builtin(),
        }
    }
}

/// Applies the five correction strategies to a raw violence score.
///
/// Pure and stateless apart from the keyword lists fixed at
/// construction; safe to share across threads.
pub struct ViolenceValidator {
    config: ValidatorConfig,
}

impl ViolenceValidator {
    pub fn new() -> Self {
        Self {
            config: ValidatorConfig::default(),
        }
    }

    pub fn with_config(config: ValidatorConfig) -> Self {
        Self { config }
    }

    /// Validate a raw violence score against the evidence bundle.
    ///
    /// Never fails: missing evidence degrades the affected strategies
    /// to neutral or "insufficient data" outcomes.
    pub fn validate(&self, violence_score: f64, evidence: &EvidenceBundle) -> ValidationResult {
        let original = clamp01(violence_score);
        let segments = evidence.merged_segments();

        let mut recommendations = Vec::new();

        let (temporal, temporal_adj) = self.check_temporal_consistency(&segments);
        if !temporal.consistent {
            recommendations.push(match temporal.reason.as_deref() {
                Some("insufficient_segments") => {
                    "too few segments to establish temporal consistency".to_string()
                }
                _ => "violence signal is an isolated spike, not sustained".to_string(),
            });
        }

        let (scene, scene_adj) = self.classify_scene(evidence);
        if scene_adj != 0.0 {
            recommendations
                .push("sports/entertainment context detected; higher threshold applied".to_string());
        }

        let (audio_visual, av_adj) = self.check_audio_visual_agreement(evidence, &segments);
        match audio_visual.assessment {
            AvAssessment::Disagreement => recommendations
                .push("audio does not corroborate the visual violence signal".to_string()),
            AvAssessment::Agreement => recommendations
                .push("audio strongly corroborates the visual violence signal".to_string()),
            AvAssessment::Neutral => {}
        }

        let (motion, motion_adj) = self.analyze_motion_pattern(&segments);
        if motion.repetitive {
            recommendations.push("repetitive motion pattern suggests exercise/dance".to_string());
        }
        if motion.controlled {
            recommendations
                .push("controlled motion pattern suggests sports/choreography".to_string());
        }

        let (objects, object_adj) = self.check_object_context(evidence);
        if !objects.gym_equipment.is_empty() {
            recommendations.push("gym equipment visible in frame".to_string());
        }
        if !objects.weapons.is_empty() {
            recommendations.push("weapon visible in frame".to_string());
        }

        let adjustments = [temporal_adj, scene_adj, av_adj, motion_adj, object_adj];
        let total_adjustment: f64 = adjustments.iter().sum();
        let validated = clamp01(original + total_adjustment);

        let negative_strategies = adjustments.iter().filter(|a| **a < 0.0).count();
        let is_likely_false_positive = original > FALSE_POSITIVE_SCORE_GATE
            && validated < FALSE_POSITIVE_SCORE_GATE
            && negative_strategies >= MIN_NEGATIVE_STRATEGIES;

        tracing::debug!(
            original,
            validated,
            total_adjustment,
            negative_strategies,
            is_likely_false_positive,
            "violence validation complete"
        );

        ValidationResult {
            original_score: original,
            validated_score: validated,
            confidence_adjustment: total_adjustment,
            is_likely_false_positive,
            validation_factors: ValidationFactors {
                temporal_consistency: temporal,
                scene_classification: scene,
                audio_visual,
                motion_pattern: motion,
                object_context: objects,
            },
            recommendations,
        }
    }

    // -----------------------------------------------------------------
    // Strategy 1: temporal consistency
    // -----------------------------------------------------------------

    /// Genuine violence sustains across consecutive segments; a lone
    /// hot segment is usually a misfire.
    fn check_temporal_consistency(&self, segments: &[SegmentScore]) -> (TemporalFactor, f64) {
        if segments.len() < 2 {
            let factor = TemporalFactor {
                consistent: false,
                longest_run: 0,
                segments_analyzed: segments.len(),
                reason: Some("insufficient_segments".to_string()),
            };
            return (factor, TEMPORAL_INCONSISTENCY_ADJUSTMENT);
        }

        let mut longest_run = 0usize;
        let mut current_run = 0usize;
        for seg in segments {
            if seg.score > SEGMENT_VIOLENCE_THRESHOLD {
                current_run += 1;
                longest_run = longest_run.max(current_run);
            } else {
                current_run = 0;
            }
        }

        let consistent = longest_run >= self.config.min_consecutive;
        let factor = TemporalFactor {
            consistent,
            longest_run,
            segments_analyzed: segments.len(),
            reason: None,
        };
        let adjustment = if consistent {
            0.0
        } else {
            TEMPORAL_INCONSISTENCY_ADJUSTMENT
        };
        (factor, adjustment)
    }

    // -----------------------------------------------------------------
    // Strategy 2: scene classification
    // -----------------------------------------------------------------

    /// Classify the scene from OCR text, transcript, and detected
    /// objects. Sports/gym and entertainment scenes get the flat
    /// negative adjustment; ties break toward the first maximal
    /// category in enumeration order.
    fn classify_scene(&self, evidence: &EvidenceBundle) -> (SceneFactor, f64) {
        let kw = &self.config.keywords;

        let mut combined = String::new();
        for item in &evidence.ocr_items {
            combined.push_str(&item.text);
            combined.push(' ');
        }
        combined.push_str(&evidence.transcript);
        let text = normalize(&combined);

        let gym_objects = evidence
            .objects
            .iter()
            .filter(|o| !matched_keywords(&o.label, &kw.gym_equipment).is_empty())
            .count();

        let sports_gym_hits = count_hits(&text, &kw.scene_sports_gym) + 2 * gym_objects;
        let entertainment_hits = count_hits(&text, &kw.scene_entertainment);
        let educational_hits = count_hits(&text, &kw.scene_educational);

        let candidates = [
            (SceneCategory::SportsGym, sports_gym_hits),
            (SceneCategory::Entertainment, entertainment_hits),
            (SceneCategory::Educational, educational_hits),
        ];
        let mut scene = SceneCategory::Unknown;
        let mut best = 0usize;
        for (category, hits) in candidates {
            if hits > best {
                scene = category;
                best = hits;
            }
        }

        let adjustment = match scene {
            SceneCategory::SportsGym | SceneCategory::Entertainment => SCENE_CONTEXT_ADJUSTMENT,
            _ => 0.0,
        };

        let factor = SceneFactor {
            scene,
            sports_gym_hits,
            entertainment_hits,
            educational_hits,
            scene_threshold: scene.violence_threshold(),
        };
        (factor, adjustment)
    }

    // -----------------------------------------------------------------
    // Strategy 3: audio-visual agreement
    // -----------------------------------------------------------------

    /// Compare what the frames claim with what the audio claims.
    /// Calm narration over "violent-looking" video is the classic
    /// exercise-channel false positive.
    fn check_audio_visual_agreement(
        &self,
        evidence: &EvidenceBundle,
        segments: &[SegmentScore],
    ) -> (AudioVisualFactor, f64) {
        let kw = &self.config.keywords;
        let text = normalize(&evidence.transcript);

        let violence_hits = count_hits(&text, &kw.violence);
        let non_violence_hits = count_hits(&text, &kw.non_violence);

        let max_visual = segments.iter().map(|s| s.score).fold(0.0_f64, f64::max);
        let max_text = evidence
            .transcript_moderation
            .iter()
            .map(|m| m.violence_score)
            .fold(0.0_f64, f64::max);

        let disagreement =
            max_visual > 0.4 && max_text < 0.2 && non_violence_hits > violence_hits;
        let agreement = max_visual > 0.4 && max_text > 0.3 && violence_hits > non_violence_hits;

        let (assessment, adjustment) = if disagreement {
            (AvAssessment::Disagreement, AV_DISAGREEMENT_ADJUSTMENT)
        } else if agreement {
            (AvAssessment::Agreement, AV_AGREEMENT_ADJUSTMENT)
        } else {
            (AvAssessment::Neutral, 0.0)
        };

        let factor = AudioVisualFactor {
            assessment,
            max_visual_score: max_visual,
            max_text_score: max_text,
            violence_keyword_hits: violence_hits,
            non_violence_keyword_hits: non_violence_hits,
        };
        (factor, adjustment)
    }

    // -----------------------------------------------------------------
    // Strategy 4: motion pattern analysis
    // -----------------------------------------------------------------

    /// Exercise and choreography produce low-variance, sub-maximal
    /// score traces; real violence is erratic. Repetitive and
    /// controlled are independent tests and their adjustments stack.
    fn analyze_motion_pattern(&self, segments: &[SegmentScore]) -> (MotionFactor, f64) {
        let scores: Vec<f64> = segments.iter().map(|s| s.score).collect();
        if scores.len() < 3 {
            let factor = MotionFactor {
                repetitive: false,
                controlled: false,
                chaotic: false,
                mean: 0.0,
                std_dev: 0.0,
                samples: scores.len(),
                reason: Some("insufficient_data".to_string()),
            };
            return (factor, 0.0);
        }

        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();
        let max = scores.iter().copied().fold(0.0_f64, f64::max);

        let repetitive = std_dev < 0.15 && mean < 0.6;
        let controlled = scores.iter().all(|s| *s < 0.7) && std_dev < 0.2;
        let chaotic = std_dev > 0.25 && max > 0.7;

        let mut adjustment = 0.0;
        if repetitive {
            adjustment += MOTION_REPETITIVE_ADJUSTMENT;
        }
        if controlled {
            adjustment += MOTION_CONTROLLED_ADJUSTMENT;
        }

        let factor = MotionFactor {
            repetitive,
            controlled,
            chaotic,
            mean,
            std_dev,
            samples: scores.len(),
            reason: None,
        };
        (factor, adjustment)
    }

    // -----------------------------------------------------------------
    // Strategy 5: object context
    // -----------------------------------------------------------------

    /// Gym equipment in frame argues for a workout; a weapon in frame
    /// argues the other way. Both can hold at once and both apply.
    fn check_object_context(&self, evidence: &EvidenceBundle) -> (ObjectFactor, f64) {
        let kw = &self.config.keywords;

        let mut gym_labels = Vec::new();
        let mut weapon_labels = Vec::new();
        for obj in &evidence.objects {
            if !matched_keywords(&obj.label, &kw.gym_equipment).is_empty() {
                gym_labels.push(obj.label.clone());
            }
            if !matched_keywords(&obj.label, &kw.weapons).is_empty() {
                weapon_labels.push(obj.label.clone());
            }
        }

        let mut adjustment = 0.0;
        if !gym_labels.is_empty() {
            adjustment += OBJECT_GYM_ADJUSTMENT;
        }
        if !weapon_labels.is_empty() {
            adjustment += OBJECT_WEAPON_ADJUSTMENT;
        }

        let factor = ObjectFactor {
            gym_equipment: gym_labels,
            weapons: weapon_labels,
        };
        (factor, adjustment)
    }
}

impl Default for ViolenceValidator {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
