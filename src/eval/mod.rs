// Eval harness — runs labeled fusion/validation cases through the
// real engine and reports TP/FP/FN/TN/precision/recall/F1.
//
// Key insight: we're testing the *decision logic*, not the detectors.
// Cases carry canned detector outputs; the eval checks whether vigil
// reaches the labeled verdict (fusion) or false-positive call
// (validation).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::evidence::EvidenceBundle;
use crate::fusion::{FusionEngine, Verdict};
use crate::signal::Signal;
use crate::validate::ViolenceValidator;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// All errors that can occur while loading an eval dataset.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("failed to read dataset: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse dataset YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),
}

// ---------------------------------------------------------------------------
// Dataset types
// ---------------------------------------------------------------------------

/// One labeled fusion case: canned signals and the expected verdict.
#[derive(Debug, Clone, Deserialize)]
pub struct FusionCase {
    pub id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_criterion")]
    pub criterion: String,
    pub signals: Vec<Signal>,
    pub expected: Verdict,
}

fn default_criterion() -> String {
    "violence".to_string()
}

/// One labeled validation case: a raw violence score, the evidence
/// bundle, and whether the validator should flag a false positive.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationCase {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub violence_score: f64,
    #[serde(default)]
    pub evidence: EvidenceBundle,
    pub expect_false_positive: bool,
}

/// A dataset file: any mix of fusion and validation cases.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dataset {
    #[serde(default)]
    pub fusion_cases: Vec<FusionCase>,
    #[serde(default)]
    pub validation_cases: Vec<ValidationCase>,
}

impl Dataset {
    pub fn is_empty(&self) -> bool {
        self.fusion_cases.is_empty() && self.validation_cases.is_empty()
    }

    fn merge(&mut self, other: Dataset) {
        self.fusion_cases.extend(other.fusion_cases);
        self.validation_cases.extend(other.validation_cases);
    }
}

/// Load a dataset from a YAML file, or merge every `.yaml`/`.yml`
/// file in a directory (sorted by name for determinism).
pub fn load_dataset(path: &Path) -> Result<Dataset, EvalError> {
    if path.is_dir() {
        let mut entries: Vec<_> = std::fs::read_dir(path)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|e| e.path())
            .filter(|p| {
                matches!(
                    p.extension().and_then(|e| e.to_str()),
                    Some("yaml") | Some("yml")
                )
            })
            .collect();
        entries.sort();

        let mut dataset = Dataset::default();
        for entry in entries {
            let content = std::fs::read_to_string(&entry)?;
            dataset.merge(parse_dataset(&content)?);
        }
        Ok(dataset)
    } else {
        let content = std::fs::read_to_string(path)?;
        parse_dataset(&content)
    }
}

/// Parse a single dataset document.
pub fn parse_dataset(yaml: &str) -> Result<Dataset, EvalError> {
    Ok(serde_yaml::from_str(yaml)?)
}

// ---------------------------------------------------------------------------
// Eval result and report
// ---------------------------------------------------------------------------

/// Outcome of one eval case.
#[derive(Debug, Clone, Serialize)]
pub struct EvalResult {
    pub case_id: String,
    /// "fusion" or "validation".
    pub kind: String,
    pub expected: String,
    pub actual: String,
    pub correct: bool,
    pub detail: String,
}

/// Binary classification metrics for one case kind.
///
/// Positive class: verdict UNSAFE for fusion cases, a flagged false
/// positive for validation cases.
#[derive(Debug, Default, Serialize)]
pub struct KindMetrics {
    pub kind: String,
    pub tp: usize,
    pub fp: usize,
    pub fn_count: usize,
    pub tn: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct EvalReport {
    pub metrics: Vec<KindMetrics>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<EvalResult>,
    pub total_cases: usize,
    pub total_correct: usize,
    pub accuracy: f64,
}

// ---------------------------------------------------------------------------
// Runner
// ---------------------------------------------------------------------------

/// Build the engine and validator a dataset runs against.
pub fn build_eval_components(config: &Config) -> (FusionEngine, ViolenceValidator) {
    let engine = FusionEngine::with_config(config.fusion)
        .with_reliability_table(config.reliability.clone());
    let validator = ViolenceValidator::with_config(config.validator.clone());
    (engine, validator)
}

/// Run every case in the dataset.
pub fn run_eval(
    dataset: &Dataset,
    engine: &FusionEngine,
    validator: &ViolenceValidator,
) -> Vec<EvalResult> {
    let mut results = Vec::with_capacity(dataset.fusion_cases.len() + dataset.validation_cases.len());

    for case in &dataset.fusion_cases {
        let outcome = engine.fuse_signals(&case.signals, &case.criterion);
        results.push(EvalResult {
            case_id: case.id.clone(),
            kind: "fusion".to_string(),
            expected: case.expected.as_str().to_string(),
            actual: outcome.verdict.as_str().to_string(),
            correct: outcome.verdict == case.expected,
            detail: format!(
                "score={:.3} confidence={:.3} agreement={}",
                outcome.final_score, outcome.confidence, outcome.agreement_level
            ),
        });
    }

    for case in &dataset.validation_cases {
        let outcome = validator.validate(case.violence_score, &case.evidence);
        let actual_flagged = outcome.is_likely_false_positive;
        results.push(EvalResult {
            case_id: case.id.clone(),
            kind: "validation".to_string(),
            expected: flag_label(case.expect_false_positive).to_string(),
            actual: flag_label(actual_flagged).to_string(),
            correct: actual_flagged == case.expect_false_positive,
            detail: format!(
                "original={:.3} validated={:.3} adjustment={:+.3}",
                outcome.original_score, outcome.validated_score, outcome.confidence_adjustment
            ),
        });
    }

    results
}

fn flag_label(flagged: bool) -> &'static str {
    if flagged {
        "flagged"
    } else {
        "not_flagged"
    }
}

/// Aggregate per-kind metrics and overall accuracy.
pub fn compute_metrics(results: &[EvalResult]) -> EvalReport {
    let mut metrics = Vec::new();
    for (kind, positive) in [("fusion", "unsafe"), ("validation", "flagged")] {
        let of_kind: Vec<&EvalResult> = results.iter().filter(|r| r.kind == kind).collect();
        if of_kind.is_empty() {
            continue;
        }

        let mut m = KindMetrics {
            kind: kind.to_string(),
            total: of_kind.len(),
            ..Default::default()
        };
        for r in &of_kind {
            let expected_positive = r.expected == positive;
            let actual_positive = r.actual == positive;
            match (expected_positive, actual_positive) {
                (true, true) => m.tp += 1,
                (false, true) => m.fp += 1,
                (true, false) => m.fn_count += 1,
                (false, false) => m.tn += 1,
            }
        }
        m.precision = ratio(m.tp, m.tp + m.fp);
        m.recall = ratio(m.tp, m.tp + m.fn_count);
        m.f1 = if m.precision + m.recall > 0.0 {
            2.0 * m.precision * m.recall / (m.precision + m.recall)
        } else {
            0.0
        };
        metrics.push(m);
    }

    let total_cases = results.len();
    let total_correct = results.iter().filter(|r| r.correct).count();
    EvalReport {
        metrics,
        results: Vec::new(),
        total_cases,
        total_correct,
        accuracy: ratio(total_correct, total_cases),
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
