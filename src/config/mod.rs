// Config loader and validator.
//
// Loads vigil.yaml, validates structure and ranges, resolves
// reliability overrides against the built-in table, and computes a
// deterministic contract hash over the raw YAML for audit logging.

use std::collections::HashMap;
use std::path::PathBuf;

use sha2::{Digest, Sha256};

use crate::fusion::FusionConfig;
use crate::keywords::KeywordSets;
use crate::signal::reliability::{SignalReliability, RELIABILITY_TABLE};
use crate::signal::SignalSource;
use crate::validate::ValidatorConfig;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// All errors that can occur during config loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config source: {0}")]
    IoError(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

// ---------------------------------------------------------------------------
// ConfigSource trait (interface-first, dependency injection)
// ---------------------------------------------------------------------------

/// Abstraction over where config YAML comes from.
///
/// `FileSource` reads from disk; `StringSource` provides content
/// directly (used in tests to avoid file I/O).
pub trait ConfigSource {
    fn load(&self) -> Result<String, ConfigError>;
}

/// Loads config from a file on disk.
pub struct FileSource {
    pub path: PathBuf,
}

impl ConfigSource for FileSource {
    fn load(&self) -> Result<String, ConfigError> {
        Ok(std::fs::read_to_string(&self.path)?)
    }
}

/// Provides config content directly as a string. Used for testing.
pub struct StringSource {
    pub content: String,
}

impl ConfigSource for StringSource {
    fn load(&self) -> Result<String, ConfigError> {
        Ok(self.content.clone())
    }
}

// ---------------------------------------------------------------------------
// Typed config
// ---------------------------------------------------------------------------

/// Top-level parsed and validated vigil config.
#[derive(Debug, Clone)]
pub struct Config {
    /// Contract version. Always "v1".
    pub version: String,
    /// Fusion thresholds.
    pub fusion: FusionConfig,
    /// Validator settings and keyword lists.
    pub validator: ValidatorConfig,
    /// Effective reliability table: built-in profiles with any
    /// per-source overrides applied.
    pub reliability: Vec<(SignalSource, SignalReliability)>,
    /// Environment label (e.g. "internal", "production").
    pub environment: String,
    /// SHA256 hash of the raw YAML bytes: "sha256:{hex}".
    pub contract_hash: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "v1".to_string(),
            fusion: FusionConfig::default(),
            validator: ValidatorConfig::default(),
            reliability: RELIABILITY_TABLE.to_vec(),
            environment: String::new(),
            contract_hash: String::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Raw YAML deserialization types (internal)
// ---------------------------------------------------------------------------
// Separate from the public Config structs: serde sees loose optional
// shapes here, and validation/override resolution happens between raw
// and public.

mod raw {
    use std::collections::HashMap;

    use serde::Deserialize;

    use crate::keywords::KeywordSets;
    use crate::signal::reliability::SignalReliability;

    #[derive(Debug, Deserialize)]
    pub struct RawConfig {
        pub vigil: String,
        pub fusion: Option<RawFusionConfig>,
        pub validator: Option<RawValidatorConfig>,
        #[serde(default)]
        pub reliability: HashMap<String, SignalReliability>,
        pub keywords: Option<KeywordSets>,
        pub environment: Option<String>,
    }

    #[derive(Debug, Default, Deserialize)]
    pub struct RawFusionConfig {
        pub unsafe_threshold: Option<f64>,
        pub caution_threshold: Option<f64>,
        pub review_threshold: Option<f64>,
        pub min_coverage: Option<f64>,
        pub min_signals_for_unsafe: Option<usize>,
    }

    #[derive(Debug, Default, Deserialize)]
    pub struct RawValidatorConfig {
        pub min_consecutive: Option<usize>,
    }
}

// ---------------------------------------------------------------------------
// Config loading and validation
// ---------------------------------------------------------------------------

/// Load and validate a vigil config from the given source.
///
/// Steps:
/// 1. Read raw YAML from source
/// 2. Compute SHA256 contract hash
/// 3. Parse YAML into raw deserialization types
/// 4. Validate version and threshold ranges
/// 5. Resolve reliability overrides against the built-in table
/// 6. Build the typed Config
pub fn load_config(source: &dyn ConfigSource) -> Result<Config, ConfigError> {
    let raw_yaml = source.load()?;
    let contract_hash = compute_hash(&raw_yaml);

    let raw: raw::RawConfig = serde_yaml::from_str(&raw_yaml)?;

    if raw.vigil != "v1" {
        return Err(ConfigError::Validation(format!(
            "unsupported contract version \"{}\", expected \"v1\"",
            raw.vigil
        )));
    }

    let fusion = build_fusion_config(raw.fusion.unwrap_or_default())?;
    let validator = build_validator_config(raw.validator.unwrap_or_default(), raw.keywords);
    let reliability = build_reliability_table(&raw.reliability)?;

    Ok(Config {
        version: raw.vigil,
        fusion,
        validator,
        reliability,
        environment: raw.environment.unwrap_or_default(),
        contract_hash,
    })
}

fn compute_hash(raw_yaml: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_yaml.as_bytes());
    let hash = hasher.finalize();
    format!("sha256:{:x}", hash)
}

fn build_fusion_config(raw: raw::RawFusionConfig) -> Result<FusionConfig, ConfigError> {
    let defaults = FusionConfig::default();
    let config = FusionConfig {
        unsafe_threshold: raw.unsafe_threshold.unwrap_or(defaults.unsafe_threshold),
        caution_threshold: raw.caution_threshold.unwrap_or(defaults.caution_threshold),
        review_threshold: raw.review_threshold.unwrap_or(defaults.review_threshold),
        min_coverage: raw.min_coverage.unwrap_or(defaults.min_coverage),
        min_signals_for_unsafe: raw
            .min_signals_for_unsafe
            .unwrap_or(defaults.min_signals_for_unsafe),
    };

    for (name, value) in [
        ("unsafe_threshold", config.unsafe_threshold),
        ("caution_threshold", config.caution_threshold),
        ("review_threshold", config.review_threshold),
        ("min_coverage", config.min_coverage),
    ] {
        if !(0.0..=1.0).contains(&value) {
            return Err(ConfigError::Validation(format!(
                "{name} must be within [0, 1], got {value}"
            )));
        }
    }
    if config.caution_threshold > config.unsafe_threshold {
        return Err(ConfigError::Validation(format!(
            "caution_threshold ({}) must not exceed unsafe_threshold ({})",
            config.caution_threshold, config.unsafe_threshold
        )));
    }

    Ok(config)
}

fn build_validator_config(
    raw: raw::RawValidatorConfig,
    keywords: Option<KeywordSets>,
) -> ValidatorConfig {
    let defaults = ValidatorConfig::default();
    ValidatorConfig {
        min_consecutive: raw.min_consecutive.unwrap_or(defaults.min_consecutive),
        keywords: keywords.map(|k| k.normalized()).unwrap_or(defaults.keywords),
    }
}

/// Apply per-source overrides on top of the built-in table. Source
/// keys use the serialized spellings; anything else is rejected so a
/// typo cannot silently leave a source on its default profile.
fn build_reliability_table(
    overrides: &HashMap<String, SignalReliability>,
) -> Result<Vec<(SignalSource, SignalReliability)>, ConfigError> {
    let mut table = RELIABILITY_TABLE.to_vec();
    for (name, profile) in overrides {
        let source: SignalSource = serde_yaml::from_str(name).map_err(|_| {
            ConfigError::Validation(format!("unknown signal source \"{name}\" in reliability"))
        })?;

        for (field, value) in [
            ("base_reliability", profile.base_reliability),
            ("coverage_weight", profile.coverage_weight),
            ("false_positive_rate", profile.false_positive_rate),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Validation(format!(
                    "reliability.{name}.{field} must be within [0, 1], got {value}"
                )));
            }
        }

        match table.iter_mut().find(|(s, _)| *s == source) {
            Some(entry) => entry.1 = *profile,
            None => table.push((source, *profile)),
        }
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE_YAML: &str = r#"vigil: v1

fusion:
  unsafe_threshold: 0.70
  caution_threshold: 0.35
  review_threshold: 0.50
  min_coverage: 0.3
  min_signals_for_unsafe: 2

validator:
  min_consecutive: 2

reliability:
  ocr:
    base_reliability: 0.55
    coverage_weight: 0.3
    false_positive_rate: 0.3
    requires_confirmation: true

environment: "internal"
"#;

    fn make_source(yaml: &str) -> StringSource {
        StringSource {
            content: yaml.to_string(),
        }
    }

    // ---------------------------------------------------------------
    // 1. Valid config parses into typed struct
    // ---------------------------------------------------------------

    #[test]
    fn valid_config_parses_all_key_fields() {
        let config = load_config(&make_source(EXAMPLE_YAML)).unwrap();
        assert_eq!(config.version, "v1");
        assert_eq!(config.fusion.unsafe_threshold, 0.70);
        assert_eq!(config.fusion.min_signals_for_unsafe, 2);
        assert_eq!(config.validator.min_consecutive, 2);
        assert_eq!(config.environment, "internal");

        let ocr = config
            .reliability
            .iter()
            .find(|(s, _)| *s == SignalSource::Ocr)
            .map(|(_, r)| *r)
            .unwrap();
        assert_eq!(ocr.base_reliability, 0.55);
        assert!(ocr.requires_confirmation);
    }

    // ---------------------------------------------------------------
    // 2. Omitted sections use defaults
    // ---------------------------------------------------------------

    #[test]
    fn minimal_config_uses_defaults() {
        let config = load_config(&make_source("vigil: v1\n")).unwrap();
        assert_eq!(config.fusion, FusionConfig::default());
        assert_eq!(config.validator.min_consecutive, 2);
        assert_eq!(config.reliability, RELIABILITY_TABLE.to_vec());
        assert_eq!(config.environment, "");
    }

    // ---------------------------------------------------------------
    // 3. Version gating
    // ---------------------------------------------------------------

    #[test]
    fn unsupported_version_rejected() {
        let err = load_config(&make_source("vigil: v2\n")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("v2"), "error should mention the version: {msg}");
    }

    // ---------------------------------------------------------------
    // 4. Threshold validation
    // ---------------------------------------------------------------

    #[test]
    fn out_of_range_threshold_rejected() {
        let yaml = "vigil: v1\nfusion:\n  unsafe_threshold: 1.5\n";
        let err = load_config(&make_source(yaml)).unwrap_err();
        assert!(err.to_string().contains("unsafe_threshold"));
    }

    #[test]
    fn caution_above_unsafe_rejected() {
        let yaml = "vigil: v1\nfusion:\n  unsafe_threshold: 0.4\n  caution_threshold: 0.6\n";
        let err = load_config(&make_source(yaml)).unwrap_err();
        assert!(err.to_string().contains("caution_threshold"));
    }

    // ---------------------------------------------------------------
    // 5. Reliability overrides
    // ---------------------------------------------------------------

    #[test]
    fn unknown_reliability_source_rejected() {
        let yaml = r#"vigil: v1
reliability:
  thermal_camera:
    base_reliability: 0.5
    coverage_weight: 0.5
    false_positive_rate: 0.1
    requires_confirmation: false
"#;
        let err = load_config(&make_source(yaml)).unwrap_err();
        assert!(err.to_string().contains("thermal_camera"));
    }

    #[test]
    fn out_of_range_reliability_rejected() {
        let yaml = r#"vigil: v1
reliability:
  ocr:
    base_reliability: 1.3
    coverage_weight: 0.5
    false_positive_rate: 0.1
    requires_confirmation: false
"#;
        let err = load_config(&make_source(yaml)).unwrap_err();
        assert!(err.to_string().contains("base_reliability"));
    }

    #[test]
    fn override_replaces_only_named_source() {
        let config = load_config(&make_source(EXAMPLE_YAML)).unwrap();
        let weapons = config
            .reliability
            .iter()
            .find(|(s, _)| *s == SignalSource::YoloWeapons)
            .map(|(_, r)| *r)
            .unwrap();
        assert_eq!(weapons.base_reliability, 0.90);
    }

    // ---------------------------------------------------------------
    // 6. Keyword overrides
    // ---------------------------------------------------------------

    #[test]
    fn keyword_override_is_normalized_on_load() {
        let yaml = r#"vigil: v1
keywords:
  gym_equipment: ["Treadmill"]
  weapons: ["Knife"]
  scene_sports_gym: ["WORKOUT"]
  scene_entertainment: ["movie"]
  scene_educational: ["tutorial"]
  violence: ["fight"]
  non_violence: ["dance"]
"#;
        let config = load_config(&make_source(yaml)).unwrap();
        assert_eq!(config.validator.keywords.gym_equipment, vec!["treadmill"]);
        assert_eq!(config.validator.keywords.scene_sports_gym, vec!["workout"]);
    }

    // ---------------------------------------------------------------
    // 7. Contract hash
    // ---------------------------------------------------------------

    #[test]
    fn contract_hash_is_deterministic() {
        let a = load_config(&make_source(EXAMPLE_YAML)).unwrap();
        let b = load_config(&make_source(EXAMPLE_YAML)).unwrap();
        assert_eq!(a.contract_hash, b.contract_hash);
        assert!(a.contract_hash.starts_with("sha256:"));
        assert_eq!(a.contract_hash.len(), 7 + 64);
    }

    #[test]
    fn different_yaml_produces_different_hash() {
        let a = load_config(&make_source("vigil: v1\n")).unwrap();
        let b = load_config(&make_source("vigil: v1\nenvironment: prod\n")).unwrap();
        assert_ne!(a.contract_hash, b.contract_hash);
    }

    // ---------------------------------------------------------------
    // 8. Malformed YAML
    // ---------------------------------------------------------------

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = load_config(&make_source("vigil: [unclosed")).unwrap_err();
        assert!(matches!(err, ConfigError::YamlError(_)));
    }
}
