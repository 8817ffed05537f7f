// Copyright 2026 The Vigil Project
// SPDX-License-Identifier: Apache-2.0

// Fixed keyword lists backing the validator's context strategies.
//
// The defaults ship as YAML embedded at compile time and are parsed
// once at startup. Matching is case-insensitive substring matching
// over normalized text (see `normalize`); entries are stored
// lowercase.

use serde::Deserialize;

use crate::normalize::normalize;

/// The default keyword lists YAML, embedded at compile time.
const DEFAULT_KEYWORDS_YAML: &str = include_str!("../schema/default_keywords.yaml");

/// Keyword lists consumed by the scene, audio-visual, and object
/// strategies. Config may replace the whole set; entries are
/// normalized on load so matching stays consistent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeywordSets {
    pub gym_equipment: Vec<String>,
    pub weapons: Vec<String>,
    pub scene_sports_gym: Vec<String>,
    pub scene_entertainment: Vec<String>,
    pub scene_educational: Vec<String>,
    pub violence: Vec<String>,
    pub non_violence: Vec<String>,
}

impl KeywordSets {
    /// Parse and normalize the embedded default lists.
    /// Called once at startup. Panics on invalid YAML (our own data).
    pub fn builtin() -> Self {
        let raw: KeywordSets = serde_yaml::from_str(DEFAULT_KEYWORDS_YAML)
            .expect("default keywords YAML is invalid");
        raw.normalized()
    }

    /// Return a copy with every entry normalized.
    pub fn normalized(&self) -> Self {
        let norm = |list: &[String]| list.iter().map(|k| normalize(k)).collect();
        Self {
            gym_equipment: norm(&self.gym_equipment),
            weapons: norm(&self.weapons),
            scene_sports_gym: norm(&self.scene_sports_gym),
            scene_entertainment: norm(&self.scene_entertainment),
            scene_educational: norm(&self.scene_educational),
            violence: norm(&self.violence),
            non_violence: norm(&self.non_violence),
        }
    }
}

impl Default for KeywordSets {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Count how many keywords from `list` occur in `text`.
///
/// `text` must already be normalized. Each keyword counts at most
/// once regardless of how often it occurs.
pub fn count_hits(text: &str, list: &[String]) -> usize {
    list.iter().filter(|kw| text.contains(kw.as_str())).count()
}

/// Keywords from `list` that occur in `label` (normalized internally).
pub fn matched_keywords<'a>(label: &str, list: &'a [String]) -> Vec<&'a str> {
    let normalized = normalize(label);
    list.iter()
        .filter(|kw| normalized.contains(kw.as_str()))
        .map(|kw| kw.as_str())
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_parses_and_is_nonempty() {
        let kw = KeywordSets::builtin();
        assert!(!kw.gym_equipment.is_empty());
        assert!(!kw.weapons.is_empty());
        assert!(!kw.scene_sports_gym.is_empty());
        assert!(!kw.scene_entertainment.is_empty());
        assert!(!kw.scene_educational.is_empty());
        assert!(!kw.violence.is_empty());
        assert!(!kw.non_violence.is_empty());
    }

    #[test]
    fn builtin_entries_already_normalized() {
        let kw = KeywordSets::builtin();
        for entry in kw.weapons.iter().chain(kw.scene_sports_gym.iter()) {
            assert_eq!(entry, &normalize(entry), "list entries must be lowercase");
        }
    }

    #[test]
    fn count_hits_counts_each_keyword_once() {
        let kw = KeywordSets::builtin();
        let text = normalize("workout workout WORKOUT and some cardio");
        assert_eq!(count_hits(&text, &kw.scene_sports_gym), 2); // workout, cardio
    }

    #[test]
    fn matched_keywords_is_case_insensitive_substring() {
        let kw = KeywordSets::builtin();
        let matches = matched_keywords("Olympic Barbell 20kg", &kw.gym_equipment);
        assert_eq!(matches, vec!["barbell"]);
        let matches = matched_keywords("Handgun (holstered)", &kw.weapons);
        assert!(matches.contains(&"gun"));
        assert!(matches.contains(&"handgun"));
    }

    #[test]
    fn no_hits_in_unrelated_text() {
        let kw = KeywordSets::builtin();
        assert_eq!(count_hits("a quiet walk in the park", &kw.violence), 0);
    }
}
