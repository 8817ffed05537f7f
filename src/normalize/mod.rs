// Copyright 2026 The Vigil Project
// SPDX-License-Identifier: Apache-2.0

// Text normalization applied before keyword scanning.
//
// OCR output and transcripts arrive with fullwidth characters,
// zero-width joiners, and mixed case. Normalization is a pure string
// transformation and is idempotent: normalizing already-normalized
// content returns the same result.

use unicode_normalization::UnicodeNormalization;

/// Normalize text for keyword scanning, in order:
///
/// 1. NFKC unicode normalization (fullwidth -> ASCII, combining chars)
/// 2. Zero-width / invisible character removal
/// 3. Lowercasing (all keyword lists are lowercase)
pub fn normalize(input: &str) -> String {
    let nfkc: String = input.nfkc().collect();
    let visible = remove_invisible_chars(&nfkc);
    visible.to_lowercase()
}

/// Remove zero-width and other invisible formatting characters that
/// survive NFKC and would otherwise split keyword matches.
fn remove_invisible_chars(input: &str) -> String {
    input
        .chars()
        .filter(|c| {
            !matches!(
                c,
                '\u{200B}' // zero width space
                    | '\u{200C}' // zero width non-joiner
                    | '\u{200D}' // zero width joiner
                    | '\u{2060}' // word joiner
                    | '\u{FEFF}' // BOM / zero width no-break space
                    | '\u{00AD}' // soft hyphen
            )
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fullwidth_characters_normalize_to_ascii() {
        assert_eq!(normalize("ＷＯＲＫＯＵＴ"), "workout");
    }

    #[test]
    fn zero_width_characters_removed() {
        assert_eq!(normalize("tread\u{200B}mill"), "treadmill");
        assert_eq!(normalize("gun\u{200D}"), "gun");
    }

    #[test]
    fn lowercases_mixed_case() {
        assert_eq!(normalize("Bench Press"), "bench press");
    }

    #[test]
    fn idempotent() {
        let once = normalize("Ｇｙｍ\u{FEFF} Training");
        assert_eq!(normalize(&once), once);
    }

    #[test]
    fn plain_ascii_passes_through() {
        assert_eq!(normalize("plain text"), "plain text");
    }
}
