// Typed evidence bundle consumed by the violence validator.
//
// The surrounding pipeline hands the validator whatever detector
// output it has accumulated for a piece of content. Every field
// defaults to empty: an absent signal family degrades the affected
// strategies to "insufficient data" characterizations, it never
// fails the call.

use serde::{Deserialize, Serialize};

/// A per-segment score from a temporal model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentScore {
    /// Segment start offset in seconds.
    #[serde(default)]
    pub start_time: f64,
    /// Violence-likeness of the segment, in [0, 1].
    #[serde(alias = "violence_score")]
    pub score: f64,
}

/// One OCR extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrItem {
    pub text: String,
}

/// One transcript-moderation span with its per-span violence score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModerationSpan {
    pub text: String,
    #[serde(default)]
    pub violence_score: f64,
}

/// One detected object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    pub label: String,
    #[serde(default)]
    pub category: Option<String>,
}

/// Everything the pipeline knows about a piece of content at
/// validation time. All fields optional; absent means empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceBundle {
    /// Per-segment scores from the primary violence classifier.
    #[serde(default)]
    pub violence_segments: Vec<SegmentScore>,
    /// Per-segment scores from the secondary temporal model.
    #[serde(default)]
    pub secondary_segments: Vec<SegmentScore>,
    /// OCR extractions from visible text.
    #[serde(default)]
    pub ocr_items: Vec<OcrItem>,
    /// Full transcript text. Empty when no audio track or no speech.
    #[serde(default)]
    pub transcript: String,
    /// Transcript-moderation spans with per-span violence scores.
    #[serde(default)]
    pub transcript_moderation: Vec<ModerationSpan>,
    /// Objects detected anywhere in the content.
    #[serde(default)]
    pub objects: Vec<DetectedObject>,
}

impl EvidenceBundle {
    /// All temporal segments from every source, sorted by start time.
    ///
    /// Both the temporal-consistency and motion-pattern strategies
    /// read this merged view; neither re-filters by source.
    pub fn merged_segments(&self) -> Vec<SegmentScore> {
        let mut merged: Vec<SegmentScore> = self
            .violence_segments
            .iter()
            .chain(self.secondary_segments.iter())
            .cloned()
            .collect();
        merged.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));
        merged
    }
}
