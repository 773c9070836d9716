//! Progress reporting for multi-chunk analysis runs.

use serde::{Deserialize, Serialize};

/// Where the analysis currently is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum AnalysisPhase {
    Idle,
    Segmenting,
    /// Chunk submitted, waiting on the analysis service.
    AwaitingChunk { index: usize },
    /// Chunk response received and folded into the running result.
    Merging { index: usize },
    Done,
    Failed,
}

/// Snapshot emitted to the progress callback after each state change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub phase: AnalysisPhase,
    /// Overall completion, 0 to 100.
    pub percent: u8,
    /// Human-readable label for the current stage of work.
    pub label: String,
    pub chunks_completed: usize,
    pub chunk_count: usize,
}

/// Stage label for a completion percentage. Bands are coarse on purpose:
/// callers show these directly to people waiting on a long transcript.
pub fn phase_label(percent: u8) -> &'static str {
    match percent {
        0..=24 => "Reading the conversation",
        25..=49 => "Identifying symptoms and history",
        50..=74 => "Reviewing medications and risk factors",
        75..=99 => "Cross-checking findings",
        _ => "Finalizing analysis",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_cover_all_bands() {
        assert_eq!(phase_label(0), "Reading the conversation");
        assert_eq!(phase_label(24), "Reading the conversation");
        assert_eq!(phase_label(25), "Identifying symptoms and history");
        assert_eq!(phase_label(49), "Identifying symptoms and history");
        assert_eq!(phase_label(50), "Reviewing medications and risk factors");
        assert_eq!(phase_label(74), "Reviewing medications and risk factors");
        assert_eq!(phase_label(75), "Cross-checking findings");
        assert_eq!(phase_label(99), "Cross-checking findings");
        assert_eq!(phase_label(100), "Finalizing analysis");
    }

    #[test]
    fn phase_serializes_with_tag() {
        let json = serde_json::to_value(AnalysisPhase::Merging { index: 3 }).unwrap();
        assert_eq!(json["phase"], "merging");
        assert_eq!(json["index"], 3);
    }
}
