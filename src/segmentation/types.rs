//! Segmentation data model.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::tokens::estimate_tokens;

/// A bounded, ordered slice of the transcript prepared for one external
/// analysis call.
///
/// `start_offset..end_offset` is the chunk's primary span: a character range
/// in the original transcript, never overlapping another chunk's span.
/// Injected context is carried separately and does not count toward the
/// primary span or its token estimate. Chunks are immutable once the
/// injector has run; the orchestrator consumes them strictly in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// The primary span's text, byte-identical to the transcript slice.
    pub text: String,
    /// Heuristic token estimate of the primary span only.
    pub token_estimate: usize,
    /// Start of the primary span in the original transcript.
    pub start_offset: usize,
    /// End (exclusive) of the primary span in the original transcript.
    pub end_offset: usize,
    /// Whether any context was injected into this chunk.
    pub has_injected_context: bool,
    /// Trailing slice of the previous chunk, prepended for continuity.
    pub leading_context: Option<String>,
    /// Critical leading slice of the next chunk, appended as preview.
    pub trailing_context: Option<String>,
}

impl Chunk {
    /// Build a chunk from a primary span of `transcript`.
    pub(crate) fn from_span(transcript: &str, span: Range<usize>) -> Self {
        let text = transcript[span.clone()].to_string();
        let token_estimate = estimate_tokens(&text);
        Self {
            text,
            token_estimate,
            start_offset: span.start,
            end_offset: span.end,
            has_injected_context: false,
            leading_context: None,
            trailing_context: None,
        }
    }
}

/// Output of segmenting one transcript.
///
/// Invariant: concatenating all chunks' primary spans in order reconstructs
/// the original transcript exactly: no characters dropped, no reordering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentationResult {
    pub chunks: Vec<Chunk>,
    /// Token estimate of the whole transcript.
    pub total_token_estimate: usize,
    /// True when the transcript exceeded the per-chunk budget.
    pub requires_chunking: bool,
}
