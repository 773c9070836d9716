//! Analysis configuration.
//!
//! Everything the engine can be tuned with lives here as an explicit,
//! passed-in value: token budgets, the overlap reserve, pacing, and the
//! keyword lists the detectors match against. There is no module-level
//! mutable state anywhere in the crate.

use std::time::Duration;

use serde::Serialize;

use crate::segmentation::critical::DEFAULT_CRITICAL_MARKERS;
use crate::segmentation::sections::DEFAULT_SECTION_MARKERS;

/// Default hard token budget per chunk.
pub const DEFAULT_MAX_TOKENS_PER_CHUNK: usize = 2500;

/// Default overlap reserve, left free in every non-final chunk so injected
/// trailing context cannot push it past the hard budget.
pub const DEFAULT_OVERLAP_TOKENS: usize = 300;

/// Default size of the next-chunk slice scanned (and possibly attached) as
/// trailing preview context.
pub const DEFAULT_PREVIEW_TOKENS: usize = 150;

/// Default pause between successive external calls (rate limiting).
pub const DEFAULT_INTER_CALL_PAUSE_MS: u64 = 500;

/// Default per-call HTTP timeout in seconds. Enforced per external call,
/// never across the whole multi-chunk operation.
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 120;

/// Configuration for one transcript analysis.
///
/// Token values are heuristic-estimate units (see
/// [`crate::segmentation::tokens`]), not exact model tokens. Downstream
/// code tolerates roughly 20% estimation error.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisConfig {
    /// Hard token budget for a single chunk's primary span.
    pub max_tokens_per_chunk: usize,
    /// Tokens reserved in non-final chunks for injected trailing context.
    pub overlap_tokens: usize,
    /// Leading slice of the next chunk scanned for critical content.
    pub preview_tokens: usize,
    /// Pause between successive external analysis calls.
    #[serde(skip)]
    pub inter_call_pause: Duration,
    /// Per-call timeout for the external analysis service.
    pub call_timeout_secs: u64,
    /// Critical-context markers (negation + safety terms), case-insensitive.
    /// Locale-pluralizable: extend rather than replace for new languages.
    pub critical_markers: Vec<String>,
    /// Clinical section marker phrases, case-insensitive.
    pub section_markers: Vec<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_tokens_per_chunk: DEFAULT_MAX_TOKENS_PER_CHUNK,
            overlap_tokens: DEFAULT_OVERLAP_TOKENS,
            preview_tokens: DEFAULT_PREVIEW_TOKENS,
            inter_call_pause: Duration::from_millis(DEFAULT_INTER_CALL_PAUSE_MS),
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
            critical_markers: DEFAULT_CRITICAL_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            section_markers: DEFAULT_SECTION_MARKERS
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

impl AnalysisConfig {
    /// Effective sentence-level budget: the hard budget minus the overlap
    /// reserve, floored at one token so degenerate configs stay total.
    pub fn sub_chunk_budget(&self) -> usize {
        self.max_tokens_per_chunk
            .saturating_sub(self.overlap_tokens)
            .max(1)
    }
}
