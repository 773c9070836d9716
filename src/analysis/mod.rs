//! Chunk analysis: prompt construction, the external analysis client,
//! response parsing, the merge/deduplication engine, and the sequential
//! orchestrator.

pub mod merge;
pub mod orchestrator;
pub mod parser;
pub mod progress;
pub mod prompt;
pub mod service;
pub mod types;

pub use merge::AnalysisAccumulator;
pub use orchestrator::{CancelFlag, TranscriptAnalyzer};
pub use progress::{AnalysisPhase, ProgressEvent};
pub use service::{HttpAnalysisClient, MockAnalysisClient};
pub use types::{
    AnalysisClient, ChunkFindings, ClinicalEntity, EntityKind, FlagPriority, SafetyFlag,
    SuggestedPhysicalTest, TranscriptAnalysis,
};

use thiserror::Error;

/// Errors from the analysis pipeline.
///
/// Segmentation and estimation are total and have no variants here. Every
/// external-call failure aborts the whole multi-chunk request: the caller
/// gets exactly one terminal error and no partial analysis.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("analysis service unreachable at {0}")]
    Connection(String),

    #[error("analysis service returned error (status {status}): {body}")]
    Service { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    Http(String),

    #[error("malformed analysis response: {0}")]
    MalformedResponse(String),

    #[error("JSON parsing error: {0}")]
    JsonParsing(String),

    #[error("analysis cancelled before chunk {chunk} of {total}")]
    Cancelled { chunk: usize, total: usize },
}
