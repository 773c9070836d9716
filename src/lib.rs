//! Clinical transcript segmentation and multi-pass analysis.
//!
//! Long clinical conversations exceed what one analysis call can take as
//! input, but they cannot be cut arbitrarily: a negation or a safety
//! disclosure separated from its context changes meaning. This crate
//! splits a transcript into bounded, semantically safe chunks, submits
//! them sequentially to an external analysis service with accumulated
//! context carried forward, and merges the per-chunk findings into one
//! de-duplicated result.
//!
//! ```no_run
//! use anamnesis::{AnalysisConfig, CancelFlag, HttpAnalysisClient, TranscriptAnalyzer};
//!
//! let config = AnalysisConfig::default();
//! let client = HttpAnalysisClient::new("http://localhost:8099", config.call_timeout_secs);
//! let analyzer = TranscriptAnalyzer::new(Box::new(client), config);
//!
//! let analysis = analyzer.analyze("Patient reports...", None, &CancelFlag::new())?;
//! println!("{} safety flags", analysis.safety_flags.len());
//! # Ok::<(), anamnesis::AnalysisError>(())
//! ```

pub mod analysis;
pub mod config;
pub mod segmentation;

pub use analysis::{
    AnalysisClient, AnalysisError, AnalysisPhase, CancelFlag, ChunkFindings, ClinicalEntity,
    EntityKind, FlagPriority, HttpAnalysisClient, ProgressEvent, SafetyFlag,
    SuggestedPhysicalTest, TranscriptAnalysis, TranscriptAnalyzer,
};
pub use config::AnalysisConfig;
pub use segmentation::{estimate_tokens, segment, Chunk, SegmentationResult};
