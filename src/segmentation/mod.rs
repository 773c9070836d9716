//! Transcript segmentation: token budgeting, critical-context detection,
//! section and sentence boundaries, chunk construction, and context
//! injection.
//!
//! Everything in this module is pure and total; there is no error type
//! here because no input string can fail to segment.

pub mod context;
pub mod critical;
pub mod sections;
pub mod segmenter;
pub mod sentences;
pub mod tokens;
pub mod types;

pub use context::inject_context;
pub use critical::{CriticalDetector, KeywordCriticalDetector};
pub use segmenter::segment;
pub use tokens::estimate_tokens;
pub use types::{Chunk, SegmentationResult};
