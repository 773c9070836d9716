//! Findings data model and the external analysis client abstraction.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AnalysisError;

/// Markers whose presence makes a safety flag critical.
const CRITICAL_PRIORITY_MARKERS: &[&str] = &[
    "suicid", "self-harm", "harm myself", "kill myself", "hacerme daño", "quitarme la vida",
    "overdose", "sobredosis", "anaphyla", "anafila", "emergency", "emergencia", "urgencia",
];

/// Markers whose presence elevates a safety flag above routine.
const ELEVATED_PRIORITY_MARKERS: &[&str] = &[
    "allerg", "alergi", "contraindicat", "contraindicad", "chest pain", "dolor torácico",
    "dolor en el pecho",
];

/// Priority of a safety flag, derived from keyword severity.
///
/// Ordering matters: the merge engine keeps the higher-priority instance
/// when two chunks report the same flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagPriority {
    Routine,
    Elevated,
    Critical,
}

impl FlagPriority {
    /// Derive a priority from the flag text's severity keywords.
    pub fn derive(text: &str) -> Self {
        let lowered = text.to_lowercase();
        if CRITICAL_PRIORITY_MARKERS.iter().any(|m| lowered.contains(m)) {
            FlagPriority::Critical
        } else if ELEVATED_PRIORITY_MARKERS.iter().any(|m| lowered.contains(m)) {
            FlagPriority::Elevated
        } else {
            FlagPriority::Routine
        }
    }
}

/// A safety-relevant observation (risk flag) for the clinician.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyFlag {
    pub text: String,
    pub priority: FlagPriority,
}

impl SafetyFlag {
    /// Build a flag, deriving its priority from the text.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let priority = FlagPriority::derive(&text);
        Self { text, priority }
    }
}

/// Category of a clinical entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Symptom,
    Medication,
    HistoryItem,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Symptom => "symptom",
            EntityKind::Medication => "medication",
            EntityKind::HistoryItem => "history_item",
        }
    }
}

/// A typed clinical entity (symptom, medication, or history item) with
/// free-form attributes such as duration, dose, or laterality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalEntity {
    pub kind: EntityKind,
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ClinicalEntity {
    pub fn new(kind: EntityKind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Rough richness measure used when two chunks report the same entity:
    /// the duplicate carrying more free-text detail wins.
    pub(crate) fn richness(&self) -> usize {
        self.attributes.len()
            + self
                .attributes
                .iter()
                .map(|(k, v)| k.len() + v.len())
                .sum::<usize>()
    }
}

/// A physical test the analysis suggests, with reported evidence quality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedPhysicalTest {
    pub name: String,
    pub sensitivity: Option<f64>,
    pub specificity: Option<f64>,
    pub rationale: Option<String>,
}

impl SuggestedPhysicalTest {
    /// Evidence completeness: how many of sensitivity/specificity are
    /// reported. The merge engine prefers the more complete duplicate.
    pub(crate) fn evidence_completeness(&self) -> u8 {
        self.sensitivity.is_some() as u8 + self.specificity.is_some() as u8
    }
}

/// Structured findings returned by the external analysis service for one
/// chunk. Findings from different chunks are structurally independent; only
/// the merge engine compares them.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ChunkFindings {
    #[serde(default)]
    pub safety_flags: Vec<SafetyFlag>,
    #[serde(default)]
    pub entities: Vec<ClinicalEntity>,
    #[serde(default)]
    pub psychosocial_flags: Vec<String>,
    #[serde(default)]
    pub suggested_tests: Vec<SuggestedPhysicalTest>,
    /// Free-text clinical reasoning for this chunk.
    #[serde(default)]
    pub reasoning: Option<String>,
}

impl ChunkFindings {
    pub fn is_empty(&self) -> bool {
        self.safety_flags.is_empty()
            && self.entities.is_empty()
            && self.psychosocial_flags.is_empty()
            && self.suggested_tests.is_empty()
            && self.reasoning.is_none()
    }
}

/// The final, merged analysis of one transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptAnalysis {
    pub request_id: Uuid,
    pub safety_flags: Vec<SafetyFlag>,
    pub entities: Vec<ClinicalEntity>,
    pub psychosocial_flags: Vec<String>,
    pub suggested_tests: Vec<SuggestedPhysicalTest>,
    /// Per-chunk reasoning concatenated in chunk order.
    pub reasoning: String,
    pub chunk_count: usize,
    pub required_chunking: bool,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
}

/// Abstract external analysis call: a string prompt in, structured findings
/// out. The wire protocol behind it is the implementation's business; the
/// orchestrator only requires single-shot request/response semantics and
/// distinguishable failures.
pub trait AnalysisClient {
    fn submit(&self, prompt: &str) -> Result<ChunkFindings, AnalysisError>;
}
