//! Critical-context detection.
//!
//! Recognizes sentence fragments that must never be separated from their
//! surrounding context: negations ("does not have", "no tiene") and
//! safety-critical markers (suicidality, allergy, emergency,
//! contraindication terms). Pure keyword matching over a fixed,
//! case-insensitive list, with no external calls.
//!
//! The detector sits behind a trait so the segmenter's structural logic
//! never changes if the keyword heuristic is later replaced by a
//! classifier.

use regex::RegexSet;

/// Default critical-context markers, English and Spanish pairs.
///
/// These are matched as literal substrings (case-insensitive). The list is
/// a heuristic, not a guarantee; extend it per locale via
/// [`crate::config::AnalysisConfig::critical_markers`].
pub const DEFAULT_CRITICAL_MARKERS: &[&str] = &[
    // Negation markers. The qualifier usually precedes the finding it negates.
    "does not have",
    "denies",
    "no pain",
    "never had",
    "no history of",
    "no tiene",
    "niega",
    "sin dolor",
    "no presenta",
    "nunca ha tenido",
    // Safety markers.
    "suicid",
    "self-harm",
    "harm myself",
    "kill myself",
    "hacerme daño",
    "quitarme la vida",
    "overdose",
    "sobredosis",
    "allerg",
    "alergi",
    "anaphyla",
    "anafila",
    "emergency",
    "emergencia",
    "urgencia",
    "contraindicat",
    "contraindicad",
];

/// Predicate deciding whether a piece of text contains critical context.
pub trait CriticalDetector {
    fn contains_critical(&self, text: &str) -> bool;
}

/// Keyword-based [`CriticalDetector`]: one case-insensitive `RegexSet` over
/// literal markers, compiled once at construction.
pub struct KeywordCriticalDetector {
    set: RegexSet,
}

impl KeywordCriticalDetector {
    /// Build a detector from marker phrases, matched case-insensitively as
    /// literal substrings.
    pub fn with_markers<S: AsRef<str>>(markers: &[S]) -> Self {
        let patterns: Vec<String> = markers
            .iter()
            .map(|m| format!("(?i){}", regex::escape(m.as_ref())))
            .collect();
        let set = RegexSet::new(&patterns).expect("escaped literal markers always compile");
        Self { set }
    }
}

impl Default for KeywordCriticalDetector {
    fn default() -> Self {
        Self::with_markers(DEFAULT_CRITICAL_MARKERS)
    }
}

impl CriticalDetector for KeywordCriticalDetector {
    fn contains_critical(&self, text: &str) -> bool {
        self.set.is_match(text)
    }
}
