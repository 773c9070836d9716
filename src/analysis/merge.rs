//! Deterministic merge of per-chunk findings.
//!
//! Findings from sequential chunk submissions overlap heavily because
//! each prompt carries forward prior context. The accumulator folds each
//! chunk's findings into a single de-duplicated result, keyed on
//! normalized text so casing and whitespace variants collapse.
//!
//! Merge order is first-seen order within each category. Re-merging the
//! same findings is a no-op, and a later duplicate can only replace an
//! earlier entry when it strictly carries more information.

use std::collections::HashMap;

use super::types::{
    ChunkFindings, ClinicalEntity, EntityKind, SafetyFlag, SuggestedPhysicalTest,
};

/// Lowercase and collapse internal whitespace so textual variants of the
/// same finding share one identity key.
fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Accumulates findings across chunks into one de-duplicated analysis.
#[derive(Default)]
pub struct AnalysisAccumulator {
    safety_flags: Vec<SafetyFlag>,
    safety_index: HashMap<String, usize>,

    entities: Vec<ClinicalEntity>,
    entity_index: HashMap<(EntityKind, String), usize>,

    psychosocial_flags: Vec<String>,
    psychosocial_index: HashMap<String, usize>,

    suggested_tests: Vec<SuggestedPhysicalTest>,
    test_index: HashMap<String, usize>,

    reasoning: Vec<String>,
}

impl AnalysisAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one chunk's findings into the accumulated state.
    pub fn merge_chunk(&mut self, findings: &ChunkFindings) {
        for flag in &findings.safety_flags {
            self.merge_safety_flag(flag);
        }
        for entity in &findings.entities {
            self.merge_entity(entity);
        }
        for flag in &findings.psychosocial_flags {
            self.merge_psychosocial_flag(flag);
        }
        for test in &findings.suggested_tests {
            self.merge_suggested_test(test);
        }
        if let Some(reasoning) = &findings.reasoning {
            let trimmed = reasoning.trim();
            if !trimmed.is_empty() {
                self.reasoning.push(trimmed.to_string());
            }
        }
    }

    fn merge_safety_flag(&mut self, flag: &SafetyFlag) {
        let key = normalize(&flag.text);
        if key.is_empty() {
            tracing::warn!("Dropping safety flag with empty text");
            return;
        }
        match self.safety_index.get(&key) {
            Some(&i) => {
                // Duplicate text with a higher priority upgrades in place.
                if flag.priority > self.safety_flags[i].priority {
                    self.safety_flags[i].priority = flag.priority;
                }
            }
            None => {
                self.safety_index.insert(key, self.safety_flags.len());
                self.safety_flags.push(flag.clone());
            }
        }
    }

    fn merge_entity(&mut self, entity: &ClinicalEntity) {
        let name_key = normalize(&entity.name);
        if name_key.is_empty() {
            tracing::warn!(kind = entity.kind.as_str(), "Dropping entity with empty name");
            return;
        }
        let key = (entity.kind, name_key);
        match self.entity_index.get(&key) {
            Some(&i) => {
                // First occurrence wins unless the duplicate is strictly
                // richer in attributes.
                if entity.richness() > self.entities[i].richness() {
                    self.entities[i] = entity.clone();
                }
            }
            None => {
                self.entity_index.insert(key, self.entities.len());
                self.entities.push(entity.clone());
            }
        }
    }

    fn merge_psychosocial_flag(&mut self, flag: &str) {
        let key = normalize(flag);
        if key.is_empty() {
            tracing::warn!("Dropping psychosocial flag with empty text");
            return;
        }
        if !self.psychosocial_index.contains_key(&key) {
            self.psychosocial_index
                .insert(key, self.psychosocial_flags.len());
            self.psychosocial_flags.push(flag.trim().to_string());
        }
    }

    fn merge_suggested_test(&mut self, test: &SuggestedPhysicalTest) {
        let key = normalize(&test.name);
        if key.is_empty() {
            tracing::warn!("Dropping suggested test with empty name");
            return;
        }
        match self.test_index.get(&key) {
            Some(&i) => {
                if test.evidence_completeness() > self.suggested_tests[i].evidence_completeness() {
                    self.suggested_tests[i] = test.clone();
                }
            }
            None => {
                self.test_index.insert(key, self.suggested_tests.len());
                self.suggested_tests.push(test.clone());
            }
        }
    }

    /// Compact rendering of the findings so far, for embedding in the
    /// next chunk's prompt. `None` until something has accumulated.
    pub fn context_summary(&self) -> Option<String> {
        let mut sections = Vec::new();

        if !self.safety_flags.is_empty() {
            let items: Vec<&str> = self.safety_flags.iter().map(|f| f.text.as_str()).collect();
            sections.push(format!("Safety flags: {}", items.join("; ")));
        }
        if !self.entities.is_empty() {
            let items: Vec<String> = self
                .entities
                .iter()
                .map(|e| format!("{} ({})", e.name, e.kind.as_str()))
                .collect();
            sections.push(format!("Entities: {}", items.join("; ")));
        }
        if !self.psychosocial_flags.is_empty() {
            sections.push(format!(
                "Psychosocial: {}",
                self.psychosocial_flags.join("; ")
            ));
        }
        if !self.suggested_tests.is_empty() {
            let items: Vec<&str> = self
                .suggested_tests
                .iter()
                .map(|t| t.name.as_str())
                .collect();
            sections.push(format!("Suggested tests: {}", items.join("; ")));
        }

        if sections.is_empty() {
            None
        } else {
            Some(sections.join("\n"))
        }
    }

    /// Current accumulated state as a findings object.
    pub fn snapshot(&self) -> ChunkFindings {
        let reasoning = if self.reasoning.is_empty() {
            None
        } else {
            Some(self.reasoning.join("\n\n"))
        };
        ChunkFindings {
            safety_flags: self.safety_flags.clone(),
            entities: self.entities.clone(),
            psychosocial_flags: self.psychosocial_flags.clone(),
            suggested_tests: self.suggested_tests.clone(),
            reasoning,
        }
    }

    pub fn reasoning_segments(&self) -> &[String] {
        &self.reasoning
    }
}
