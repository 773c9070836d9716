//! Parsing of analysis service responses into [`ChunkFindings`].
//!
//! The service answers with a JSON object, usually wrapped in ```json```
//! fences. Parsing is lenient per entry: a malformed finding is skipped
//! with a warning rather than failing the whole chunk, but a response with
//! no parsable JSON object at all is a hard error.

use serde::Deserialize;

use super::types::{ChunkFindings, ClinicalEntity, EntityKind, SafetyFlag, SuggestedPhysicalTest};
use super::AnalysisError;

/// Parse a raw service response into findings.
pub fn parse_findings_response(response: &str) -> Result<ChunkFindings, AnalysisError> {
    let json_str = extract_json_block(response)?;

    #[derive(Deserialize)]
    struct RawFindings {
        #[serde(default)]
        safety_flags: Vec<serde_json::Value>,
        #[serde(default)]
        entities: Vec<serde_json::Value>,
        #[serde(default)]
        psychosocial_flags: Vec<serde_json::Value>,
        #[serde(default)]
        suggested_tests: Vec<serde_json::Value>,
        #[serde(default)]
        reasoning: Option<String>,
    }

    let raw: RawFindings =
        serde_json::from_str(&json_str).map_err(|e| AnalysisError::JsonParsing(e.to_string()))?;

    Ok(ChunkFindings {
        safety_flags: raw
            .safety_flags
            .iter()
            .filter_map(parse_safety_flag)
            .collect(),
        entities: raw.entities.iter().filter_map(parse_entity).collect(),
        psychosocial_flags: raw
            .psychosocial_flags
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        suggested_tests: raw
            .suggested_tests
            .iter()
            .filter_map(parse_suggested_test)
            .collect(),
        reasoning: raw.reasoning.filter(|r| !r.trim().is_empty()),
    })
}

/// Locate the JSON object: prefer a ```json fenced block, fall back to the
/// response body itself if it looks like bare JSON.
fn extract_json_block(response: &str) -> Result<String, AnalysisError> {
    if let Some(fence_start) = response.find("```json") {
        let content_start = fence_start + 7;
        let fence_end = response[content_start..]
            .find("```")
            .ok_or_else(|| AnalysisError::MalformedResponse("unclosed JSON fence".into()))?;
        return Ok(response[content_start..content_start + fence_end]
            .trim()
            .to_string());
    }

    let trimmed = response.trim();
    if trimmed.starts_with('{') {
        return Ok(trimmed.to_string());
    }

    Err(AnalysisError::MalformedResponse(
        "no JSON object found in response".into(),
    ))
}

/// Safety flags arrive as plain strings; priority is derived, not reported.
fn parse_safety_flag(value: &serde_json::Value) -> Option<SafetyFlag> {
    match value.as_str() {
        Some(text) if !text.trim().is_empty() => Some(SafetyFlag::new(text.trim())),
        _ => {
            tracing::warn!(?value, "skipping malformed safety flag");
            None
        }
    }
}

fn parse_entity(value: &serde_json::Value) -> Option<ClinicalEntity> {
    let name = value.get("name")?.as_str()?.trim();
    if name.is_empty() {
        tracing::warn!(?value, "skipping entity with empty name");
        return None;
    }
    let kind = value
        .get("kind")
        .and_then(|k| k.as_str())
        .and_then(parse_entity_kind);
    let Some(kind) = kind else {
        tracing::warn!(?value, "skipping entity with unknown kind");
        return None;
    };

    let mut entity = ClinicalEntity::new(kind, name);
    if let Some(attrs) = value.get("attributes").and_then(|a| a.as_object()) {
        for (key, val) in attrs {
            if let Some(text) = val.as_str() {
                entity.attributes.insert(key.clone(), text.to_string());
            }
        }
    }
    Some(entity)
}

/// Kind aliases the service has been seen to emit (English and Spanish).
fn parse_entity_kind(kind: &str) -> Option<EntityKind> {
    match kind.trim().to_lowercase().as_str() {
        "symptom" | "síntoma" | "sintoma" => Some(EntityKind::Symptom),
        "medication" | "med" | "medicación" | "medicacion" | "medicamento" => {
            Some(EntityKind::Medication)
        }
        "history_item" | "history" | "antecedente" => Some(EntityKind::HistoryItem),
        _ => None,
    }
}

fn parse_suggested_test(value: &serde_json::Value) -> Option<SuggestedPhysicalTest> {
    let name = value.get("name")?.as_str()?.trim();
    if name.is_empty() {
        tracing::warn!(?value, "skipping suggested test with empty name");
        return None;
    }
    Some(SuggestedPhysicalTest {
        name: name.to_string(),
        sensitivity: value.get("sensitivity").and_then(|v| v.as_f64()),
        specificity: value.get("specificity").and_then(|v| v.as_f64()),
        rationale: value
            .get("rationale")
            .and_then(|v| v.as_str())
            .map(str::to_string),
    })
}
