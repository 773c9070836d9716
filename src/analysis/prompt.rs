//! Prompt construction for chunk analysis calls.

use crate::segmentation::Chunk;

/// System prompt: extraction only, no diagnosis, no advice.
pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"
You are a clinical conversation analysis assistant. Your ONLY role is to
extract structured findings from a transcript segment of a clinician-patient
conversation.

RULES (ABSOLUTE, NO EXCEPTIONS):
1. Extract ONLY information explicitly stated in the transcript segment.
2. NEVER add diagnosis, treatment advice, or clinical opinion.
3. Preserve negations exactly: a denied symptom is NOT a finding.
4. Report safety-relevant statements (self-harm ideation, allergies,
   emergencies, contraindications) verbatim as safety flags.
5. Do NOT restate findings already listed under PREVIOUS FINDINGS; only add
   new information or corrections.
6. If a field is unknown, output null for that field.
7. Output a single JSON object wrapped in ```json``` fences and nothing else.
"#;

/// Build the prompt for one chunk.
///
/// Embeds the running findings summary (so later chunks neither restate nor
/// contradict earlier ones), the injected leading/trailing context, and the
/// expected response schema.
pub fn build_chunk_prompt(
    chunk: &Chunk,
    prior_summary: Option<&str>,
    index: usize,
    total: usize,
) -> String {
    let mut prompt = String::new();

    prompt.push_str(&format!(
        "Transcript segment {} of {}.\n\n",
        index + 1,
        total
    ));

    if let Some(summary) = prior_summary {
        prompt.push_str(&format!(
            "<previous_findings>\n{summary}\n</previous_findings>\n\n"
        ));
    }

    if let Some(leading) = &chunk.leading_context {
        prompt.push_str(&format!(
            "<previous_context>\n{leading}\n</previous_context>\n\n"
        ));
    }

    prompt.push_str(&format!(
        "<transcript_segment>\n{}\n</transcript_segment>\n\n",
        chunk.text
    ));

    if let Some(trailing) = &chunk.trailing_context {
        prompt.push_str(&format!(
            "<upcoming_context>\n{trailing}\n</upcoming_context>\n\n"
        ));
    }

    prompt.push_str(RESPONSE_SCHEMA);
    prompt
}

/// Expected response shape, shown to the service in every call.
const RESPONSE_SCHEMA: &str = r#"Extract ALL findings from the transcript segment into this JSON structure.
Context blocks are for continuity only; extract findings from the segment itself.

```json
{
  "safety_flags": ["verbatim safety-relevant statement"],
  "entities": [
    {
      "kind": "symptom | medication | history_item",
      "name": "entity name",
      "attributes": {"duration": "3 days", "dose": "400mg"}
    }
  ],
  "psychosocial_flags": ["work stress mentioned repeatedly"],
  "suggested_tests": [
    {"name": "test name", "sensitivity": 0.91, "specificity": 0.26, "rationale": "why"}
  ],
  "reasoning": "brief free-text reasoning for this segment"
}
```"#;
