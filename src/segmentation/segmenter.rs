//! Transcript segmentation.
//!
//! Greedy whole-section accumulation under the hard token budget; any
//! section that alone exceeds the budget is re-split at sentence
//! granularity under the reduced sub-chunk budget (hard budget minus the
//! overlap reserve, so injected trailing context can never overflow a
//! non-final chunk). A sentence flagged as critical context is never
//! separated from its immediately preceding sentence.
//!
//! Pure and total over any input string: segmentation has no failure mode.

use std::ops::Range;

use super::critical::CriticalDetector;
use super::sections::detect_sections;
use super::sentences::split_sentences;
use super::tokens::estimate_tokens;
use super::types::{Chunk, SegmentationResult};
use crate::config::AnalysisConfig;

/// Segment `transcript` into bounded chunks.
///
/// Short path: a transcript within `max_tokens_per_chunk` yields exactly
/// one chunk (`requires_chunking = false`); the empty string yields zero
/// chunks. Long path: section-greedy accumulation with sentence-level
/// re-splitting of oversize sections. Concatenating the returned chunks'
/// primary spans always reproduces `transcript` exactly.
pub fn segment(
    transcript: &str,
    config: &AnalysisConfig,
    detector: &dyn CriticalDetector,
) -> SegmentationResult {
    if transcript.is_empty() {
        return SegmentationResult {
            chunks: Vec::new(),
            total_token_estimate: 0,
            requires_chunking: false,
        };
    }

    let total_token_estimate = estimate_tokens(transcript);
    if total_token_estimate <= config.max_tokens_per_chunk {
        return SegmentationResult {
            chunks: vec![Chunk::from_span(transcript, 0..transcript.len())],
            total_token_estimate,
            requires_chunking: false,
        };
    }

    let sections = detect_sections(transcript, &config.section_markers);
    let mut spans: Vec<Range<usize>> = Vec::new();
    let mut current: Option<Range<usize>> = None;

    for section in sections {
        let section_tokens = estimate_tokens(&transcript[section.clone()]);

        if section_tokens > config.max_tokens_per_chunk {
            if let Some(open) = current.take() {
                spans.push(open);
            }
            split_oversize_section(transcript, section, config, detector, &mut spans);
            continue;
        }

        match current {
            None => current = Some(section),
            Some(ref mut open) => {
                let merged = estimate_tokens(&transcript[open.start..section.end]);
                if merged <= config.max_tokens_per_chunk {
                    open.end = section.end;
                } else {
                    spans.push(open.clone());
                    current = Some(section);
                }
            }
        }
    }

    if let Some(open) = current {
        spans.push(open);
    }

    tracing::debug!(
        chunks = spans.len(),
        total_tokens = total_token_estimate,
        "transcript segmented"
    );

    SegmentationResult {
        chunks: spans
            .into_iter()
            .map(|span| Chunk::from_span(transcript, span))
            .collect(),
        total_token_estimate,
        requires_chunking: true,
    }
}

/// Re-split one oversize section at sentence granularity.
///
/// Sub-chunks target `max_tokens_per_chunk - overlap_tokens`. When the
/// sentence that would open a new sub-chunk is critical, the immediately
/// preceding sentence moves with it, since natural clinical speech puts the
/// negation or qualifier just before the statement it governs. If moving
/// the preceding sentence would empty the current sub-chunk, the critical
/// sentence is kept in the current sub-chunk past the budget instead:
/// safety beats budget, and the overlap reserve absorbs the overrun.
fn split_oversize_section(
    transcript: &str,
    section: Range<usize>,
    config: &AnalysisConfig,
    detector: &dyn CriticalDetector,
    spans: &mut Vec<Range<usize>>,
) {
    let budget = config.sub_chunk_budget();
    let section_text = &transcript[section.clone()];

    // Buffer state: open span, sentences in it, and the last sentence added.
    let mut open: Option<Range<usize>> = None;
    let mut sentence_count = 0usize;
    let mut last_sentence: Range<usize> = 0..0;

    for local in split_sentences(section_text) {
        let sentence = section.start + local.start..section.start + local.end;

        let Some(ref mut buffer) = open else {
            open = Some(sentence.clone());
            sentence_count = 1;
            last_sentence = sentence;
            continue;
        };

        let grown = estimate_tokens(&transcript[buffer.start..sentence.end]);
        if grown <= budget {
            buffer.end = sentence.end;
            sentence_count += 1;
            last_sentence = sentence;
            continue;
        }

        if detector.contains_critical(&transcript[sentence.clone()]) {
            if sentence_count >= 2 {
                // Close the buffer early and let the preceding sentence
                // travel with the critical one.
                spans.push(buffer.start..last_sentence.start);
                open = Some(last_sentence.start..sentence.end);
                sentence_count = 2;
                last_sentence = sentence;
            } else {
                buffer.end = sentence.end;
                sentence_count += 1;
                last_sentence = sentence;
            }
            continue;
        }

        spans.push(buffer.clone());
        open = Some(sentence.clone());
        sentence_count = 1;
        last_sentence = sentence;
    }

    if let Some(buffer) = open {
        spans.push(buffer);
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::*;
    use crate::segmentation::critical::KeywordCriticalDetector;

    fn small_config(max: usize, overlap: usize) -> AnalysisConfig {
        AnalysisConfig {
            max_tokens_per_chunk: max,
            overlap_tokens: overlap,
            ..AnalysisConfig::default()
        }
    }

    fn run(transcript: &str, config: &AnalysisConfig) -> SegmentationResult {
        segment(transcript, config, &KeywordCriticalDetector::default())
    }

    fn reconstruct(result: &SegmentationResult) -> String {
        result.chunks.iter().map(|c| c.text.as_str()).collect()
    }

    #[test]
    fn short_transcript_is_one_chunk() {
        let input = "Patient reports lower back pain for 3 days.";
        let result = run(input, &AnalysisConfig::default());

        assert!(!result.requires_chunking);
        assert_eq!(result.chunks.len(), 1);
        assert_eq!(result.chunks[0].text, input);
        assert_eq!(result.chunks[0].start_offset, 0);
        assert_eq!(result.chunks[0].end_offset, input.len());
    }

    #[test]
    fn transcript_at_exact_budget_is_one_chunk() {
        // 10 words → ceil(10 * 1.3) = 13 tokens.
        let input = "one two three four five six seven eight nine ten";
        let result = run(input, &small_config(13, 3));

        assert!(!result.requires_chunking);
        assert_eq!(result.chunks.len(), 1);
    }

    #[test]
    fn empty_transcript_yields_zero_chunks() {
        let result = run("", &AnalysisConfig::default());
        assert!(result.chunks.is_empty());
        assert!(!result.requires_chunking);
        assert_eq!(result.total_token_estimate, 0);
    }

    #[test]
    fn over_budget_transcript_yields_multiple_chunks() {
        let sentence = "The patient talked about daily walks in the park today. ";
        let input = sentence.repeat(40);
        let result = run(&input, &small_config(100, 20));

        assert!(result.requires_chunking);
        assert!(result.chunks.len() > 1);
    }

    #[test]
    fn primary_spans_reconstruct_transcript_exactly() {
        let mut input = String::from("Chief complaint: knee pain after a fall last Tuesday.\n");
        for _ in 0..30 {
            input.push_str("The pain gets worse when climbing stairs at home. ");
        }
        input.push_str("\nMedication: ibuprofen 400mg twice daily.\n");
        input.push_str("Plan: physiotherapy referral and follow-up in two weeks.");

        let result = run(&input, &small_config(80, 15));

        assert!(result.requires_chunking);
        assert_eq!(reconstruct(&result), input);
        for pair in result.chunks.windows(2) {
            assert_eq!(pair[0].end_offset, pair[1].start_offset);
        }
    }

    #[test]
    fn sections_are_preferred_chunk_boundaries() {
        let history = "History: hypertension diagnosed in 2019, managed with diet. ".repeat(3);
        let meds = "Medication: lisinopril ten milligrams once in the morning. ".repeat(3);
        let input = format!("{history}\n{meds}");

        // Each section ~30 words (≈39 tokens); both together exceed 50.
        let result = run(&input, &small_config(50, 10));

        assert!(result.requires_chunking);
        assert_eq!(result.chunks.len(), 2);
        assert!(result.chunks[1].text.trim_start().starts_with("Medication"));
    }

    #[test]
    fn oversize_section_splits_at_sentence_granularity() {
        let sentence = "The patient talked about daily walks in the park today. ";
        let input = sentence.repeat(30); // one section, 300 words ≈ 390 tokens
        let result = run(&input, &small_config(100, 20));

        assert!(result.chunks.len() > 1);
        assert_eq!(reconstruct(&result), input);
        // Plain filler never triggers the critical overrun, so every chunk
        // respects the sub-chunk budget.
        for chunk in &result.chunks {
            assert!(
                chunk.token_estimate <= 80,
                "chunk estimate {} exceeds sub-chunk budget",
                chunk.token_estimate
            );
        }
    }

    #[test]
    fn critical_sentence_keeps_its_preceding_sentence() {
        // 10-word sentences, budget 121-30=91 tokens → exactly 7 sentences
        // fit; the 8th (critical) would open a new chunk.
        let filler = "The patient talked about daily walks in the park today. ";
        let critical = "He denies any chest pain when he rests at home. ";
        let mut input = filler.repeat(7);
        input.push_str(critical);
        input.push_str(&filler.repeat(2));

        let result = run(&input, &small_config(121, 30));

        assert!(result.chunks.len() >= 2);
        let critical_chunk = result
            .chunks
            .iter()
            .find(|c| c.text.contains("denies"))
            .expect("critical sentence must land in some chunk");
        assert!(
            critical_chunk.text.contains("daily walks in the park today. He denies"),
            "preceding sentence must travel with the critical one: {:?}",
            critical_chunk.text
        );
        assert_eq!(reconstruct(&result), input);
    }

    #[test]
    fn spanish_negation_sentence_never_splits_internally() {
        let filler = "La consulta continuó con temas generales de rutina diaria. ";
        let negation = "No tiene antecedentes cardíacos. ";
        let mut input = String::new();
        for block in 0..12 {
            input.push_str(&filler.repeat(5));
            if block % 3 == 1 {
                input.push_str(negation);
            }
        }

        let result = run(&input, &small_config(60, 15));

        assert!(result.requires_chunking);
        for chunk in &result.chunks {
            if chunk.text.contains("No tiene") {
                assert!(
                    chunk.text.contains("antecedentes cardíacos"),
                    "negation split from its object in chunk: {:?}",
                    chunk.text
                );
            }
        }
        assert_eq!(reconstruct(&result), input);
    }

    #[test]
    fn six_hundred_sentences_segment_well_under_a_second() {
        let sentence = "Patient mentions mild discomfort after long walks near home. ";
        let input = sentence.repeat(600);

        let start = Instant::now();
        let result = run(&input, &AnalysisConfig::default());
        let elapsed = start.elapsed();

        assert!(result.requires_chunking);
        assert!(result.chunks.len() > 1);
        assert_eq!(reconstruct(&result), input);
        assert!(
            elapsed.as_millis() < 1000,
            "segmentation took {elapsed:?}, expected well under a second"
        );
    }

    #[test]
    fn single_oversize_sentence_becomes_its_own_chunk() {
        let giant = format!("{} and then some.", "word ".repeat(200));
        let short = "Short follow-up sentence here. ";
        let input = format!("{short}{giant}");

        let result = run(&input, &small_config(50, 10));
        assert!(result.requires_chunking);
        assert_eq!(reconstruct(&result), input);
        assert!(result.chunks.iter().any(|c| c.token_estimate > 50));
    }
}
