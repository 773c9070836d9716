//! Context buffer injection.
//!
//! After segmentation, every chunk except the first receives the trailing
//! `overlap_tokens` worth of words of its predecessor as leading context,
//! and every chunk except the last receives the leading preview slice of
//! its successor as trailing context when that slice carries critical
//! content. Peek-ahead/peek-behind only: primary spans and their token
//! accounting never change.

use super::critical::CriticalDetector;
use super::tokens::words_for_budget;
use super::types::Chunk;
use crate::config::AnalysisConfig;

/// Populate `leading_context`/`trailing_context` on an ordered chunk list.
pub fn inject_context(
    chunks: &mut [Chunk],
    config: &AnalysisConfig,
    detector: &dyn CriticalDetector,
) {
    if chunks.len() < 2 {
        return;
    }

    for i in 0..chunks.len() {
        if i > 0 {
            let tail = tail_words(&chunks[i - 1].text, config.overlap_tokens);
            if !tail.is_empty() {
                chunks[i].leading_context = Some(tail);
            }
        }

        if i + 1 < chunks.len() {
            let head = head_words(&chunks[i + 1].text, config.preview_tokens);
            if !head.is_empty() && detector.contains_critical(&head) {
                chunks[i].trailing_context = Some(head);
            }
        }

        chunks[i].has_injected_context =
            chunks[i].leading_context.is_some() || chunks[i].trailing_context.is_some();
    }
}

/// Last `token_budget` worth of whole words, joined by single spaces.
fn tail_words(text: &str, token_budget: usize) -> String {
    let limit = words_for_budget(token_budget);
    if limit == 0 {
        return String::new();
    }
    let words: Vec<&str> = text.split_whitespace().collect();
    let skip = words.len().saturating_sub(limit);
    words[skip..].join(" ")
}

/// First `token_budget` worth of whole words, joined by single spaces.
fn head_words(text: &str, token_budget: usize) -> String {
    let limit = words_for_budget(token_budget);
    text.split_whitespace()
        .take(limit)
        .collect::<Vec<&str>>()
        .join(" ")
}
