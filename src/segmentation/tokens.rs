//! Token estimation.
//!
//! A cheap budgeting gate, not an accounting mechanism: whitespace word
//! count times a fixed per-word factor, rounded up. Clinical speech in the
//! languages we handle averages ~1.3 model tokens per word. Downstream
//! consumers tolerate ±20% error; nothing in this crate depends on exact
//! token counts.

/// Average model tokens per whitespace-delimited word.
pub(crate) const TOKENS_PER_WORD: f64 = 1.3;

/// Estimate the token count of `text`.
///
/// Deterministic, pure, and total: no input can fail.
pub fn estimate_tokens(text: &str) -> usize {
    let words = text.split_whitespace().count();
    (words as f64 * TOKENS_PER_WORD).ceil() as usize
}

/// Number of whole words that fit inside a token budget.
///
/// Used by the context injector to turn an overlap budget into a word
/// count without re-estimating repeatedly.
pub(crate) fn words_for_budget(token_budget: usize) -> usize {
    (token_budget as f64 / TOKENS_PER_WORD).floor() as usize
}
