//! Sentence splitting with clinical abbreviation protection.
//!
//! Sentences are byte ranges that exactly partition their input, so
//! sentence-level re-splitting of an oversize section preserves the
//! lossless reconstruction invariant. A period only ends a sentence when it
//! is followed by whitespace (or end of text) and the word it closes is not
//! a protected clinical abbreviation.

use std::ops::Range;

/// Abbreviations whose trailing period never ends a sentence.
/// Compared case-insensitively against the word closing the period.
const PROTECTED_ABBREVIATIONS: &[&str] = &[
    "dr.", "dra.", "sr.", "sra.", "mr.", "mrs.", "ms.", "prof.", "st.", "vs.", "etc.",
    "approx.", "aprox.", "e.g.", "i.e.", "p.ej.", "no.", "núm.", "mg.", "mcg.", "ml.",
    "kg.", "cm.", "mm.", "hr.", "min.", "tab.", "cap.",
];

/// Split `text` into sentence ranges.
///
/// Trailing whitespace after a sentence terminator belongs to the sentence
/// it closes, so the returned ranges are ordered and partition
/// `0..text.len()` exactly. Pure and total; empty input yields no ranges.
pub fn split_sentences(text: &str) -> Vec<Range<usize>> {
    let mut sentences = Vec::new();
    let mut sentence_start = 0usize;
    let mut i = 0usize;

    while i < text.len() {
        let ch = match text[i..].chars().next() {
            Some(c) => c,
            None => break,
        };
        let after = i + ch.len_utf8();

        let terminator = matches!(ch, '.' | '!' | '?');
        if !terminator {
            i = after;
            continue;
        }

        let next = text[after..].chars().next();
        let followed_by_break = next.is_none() || next.is_some_and(char::is_whitespace);
        if !followed_by_break || (ch == '.' && ends_protected_abbreviation(text, after)) {
            i = after;
            continue;
        }

        // Fold the whitespace run after the terminator into this sentence.
        let mut end = after;
        for c in text[after..].chars() {
            if !c.is_whitespace() {
                break;
            }
            end += c.len_utf8();
        }

        sentences.push(sentence_start..end);
        sentence_start = end;
        i = end;
    }

    if sentence_start < text.len() {
        sentences.push(sentence_start..text.len());
    }

    sentences
}

/// True when the word ending at `period_end` (exclusive) is a protected
/// abbreviation such as "Dr." or "mg.".
fn ends_protected_abbreviation(text: &str, period_end: usize) -> bool {
    let head = &text[..period_end];
    let word_start = head
        .rfind(char::is_whitespace)
        .map(|p| p + head[p..].chars().next().map_or(1, char::len_utf8))
        .unwrap_or(0);
    // Whole-word comparison: "rest." must not match the "st." entry.
    let word = head[word_start..]
        .trim_start_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    PROTECTED_ABBREVIATIONS.iter().any(|abbr| word == *abbr)
}
