//! Extractive fallback summary: pick original sentences verbatim.
//!
//! Used whenever the generative model is disabled, fails, times out, or
//! answers with noise. Deterministic and offline.

use crate::pipeline::sanitize::cap_chars;
use once_cell::sync::Lazy;
use regex::Regex;

/// Sentences shorter than this are fragments (headers, list markers, …).
pub const MIN_SENTENCE_CHARS: usize = 10;

/// Upper bound on sentences in a fallback summary.
pub const MAX_SENTENCES: usize = 5;

/// Upper bound on the fallback summary length.
pub const MAX_SUMMARY_CHARS: usize = 1_000;

/// Leading characters used when the text has no sentence structure.
pub const NO_SENTENCE_CHARS: usize = 300;

/// Returned when there is no text at all to draw from.
pub const APOLOGY: &str =
    "Sorry, we could not generate a summary for this content. Please try again later.";

// A run of non-terminators followed by its terminators (or end of text).
static RE_SENTENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^.!?]+(?:[.!?]+|$)").unwrap());

/// Split on `.`, `!`, `?`, keeping each sentence's terminator.
pub fn split_sentences(text: &str) -> Vec<&str> {
    RE_SENTENCE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Build an extractive summary of `text`.
///
/// * up to [`MAX_SENTENCES`] sentences: the text is its own summary
/// * more: fragments under [`MIN_SENTENCE_CHARS`] are dropped and the first
///   third of the rest (at least 1, at most [`MAX_SENTENCES`]) is kept
/// * no sentence structure: the leading characters of the text
/// * no text: [`APOLOGY`]
pub fn extractive_summary(text: &str) -> String {
    let text = text.trim();
    if text.is_empty() {
        return APOLOGY.to_string();
    }

    let sentences = split_sentences(text);
    let chosen: Vec<&str> = if sentences.len() <= MAX_SENTENCES {
        sentences
    } else {
        let kept: Vec<&str> = sentences
            .iter()
            .copied()
            .filter(|s| s.chars().count() >= MIN_SENTENCE_CHARS)
            .collect();
        let pool = if kept.is_empty() { sentences } else { kept };
        let take = pool.len().div_ceil(3).clamp(1, MAX_SENTENCES);
        pool.into_iter().take(take).collect()
    };

    let summary = if chosen.is_empty() {
        cap_chars(text, NO_SENTENCE_CHARS)
    } else {
        chosen.join(" ")
    };
    bounded(&summary)
}

fn bounded(summary: &str) -> String {
    if summary.chars().count() <= MAX_SUMMARY_CHARS {
        return summary.to_string();
    }
    let cut = cap_chars(summary, MAX_SUMMARY_CHARS);
    match cut.rfind(' ') {
        Some(idx) if idx > 0 => format!("{}...", &cut[..idx]),
        _ => format!("{cut}..."),
    }
}
