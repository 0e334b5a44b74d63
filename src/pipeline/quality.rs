//! Heuristic quality scoring: is this text prose, or extraction noise?
//!
//! The composite score is `0.5 * letters + 0.3 * vowels + 0.2 * words`:
//!
//! | Component | Meaning |
//! |-----------|---------|
//! | letters   | ASCII letters / all characters |
//! | vowels    | ASCII vowels / ASCII letters |
//! | words     | whitespace-delimited words / 80, capped at 1 |
//!
//! Every component is a separate pure function so thresholds can be tuned
//! and tested in isolation. Scores are computed on the trimmed text, so
//! surrounding whitespace never changes the result.

use crate::config::QualityThresholds;
use crate::pipeline::sanitize::is_ascii_vowel;
use serde::{Deserialize, Serialize};

/// Word count at which the word component saturates.
pub const WORDS_FOR_FULL_SCORE: f64 = 80.0;

const LETTERS_WEIGHT: f64 = 0.5;
const VOWELS_WEIGHT: f64 = 0.3;
const WORDS_WEIGHT: f64 = 0.2;

/// Composite quality score in `[0, 1]` with its components.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct QualityScore {
    pub composite: f64,
    pub letters_ratio: f64,
    pub vowel_ratio: f64,
    pub word_score: f64,
}

/// Score `text`. Pure, total and deterministic; empty text scores 0.
pub fn score(text: &str) -> QualityScore {
    let text = text.trim();
    if text.is_empty() {
        return QualityScore::default();
    }

    let letters_ratio = letters_ratio(text);
    let vowel_ratio = vowel_ratio(text);
    let word_score = word_score(text);
    let composite = (LETTERS_WEIGHT * letters_ratio
        + VOWELS_WEIGHT * vowel_ratio
        + WORDS_WEIGHT * word_score)
        .clamp(0.0, 1.0);

    QualityScore {
        composite,
        letters_ratio,
        vowel_ratio,
        word_score,
    }
}

/// ASCII letters as a fraction of all characters.
pub fn letters_ratio(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let letters = text.chars().filter(char::is_ascii_alphabetic).count();
    letters as f64 / total as f64
}

/// ASCII vowels as a fraction of ASCII letters.
pub fn vowel_ratio(text: &str) -> f64 {
    let letters = text.bytes().filter(u8::is_ascii_alphabetic).count();
    if letters == 0 {
        return 0.0;
    }
    let vowels = text.bytes().filter(|b| is_ascii_vowel(*b)).count();
    vowels as f64 / letters as f64
}

/// Word count divided by [`WORDS_FOR_FULL_SCORE`], capped at 1.
pub fn word_score(text: &str) -> f64 {
    let words = text.split_whitespace().count() as f64;
    (words / WORDS_FOR_FULL_SCORE).min(1.0)
}

/// Whether native extraction is poor enough to try OCR.
///
/// Either a low score or a short extraction is sufficient.
pub fn needs_ocr(score: &QualityScore, extracted_chars: usize, t: &QualityThresholds) -> bool {
    score.composite < t.ocr_min_score || extracted_chars < t.ocr_min_chars
}

/// Whether sanitised text is too poor to summarise at all.
pub fn is_unreadable(score: &QualityScore, sanitized: &str, t: &QualityThresholds) -> bool {
    score.composite < t.readable_min_score
        || sanitized.split_whitespace().count() < t.readable_min_tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROSE: &str = "The quarterly report shows that revenue increased across all \
        regions, driven mainly by strong demand for the new product line.";

    #[test]
    fn empty_scores_zero() {
        assert_eq!(score("").composite, 0.0);
        assert_eq!(score("   \n\t").composite, 0.0);
    }

    #[test]
    fn trim_invariant() {
        assert_eq!(score(PROSE), score(&format!("  \n{PROSE}\t  ")));
    }

    #[test]
    fn always_in_unit_range() {
        let many = "word ".repeat(500);
        for s in ["a", "zzzzzz", "1234 5678", "\u{1}\u{2}", PROSE, many.as_str()] {
            let q = score(s);
            assert!((0.0..=1.0).contains(&q.composite), "{s:?}: {q:?}");
        }
    }

    #[test]
    fn components() {
        assert_eq!(letters_ratio("ab12"), 0.5);
        assert_eq!(vowel_ratio("abcd"), 0.25);
        assert_eq!(vowel_ratio("1234"), 0.0);
        assert_eq!(word_score(&"w ".repeat(40)), 0.5);
        assert_eq!(word_score(&"w ".repeat(400)), 1.0);
    }

    #[test]
    fn composite_is_weighted_sum() {
        let q = score("aaaa");
        // letters 1.0, vowels 1.0, words 1/80
        let expected = 0.5 + 0.3 + 0.2 / 80.0;
        assert!((q.composite - expected).abs() < 1e-12, "{q:?}");
    }

    #[test]
    fn prose_beats_noise() {
        let noise = "%%EOF 0 0 obj << /Length 4521 /Filter /FlateDecode >> xref 0000000000 65535 f";
        assert!(score(PROSE).composite > score(noise).composite);
    }

    #[test]
    fn ocr_trigger_on_either_condition() {
        let t = QualityThresholds::default();
        let good = score(PROSE);
        assert!(needs_ocr(&good, 50, &t), "short text triggers OCR");
        assert!(!needs_ocr(&good, 500, &t));
        let bad = score("1 2 3 4 5 6 7 8 9 0");
        assert!(needs_ocr(&bad, 5_000, &t), "low score triggers OCR");
    }

    #[test]
    fn unreadable_on_score_or_token_count() {
        let t = QualityThresholds::default();
        assert!(is_unreadable(&score("short note"), "short note", &t));
        let long = "ok ".repeat(20);
        assert!(!is_unreadable(&score(&long), &long, &t));
        let q = QualityScore {
            composite: 0.05,
            ..QualityScore::default()
        };
        assert!(is_unreadable(&q, &long, &t));
    }
}
