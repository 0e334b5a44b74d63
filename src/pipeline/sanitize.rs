//! Sanitisation: strip extraction noise before scoring and summarising.
//!
//! The rules are deliberately aggressive and English-oriented. A token with
//! more than five letters and no vowel is treated as encoding noise, which
//! also drops some acronyms and transliterated names; the quality scorer
//! has the same bias, so the two stay consistent.
//!
//! [`sanitize`] is idempotent and never makes text longer.

/// Tokens longer than this are unsegmented runs, not words.
pub const MAX_TOKEN_CHARS: usize = 60;

/// Tokens longer than this must contain a vowel.
pub const VOWELLESS_TOKEN_LIMIT: usize = 5;

/// Clean `text` and cap it at `max_chars` characters.
///
/// Steps, in order:
/// 1. every run of characters outside printable ASCII becomes one space
/// 2. whitespace runs collapse to one space; ends are trimmed
/// 3. tokens without an ASCII letter are dropped
/// 4. tokens over [`VOWELLESS_TOKEN_LIMIT`] chars with letters but no vowel are dropped
/// 5. tokens over [`MAX_TOKEN_CHARS`] chars are dropped
/// 6. survivors are joined with single spaces, keeping whole tokens up to `max_chars`
pub fn sanitize(text: &str, max_chars: usize) -> String {
    let printable = replace_non_printable(text);

    let mut out = String::with_capacity(printable.len().min(max_chars));
    for token in printable.split_ascii_whitespace().filter(|t| keep_token(t)) {
        let needed = if out.is_empty() {
            token.len()
        } else {
            token.len() + 1
        };
        if out.len() + needed > max_chars {
            break;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(token);
    }
    out
}

fn replace_non_printable(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if is_printable_ascii(c) {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push(' ');
            in_run = true;
        }
    }
    out
}

fn keep_token(token: &str) -> bool {
    let has_letter = token.bytes().any(|b| b.is_ascii_alphabetic());
    if !has_letter {
        return false;
    }
    if token.len() > VOWELLESS_TOKEN_LIMIT && !token.bytes().any(is_ascii_vowel) {
        return false;
    }
    token.len() <= MAX_TOKEN_CHARS
}

fn is_printable_ascii(c: char) -> bool {
    (' '..='~').contains(&c)
}

pub(crate) fn is_ascii_vowel(b: u8) -> bool {
    matches!(b.to_ascii_lowercase(), b'a' | b'e' | b'i' | b'o' | b'u')
}

/// First `max_chars` characters of `s` (char-boundary safe).
pub fn cap_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CAP: usize = 12_000;

    #[test]
    fn control_and_unicode_runs_become_one_space() {
        assert_eq!(sanitize("hello\u{0}\u{1}\u{7f}world", CAP), "hello world");
        assert_eq!(sanitize("caf\u{e9} au lait", CAP), "caf au lait");
        assert_eq!(sanitize("line one\r\n\tline two", CAP), "line one line two");
    }

    #[test]
    fn drops_tokens_without_letters() {
        assert_eq!(sanitize("total 1234 - 56.7 items", CAP), "total items");
    }

    #[test]
    fn drops_long_vowelless_tokens() {
        assert_eq!(sanitize("the xkcdpq brown fox", CAP), "the brown fox");
        // Short ones survive.
        assert_eq!(sanitize("NASA HTTP API dry", CAP), "NASA HTTP API dry");
    }

    #[test]
    fn drops_overlong_tokens() {
        let long = "a".repeat(61);
        let ok = "e".repeat(60);
        assert_eq!(sanitize(&format!("x {long} {ok}"), CAP), format!("x {ok}"));
    }

    #[test]
    fn caps_on_token_boundaries() {
        let text = "alpha beta gamma delta";
        assert_eq!(sanitize(text, 10), "alpha beta");
        assert_eq!(sanitize(text, 11), "alpha beta");
        assert_eq!(sanitize(text, 4), "");
    }

    #[test]
    fn idempotent() {
        let samples = [
            "  Mixed\u{1}\u{2} CONTENT  with 123 numbers and qwrtzp noise\n\n",
            "rhythms and strengths, café résumé naïve",
            "",
            "\u{0}\u{0}\u{0}",
        ];
        for s in samples {
            for cap in [5, 17, CAP] {
                let once = sanitize(s, cap);
                assert_eq!(sanitize(&once, cap), once, "input {s:?} cap {cap}");
            }
        }
    }

    #[test]
    fn never_longer() {
        let samples = ["a\u{1}b", "  x  ", "\u{2603}\u{2603} snow", "plain words here"];
        for s in samples {
            assert!(sanitize(s, CAP).len() <= s.len(), "{s:?}");
        }
    }

    #[test]
    fn cap_chars_is_char_safe() {
        assert_eq!(cap_chars("héllo", 2), "hé");
        assert_eq!(cap_chars("abc", 10), "abc");
        assert_eq!(cap_chars("", 3), "");
    }
}
