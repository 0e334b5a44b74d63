//! Native PDF text extraction without an object-graph parser.
//!
//! The extractor walks the file as an immutable byte buffer, one byte per
//! character, so stream offsets stay exact:
//!
//! 1. every `stream … endstream` pair is a content-stream candidate;
//! 2. each candidate is inflated (FlateDecode) or, if that fails, used raw;
//! 3. literal strings `( … )` inside the candidates are unescaped, cleaned
//!    and collected in byte-offset order;
//! 4. if nothing was collected, a raw scan gathers every run of at least
//!    [`MIN_RAW_RUN`] printable ASCII bytes instead.
//!
//! Only literal-string text showing is understood. `TJ` arrays of hex strings
//! and CID fonts fall through to the raw scan, and multi-column pages come out
//! in stream order rather than reading order. The quality gate and OCR
//! fallback downstream exist to catch those cases.

use crate::pipeline::sanitize::cap_chars;
use flate2::read::ZlibDecoder;
use std::io::Read;
use tracing::debug;

/// Shortest printable run kept by the raw scan.
pub const MIN_RAW_RUN: usize = 5;

/// Upper bound on a single inflated stream (decompression-bomb guard).
const MAX_INFLATED_BYTES: u64 = 16 * 1024 * 1024;

/// How the text of a PDF was recovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMethod {
    /// Literal strings found in content streams.
    LiteralStrings,
    /// Printable-ASCII runs from the whole file.
    RawScan,
}

/// Result of [`extract_pdf_text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfExtraction {
    pub text: String,
    pub method: ExtractionMethod,
    /// Number of `stream … endstream` candidates seen.
    pub streams: usize,
}

/// Extract best-effort plain text from PDF bytes, capped at `max_chars`.
pub fn extract_pdf_text(bytes: &[u8], max_chars: usize) -> PdfExtraction {
    let mut parts: Vec<String> = Vec::new();
    let mut streams = 0usize;

    for raw in ContentStreams::new(bytes) {
        streams += 1;
        match inflate(raw) {
            Some(decoded) => parts.extend(literal_strings(&decoded)),
            None => parts.extend(literal_strings(raw)),
        }
    }

    let method = if parts.is_empty() {
        parts = printable_runs(bytes, MIN_RAW_RUN);
        ExtractionMethod::RawScan
    } else {
        ExtractionMethod::LiteralStrings
    };

    let text = cap_chars(&parts.join(" "), max_chars);
    debug!(
        "PDF extraction: {} streams, {} parts via {:?}, {} chars",
        streams,
        parts.len(),
        method,
        text.chars().count()
    );

    PdfExtraction {
        text,
        method,
        streams,
    }
}

/// Raw JPEG payloads of `DCTDecode` image streams, in file order.
///
/// Scanned PDFs usually embed each page as one JPEG; these are what the
/// OCR adapter sends to the vision model.
pub fn embedded_jpegs(bytes: &[u8]) -> Vec<&[u8]> {
    ContentStreams::new(bytes)
        .filter(|s| s.starts_with(&[0xFF, 0xD8, 0xFF]))
        .collect()
}

// ── Stream scanning ──────────────────────────────────────────────────────────

/// Iterator over the payload slices of `stream … endstream` objects.
pub struct ContentStreams<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ContentStreams<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }
}

impl<'a> Iterator for ContentStreams<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<&'a [u8]> {
        let data = self.data;
        loop {
            let at = find(data, b"stream", self.pos)?;
            // The tail of a stray `endstream` is not a stream start.
            if at >= 3 && &data[at - 3..at] == b"end" {
                self.pos = at + b"stream".len();
                continue;
            }

            let after_kw = at + b"stream".len();
            let eol = data[after_kw..]
                .iter()
                .position(|&b| b == b'\n' || b == b'\r')
                .map(|i| after_kw + i)?;
            let start = if data[eol] == b'\r' && data.get(eol + 1) == Some(&b'\n') {
                eol + 2
            } else {
                eol + 1
            };

            let end = find(data, b"endstream", start)?;
            self.pos = end + b"endstream".len();
            return Some(trim_trailing_eol(&data[start..end]));
        }
    }
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| from + i)
}

fn trim_trailing_eol(slice: &[u8]) -> &[u8] {
    let slice = slice.strip_suffix(b"\n").unwrap_or(slice);
    slice.strip_suffix(b"\r").unwrap_or(slice)
}

/// Inflate a zlib-wrapped (FlateDecode) stream. `None` when the slice is not
/// valid DEFLATE data.
fn inflate(raw: &[u8]) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    match ZlibDecoder::new(raw)
        .take(MAX_INFLATED_BYTES)
        .read_to_end(&mut out)
    {
        Ok(_) => Some(out),
        // Truncated streams (bad checksum, missing tail) keep their prefix.
        Err(_) if !out.is_empty() => Some(out),
        Err(_) => None,
    }
}

// ── Literal strings ──────────────────────────────────────────────────────────

/// Every non-empty, cleaned `( … )` literal string in `data`, in order.
///
/// An unescaped `)` closes the string. Escapes `\n \r \t \f \b \\ \( \)` and
/// octal `\ddd` are decoded; a backslash before a line break joins lines.
pub fn literal_strings(data: &[u8]) -> Vec<String> {
    let mut out = Vec::new();
    let mut i = 0;

    while i < data.len() {
        if data[i] != b'(' {
            i += 1;
            continue;
        }

        let mut buf: Vec<u8> = Vec::new();
        let mut j = i + 1;
        let mut closed = false;
        while j < data.len() {
            match data[j] {
                b')' => {
                    closed = true;
                    break;
                }
                b'\\' if j + 1 < data.len() => {
                    j += 1;
                    j += unescape(&data[j..], &mut buf);
                    continue;
                }
                b => buf.push(b),
            }
            j += 1;
        }
        if !closed {
            break;
        }

        let cleaned = collapse_whitespace(&latin1(&buf));
        if !cleaned.is_empty() {
            out.push(cleaned);
        }
        i = j + 1;
    }

    out
}

/// Decode one escape sequence (the bytes after `\`). Returns bytes consumed.
fn unescape(rest: &[u8], buf: &mut Vec<u8>) -> usize {
    match rest[0] {
        b'n' => buf.push(b'\n'),
        b'r' => buf.push(b'\r'),
        b't' => buf.push(b'\t'),
        b'f' => buf.push(0x0C),
        b'b' => buf.push(0x08),
        b'\r' => {
            return if rest.get(1) == Some(&b'\n') { 2 } else { 1 };
        }
        b'\n' => {}
        b'0'..=b'7' => {
            let digits = rest
                .iter()
                .take(3)
                .take_while(|b| (b'0'..=b'7').contains(*b))
                .count();
            let value = rest[..digits]
                .iter()
                .fold(0u16, |acc, d| acc * 8 + u16::from(d - b'0'));
            buf.push((value & 0xFF) as u8);
            return digits;
        }
        // `\\`, `\(`, `\)` and unknown escapes keep the escaped byte.
        other => buf.push(other),
    }
    1
}

// ── Raw scan ─────────────────────────────────────────────────────────────────

/// Every maximal run of at least `min_len` printable ASCII bytes, with
/// internal whitespace collapsed. Runs that are only spaces are dropped.
pub fn printable_runs(data: &[u8], min_len: usize) -> Vec<String> {
    data.split(|b| !is_printable_ascii(*b))
        .filter(|run| run.len() >= min_len)
        .map(|run| collapse_whitespace(&latin1(run)))
        .filter(|s| !s.is_empty())
        .collect()
}

fn is_printable_ascii(b: u8) -> bool {
    (0x20..=0x7E).contains(&b)
}

/// One byte per character, so no byte is lost or reinterpreted.
fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_ascii_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn deflate(data: &[u8]) -> Vec<u8> {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(data).unwrap();
        enc.finish().unwrap()
    }

    fn pdf_with_streams(payloads: &[Vec<u8>]) -> Vec<u8> {
        let mut pdf = b"%PDF-1.4\n".to_vec();
        for (n, p) in payloads.iter().enumerate() {
            pdf.extend_from_slice(
                format!("{} 0 obj\n<< /Length {} /Filter /FlateDecode >>\nstream\n", n + 1, p.len())
                    .as_bytes(),
            );
            pdf.extend_from_slice(p);
            pdf.extend_from_slice(b"\nendstream\nendobj\n");
        }
        pdf.extend_from_slice(b"%%EOF\n");
        pdf
    }

    #[test]
    fn flate_streams_concatenate_in_order() {
        let pdf = pdf_with_streams(&[
            deflate(b"BT /F1 12 Tf 72 712 Td (Hello   world) Tj ET"),
            deflate(b"BT (Second\\npage) Tj ET"),
        ]);
        let out = extract_pdf_text(&pdf, 12_000);
        assert_eq!(out.method, ExtractionMethod::LiteralStrings);
        assert_eq!(out.streams, 2);
        assert_eq!(out.text, "Hello world Second page");
    }

    #[test]
    fn uncompressed_stream_used_raw() {
        let pdf = b"%PDF-1.4\n1 0 obj\n<< /Length 20 >>\nstream\r\nBT (plain text) Tj ET\r\nendstream\nendobj\n";
        let out = extract_pdf_text(pdf, 12_000);
        assert_eq!(out.text, "plain text");
        assert_eq!(out.method, ExtractionMethod::LiteralStrings);
    }

    #[test]
    fn corrupt_stream_does_not_abort_document() {
        let mut bad = vec![0x78, 0x9C, 0xFF, 0xFF, 0x00];
        bad.extend_from_slice(b"(kept anyway)");
        let pdf = pdf_with_streams(&[bad, deflate(b"(good one)")]);
        let out = extract_pdf_text(&pdf, 12_000);
        assert_eq!(out.text, "kept anyway good one");
    }

    #[test]
    fn truncated_flate_stream_keeps_its_prefix() {
        let mut cut = deflate(b"BT (Quarterly report) Tj ET");
        cut.truncate(cut.len() - 4); // adler32 trailer
        let decoded = inflate(&cut).expect("decoded prefix");
        assert_eq!(literal_strings(&decoded), vec!["Quarterly report"]);
    }

    #[test]
    fn falls_back_to_raw_scan_without_literals() {
        let pdf = pdf_with_streams(&[deflate(b"BT <48656C6C6F> Tj ET")]);
        let out = extract_pdf_text(&pdf, 12_000);
        assert_eq!(out.method, ExtractionMethod::RawScan);
        assert!(out.text.starts_with("%PDF-1.4"), "got: {}", out.text);
        assert!(out.text.contains("endstream"));
    }

    #[test]
    fn raw_scan_with_no_streams() {
        let pdf = b"%PDF-1.7\n\x01\x02Quarterly results\x00\xffab\x01cdefg";
        let out = extract_pdf_text(pdf, 12_000);
        assert_eq!(out.streams, 0);
        assert_eq!(out.method, ExtractionMethod::RawScan);
        assert_eq!(out.text, "%PDF-1.7 Quarterly results cdefg");
    }

    #[test]
    fn nothing_printable_yields_empty() {
        let pdf = b"%PDF\n\x00\x01ab\x02\x03";
        let out = extract_pdf_text(pdf, 12_000);
        assert_eq!(out.text, "");
    }

    #[test]
    fn output_is_capped() {
        let body = format!("({})", "word ".repeat(5_000));
        let pdf = pdf_with_streams(&[deflate(body.as_bytes())]);
        let out = extract_pdf_text(&pdf, 12_000);
        assert_eq!(out.text.chars().count(), 12_000);
    }

    #[test]
    fn escapes_are_decoded() {
        let parts = literal_strings(b"(a\\tb) (c\\\\d) (\\(x\\)) (\\101\\102C) (line\\\ncont)");
        assert_eq!(parts, vec!["a b", "c\\d", "(x)", "ABC", "linecont"]);
    }

    #[test]
    fn empty_and_blank_strings_dropped() {
        assert!(literal_strings(b"() (   ) (\\n\\t)").is_empty());
    }

    #[test]
    fn unterminated_string_ignored() {
        assert_eq!(literal_strings(b"(ok) (never closed"), vec!["ok"]);
    }

    #[test]
    fn stray_endstream_is_not_a_stream() {
        let data = b"junk endstream more\nstuff";
        assert_eq!(ContentStreams::new(data).count(), 0);
    }

    #[test]
    fn stream_without_end_stops_scan() {
        let data = b"stream\n(abc) no terminator";
        assert_eq!(ContentStreams::new(data).count(), 0);
    }

    #[test]
    fn finds_embedded_jpegs() {
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE0];
        jpeg.extend_from_slice(b"fake-jpeg-body");
        let pdf = pdf_with_streams(&[deflate(b"(text)"), jpeg.clone()]);
        let found = embedded_jpegs(&pdf);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0], jpeg.as_slice());
    }

    #[test]
    fn printable_runs_respect_min_len() {
        let runs = printable_runs(b"abcd\x00abcde\x01  x   y  \x02", 5);
        assert_eq!(runs, vec!["abcde", "x y"]);
    }
}
