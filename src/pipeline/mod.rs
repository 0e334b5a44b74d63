//! Pipeline stages for document summarisation.
//!
//! Each submodule implements exactly one transformation step, so each is
//! independently testable and can be swapped without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! loader ──▶ pdf ──▶ quality ──▶ (ocr) ──▶ sanitize ──▶ quality ──▶ llm ──▶ (fallback)
//! (bytes)   (text)   (score)    (vision)   (cleanup)    (gate)     (AI)    (extractive)
//! ```
//!
//! 1. [`loader`]   — resolve the document to bytes; sniff `%PDF`
//! 2. [`pdf`]      — byte-offset content-stream scanner; raw-scan fallback
//! 3. [`quality`]  — heuristic prose-vs-noise score and the two gates
//! 4. [`ocr`]      — external recognition when native extraction is weak
//! 5. [`sanitize`] — strip non-printable runs and noise tokens
//! 6. [`llm`]      — the generative call under a hard deadline; the only
//!    stage besides OCR with network I/O
//! 7. [`fallback`] — extractive sentence selection when AI is unavailable

pub mod fallback;
pub mod llm;
pub mod loader;
pub mod ocr;
pub mod pdf;
pub mod quality;
pub mod sanitize;
