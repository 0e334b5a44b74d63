//! # edgequake-summarize
//!
//! Turn an uploaded document (PDF, plain text, scanned image) or a typed
//! note into a trustworthy summary.
//!
//! ## Why this crate?
//!
//! Uploaded files are messy: PDFs whose text hides in compressed content
//! streams, scans with no text layer at all, extraction output full of
//! binary noise. Sending that straight to an LLM produces confident nonsense.
//! This crate extracts what it can, scores whether it is actually prose,
//! falls back to OCR when it is not, cleans it, and only then asks a model
//! for a summary. When the model is slow or unavailable it returns an
//! extractive summary instead of an error.
//!
//! ## Pipeline Overview
//!
//! ```text
//! request
//!  │
//!  ├─ 1. Load      note text, or file bytes from an ObjectStore
//!  ├─ 2. Extract   PDF content streams → literal strings (raw-scan fallback)
//!  ├─ 3. Score     letters / vowels / words heuristic
//!  ├─ 4. OCR       only if the score or length is low
//!  ├─ 5. Sanitize  drop non-printable runs and noise tokens
//!  ├─ 6. Gate      unreadable → "Text not readable", no AI call
//!  ├─ 7. Summarize style-specific prompt, hard deadline
//!  └─ 8. Fallback  extractive sentence selection
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_summarize::{SummaryConfig, SummaryRequest, SummaryStyle, Summarizer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let summarizer = Summarizer::from_config(SummaryConfig::default())?;
//!     let request = SummaryRequest::note(
//!         "Buy milk. Call Alice. Finish report.",
//!         SummaryStyle::Bullet,
//!     );
//!     let result = summarizer.summarize(request).await?;
//!     println!("[{:?}] {}", result.source, result.summary_text);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `docsum` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod request;
pub mod summarize;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ProviderShape, QualityThresholds, SummaryConfig, SummaryConfigBuilder};
pub use error::{DegradedError, StorageError, SummarizeError};
pub use output::{SummaryResult, SummarySource};
pub use pipeline::llm::{GenerationParams, LlmGenerator, TextGenerator};
pub use pipeline::loader::{ContainerKind, FsObjectStore, HttpObjectStore, ObjectStore};
pub use pipeline::ocr::{OcrService, VisionOcr};
pub use pipeline::quality::{score, QualityScore};
pub use pipeline::sanitize::sanitize;
pub use request::{Document, DocumentKind, SummaryRequest, SummaryStyle, WireRequest};
pub use summarize::{resolve_provider, summarize_sync, Summarizer};
