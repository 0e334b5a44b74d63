//! Error types for the edgequake-summarize library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SummarizeError`] — **Fatal**: the request cannot be served at all
//!   (missing fields, document not in storage, nothing extractable). Returned
//!   as `Err(SummarizeError)` from the top-level `summarize*` functions.
//!
//! * [`DegradedError`] — **Non-fatal**: an external collaborator (OCR or the
//!   generative model) failed, timed out or answered with noise. The pipeline
//!   always recovers through its documented fallback and records the reason
//!   in [`crate::output::SummaryResult::warning`].
//!
//! Once document bytes are loaded, only `DegradedError`s are possible: the
//! caller gets *some* summary back rather than a hard failure.

use thiserror::Error;

/// All fatal errors returned by the edgequake-summarize library.
#[derive(Debug, Error)]
pub enum SummarizeError {
    // ── Request errors ────────────────────────────────────────────────────
    /// A required request field is missing or has an invalid value.
    #[error("Invalid request: {field} {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// Extraction finished but produced no text at all.
    #[error("Document '{label}' contains no extractable text")]
    EmptyContent { label: String },

    // ── Storage errors ────────────────────────────────────────────────────
    /// The storage collaborator could not supply the document bytes.
    #[error("Content unavailable for '{key}': {source}")]
    ContentUnavailable {
        key: String,
        #[source]
        source: StorageError,
    },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SummarizeError {
    /// `true` for errors caused by the request itself rather than by the
    /// service. HTTP front-ends map these to 4xx.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SummarizeError::InvalidInput { .. } | SummarizeError::EmptyContent { .. }
        )
    }
}

/// Failure reported by an [`crate::pipeline::loader::ObjectStore`].
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// No object exists under the requested key.
    #[error("object not found")]
    NotFound,

    /// The object exists but could not be read (permissions, network, …).
    #[error("access error: {0}")]
    Access(String),
}

/// A non-fatal failure of an external collaborator.
///
/// Never returned as `Err` from the public API: the orchestrator falls
/// through to the next stage and records the message as a warning.
#[derive(Debug, Clone, PartialEq, Error, serde::Serialize, serde::Deserialize)]
pub enum DegradedError {
    /// OCR service failed or found no pages to read.
    #[error("OCR failed: {detail}")]
    OcrFailed { detail: String },

    /// The generative model returned an error.
    #[error("AI summarization failed: {detail}")]
    GenerationFailed { detail: String },

    /// The generative call did not finish inside the configured budget.
    #[error("AI summarization timed out after {ms}ms")]
    GenerationTimeout { ms: u64 },

    /// The generative model answered with an empty body.
    #[error("AI summarization returned an empty response")]
    EmptyResponse,

    /// The generative model answered, but the text scored as noise.
    #[error("AI summary rejected as low confidence (score {score:.2})")]
    LowConfidence { score: f64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_input_display() {
        let e = SummarizeError::InvalidInput {
            field: "type",
            reason: "is required".into(),
        };
        assert_eq!(e.to_string(), "Invalid request: type is required");
        assert!(e.is_validation());
    }

    #[test]
    fn content_unavailable_keeps_source() {
        let e = SummarizeError::ContentUnavailable {
            key: "uploads/a.pdf".into(),
            source: StorageError::NotFound,
        };
        let msg = e.to_string();
        assert!(msg.contains("uploads/a.pdf"), "got: {msg}");
        assert!(msg.contains("not found"), "got: {msg}");
        assert!(!e.is_validation());
        assert!(std::error::Error::source(&e).is_some());
    }

    #[test]
    fn empty_content_is_validation_class() {
        let e = SummarizeError::EmptyContent { label: "x".into() };
        assert!(e.is_validation());
    }

    #[test]
    fn timeout_display() {
        let e = DegradedError::GenerationTimeout { ms: 2000 };
        assert!(e.to_string().contains("2000ms"));
    }

    #[test]
    fn low_confidence_display() {
        let e = DegradedError::LowConfidence { score: 0.04 };
        assert!(e.to_string().contains("0.04"));
    }
}
