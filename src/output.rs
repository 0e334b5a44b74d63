//! Result types returned by the summarisation pipeline.

use crate::request::{DocumentKind, SummaryStyle};
use serde::{Deserialize, Serialize};

/// Who wrote the summary text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummarySource {
    /// Generated by the LLM.
    Ai,
    /// Extractive sentence selection, or the "not readable" notice.
    Fallback,
}

/// The outcome of one summarisation request.
///
/// Serialises to the wire shape
/// `{ summary, source, originalLength, type, summaryType, model?, warning? }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResult {
    #[serde(rename = "summary")]
    pub summary_text: String,
    pub source: SummarySource,
    /// Character count of the extracted text the pipeline worked from.
    pub original_length: usize,
    #[serde(rename = "type")]
    pub kind: DocumentKind,
    #[serde(rename = "summaryType")]
    pub style: SummaryStyle,
    /// Model identifier, only for `source == Ai`.
    #[serde(rename = "model", skip_serializing_if = "Option::is_none", default)]
    pub model_identifier: Option<String>,
    /// Human-readable notes on degraded stages (OCR failed, AI timed out, …).
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub warning: Option<String>,
}

impl SummaryResult {
    pub fn is_ai(&self) -> bool {
        self.source == SummarySource::Ai
    }

    /// Serialise to the JSON wire shape.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
