//! Request types: the JSON wire shape and its validated form.
//!
//! [`WireRequest`] mirrors what an HTTP front-end receives
//! (`{ type, content, fileKey?, summaryType? }`) with every field optional,
//! so a malformed body still deserialises and [`WireRequest::validate`] can
//! name the missing field instead of returning a serde error.

use crate::error::SummarizeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// What the caller wants summarised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    /// Free text typed by the user.
    Note,
    /// An uploaded file held by the storage collaborator.
    File,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Note => "note",
            DocumentKind::File => "file",
        }
    }
}

/// The input unit of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Document {
    /// Note text, carried inline.
    Note { text: String },
    /// Storage reference resolved to bytes by an `ObjectStore`.
    File { key: String },
}

impl Document {
    pub fn kind(&self) -> DocumentKind {
        match self {
            Document::Note { .. } => DocumentKind::Note,
            Document::File { .. } => DocumentKind::File,
        }
    }

    /// Short human label for logs and error messages.
    pub fn label(&self) -> &str {
        match self {
            Document::Note { .. } => "note",
            Document::File { key } => key,
        }
    }
}

/// Tone/format of the requested summary. Selects the prompt template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryStyle {
    /// Two or three sentences. (default)
    #[default]
    Brief,
    /// Several paragraphs covering every main point.
    Detailed,
    /// Key points as a bulleted list.
    Bullet,
    /// Overall tone and emotional content.
    Sentiment,
    /// Technical concepts, methods and terminology.
    Technical,
}

impl SummaryStyle {
    pub const ALL: [SummaryStyle; 5] = [
        SummaryStyle::Brief,
        SummaryStyle::Detailed,
        SummaryStyle::Bullet,
        SummaryStyle::Sentiment,
        SummaryStyle::Technical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SummaryStyle::Brief => "brief",
            SummaryStyle::Detailed => "detailed",
            SummaryStyle::Bullet => "bullet",
            SummaryStyle::Sentiment => "sentiment",
            SummaryStyle::Technical => "technical",
        }
    }

    /// Parse a style name; anything unrecognised becomes [`SummaryStyle::Brief`].
    pub fn parse_lenient(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl FromStr for SummaryStyle {
    type Err = SummarizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SummaryStyle::ALL
            .into_iter()
            .find(|style| style.as_str() == wanted)
            .ok_or_else(|| SummarizeError::InvalidInput {
                field: "summaryType",
                reason: format!("unknown style '{s}'"),
            })
    }
}

impl fmt::Display for SummaryStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated summarisation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRequest {
    pub document: Document,
    pub style: SummaryStyle,
}

impl SummaryRequest {
    pub fn note(text: impl Into<String>, style: SummaryStyle) -> Self {
        Self {
            document: Document::Note { text: text.into() },
            style,
        }
    }

    pub fn file(key: impl Into<String>, style: SummaryStyle) -> Self {
        Self {
            document: Document::File { key: key.into() },
            style,
        }
    }
}

/// The request body as received over the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireRequest {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub content: Option<String>,
    pub file_key: Option<String>,
    pub summary_type: Option<String>,
}

impl WireRequest {
    /// Check field presence and turn the wire body into a [`SummaryRequest`].
    ///
    /// A `file` needs `fileKey`, or failing that a non-empty `content` which
    /// is then used as the key. A `note` needs non-blank `content`.
    pub fn validate(self) -> Result<SummaryRequest, SummarizeError> {
        let kind = non_blank(self.kind.as_deref()).ok_or_else(|| SummarizeError::InvalidInput {
            field: "type",
            reason: "is required".into(),
        })?;

        let style = self
            .summary_type
            .as_deref()
            .map(SummaryStyle::parse_lenient)
            .unwrap_or_default();

        let document = match kind.to_ascii_lowercase().as_str() {
            "note" => {
                let text = non_blank(self.content.as_deref()).ok_or_else(|| {
                    SummarizeError::InvalidInput {
                        field: "content",
                        reason: "is required for notes".into(),
                    }
                })?;
                Document::Note {
                    text: text.to_string(),
                }
            }
            "file" => {
                let key = non_blank(self.file_key.as_deref())
                    .or_else(|| non_blank(self.content.as_deref()))
                    .ok_or_else(|| SummarizeError::InvalidInput {
                        field: "fileKey",
                        reason: "is required for files".into(),
                    })?;
                Document::File {
                    key: key.to_string(),
                }
            }
            other => {
                return Err(SummarizeError::InvalidInput {
                    field: "type",
                    reason: format!("must be 'note' or 'file', got '{other}'"),
                })
            }
        };

        Ok(SummaryRequest { document, style })
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}
