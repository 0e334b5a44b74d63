//! Configuration types for document summarisation.
//!
//! All pipeline behaviour is controlled through [`SummaryConfig`], built via
//! its [`SummaryConfigBuilder`]. The quality thresholds live in their own
//! [`QualityThresholds`] struct so they can be tuned without touching
//! extraction or sanitisation code.

use crate::error::SummarizeError;
use crate::request::SummaryStyle;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Hard cap on extracted and sanitised text, in characters.
pub const MAX_EXTRACTED_CHARS: usize = 12_000;

/// Marker appended to text cut down to the content budget.
pub const TRUNCATION_MARKER: &str = "\n\n[Content truncated for length]";

/// Configuration for a summarisation request.
///
/// # Example
/// ```rust
/// use edgequake_summarize::SummaryConfig;
///
/// let config = SummaryConfig::builder()
///     .content_budget_chars(10_000)
///     .generation_timeout_ms(1_500)
///     .model("gpt-4.1-nano")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct SummaryConfig {
    /// Cap applied by the PDF extractor and the sanitiser. Default: 12 000.
    pub max_extracted_chars: usize,

    /// Characters of sanitised text sent to the model. Range: 6 000–14 000.
    /// Default: 8 000.
    ///
    /// Longer text is cut and suffixed with [`TRUNCATION_MARKER`]. The
    /// extractive fallback always sees the untruncated text.
    pub content_budget_chars: usize,

    /// Decision points of the two quality gates.
    pub thresholds: QualityThresholds,

    /// Hard deadline for the generative call in milliseconds. Default: 2 000.
    ///
    /// The in-flight request is dropped (and its connection aborted) when the
    /// deadline passes, so the call never outlives the request.
    pub generation_timeout_ms: u64,

    /// Sampling temperature. Default: 0.3.
    pub temperature: f32,

    /// Override for the per-style output token limit. Default: None.
    pub max_tokens: Option<usize>,

    /// LLM model identifier, e.g. "gpt-4.1-nano".
    /// If None, uses provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Message layout used when talking to the provider. Default: Chat.
    pub provider_shape: ProviderShape,

    /// Run OCR when native extraction scores low. Default: true.
    pub ocr_enabled: bool,

    /// Call the generative model at all. Default: true.
    ///
    /// With `false` every readable request gets the extractive summary.
    pub ai_enabled: bool,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_extracted_chars: MAX_EXTRACTED_CHARS,
            content_budget_chars: 8_000,
            thresholds: QualityThresholds::default(),
            generation_timeout_ms: 2_000,
            temperature: 0.3,
            max_tokens: None,
            model: None,
            provider_name: None,
            provider: None,
            provider_shape: ProviderShape::default(),
            ocr_enabled: true,
            ai_enabled: true,
        }
    }
}

impl fmt::Debug for SummaryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SummaryConfig")
            .field("max_extracted_chars", &self.max_extracted_chars)
            .field("content_budget_chars", &self.content_budget_chars)
            .field("thresholds", &self.thresholds)
            .field("generation_timeout_ms", &self.generation_timeout_ms)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("provider_shape", &self.provider_shape)
            .field("ocr_enabled", &self.ocr_enabled)
            .field("ai_enabled", &self.ai_enabled)
            .finish()
    }
}

impl SummaryConfig {
    /// Create a new builder for `SummaryConfig`.
    pub fn builder() -> SummaryConfigBuilder {
        SummaryConfigBuilder {
            config: Self::default(),
        }
    }

    /// Output token limit for a style, honouring the global override.
    pub fn max_tokens_for(&self, style: SummaryStyle) -> usize {
        self.max_tokens.unwrap_or(match style {
            SummaryStyle::Brief => 150,
            SummaryStyle::Detailed => 500,
            SummaryStyle::Bullet => 300,
            SummaryStyle::Sentiment => 200,
            SummaryStyle::Technical => 400,
        })
    }
}

/// Builder for [`SummaryConfig`].
#[derive(Debug)]
pub struct SummaryConfigBuilder {
    config: SummaryConfig,
}

impl SummaryConfigBuilder {
    pub fn max_extracted_chars(mut self, n: usize) -> Self {
        self.config.max_extracted_chars = n.max(1);
        self
    }

    pub fn content_budget_chars(mut self, n: usize) -> Self {
        self.config.content_budget_chars = n.clamp(6_000, 14_000);
        self
    }

    pub fn thresholds(mut self, thresholds: QualityThresholds) -> Self {
        self.config.thresholds = thresholds;
        self
    }

    pub fn generation_timeout_ms(mut self, ms: u64) -> Self {
        self.config.generation_timeout_ms = ms;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn provider_shape(mut self, shape: ProviderShape) -> Self {
        self.config.provider_shape = shape;
        self
    }

    pub fn ocr_enabled(mut self, v: bool) -> Self {
        self.config.ocr_enabled = v;
        self
    }

    pub fn ai_enabled(mut self, v: bool) -> Self {
        self.config.ai_enabled = v;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<SummaryConfig, SummarizeError> {
        let c = &self.config;
        c.thresholds.validate()?;
        if c.generation_timeout_ms == 0 {
            return Err(SummarizeError::InvalidConfig(
                "Generation timeout must be > 0ms".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Thresholds ───────────────────────────────────────────────────────────

/// Decision points for the two quality checkpoints.
///
/// The values are policy, but their direction is fixed: raising a threshold
/// can only make OCR / the unreadable verdict more likely, never less.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    /// OCR runs when the native extraction scores below this. Default: 0.25.
    pub ocr_min_score: f64,
    /// OCR also runs when native extraction is shorter than this. Default: 200.
    pub ocr_min_chars: usize,
    /// Sanitised text scoring below this is unreadable. Default: 0.10.
    pub readable_min_score: f64,
    /// Sanitised text with fewer tokens is unreadable. Default: 10.
    pub readable_min_tokens: usize,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            ocr_min_score: 0.25,
            ocr_min_chars: 200,
            readable_min_score: 0.10,
            readable_min_tokens: 10,
        }
    }
}

impl QualityThresholds {
    fn validate(&self) -> Result<(), SummarizeError> {
        for (name, v) in [
            ("ocr_min_score", self.ocr_min_score),
            ("readable_min_score", self.readable_min_score),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(SummarizeError::InvalidConfig(format!(
                    "{name} must be within 0–1, got {v}"
                )));
            }
        }
        if self.readable_min_score > self.ocr_min_score {
            return Err(SummarizeError::InvalidConfig(format!(
                "readable_min_score ({}) must not exceed ocr_min_score ({})",
                self.readable_min_score, self.ocr_min_score
            )));
        }
        Ok(())
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// How prompts are laid out for the generative provider.
///
/// Both shapes carry the same instructions; only the message framing differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderShape {
    /// System message with the style instructions + user message with the text. (default)
    #[default]
    Chat,
    /// One plain prompt string with instructions and text inlined.
    Completion,
}

impl std::str::FromStr for ProviderShape {
    type Err = SummarizeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chat" => Ok(ProviderShape::Chat),
            "completion" | "complete" => Ok(ProviderShape::Completion),
            other => Err(SummarizeError::InvalidConfig(format!(
                "Unknown provider shape '{other}' (expected chat or completion)"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_build() {
        let c = SummaryConfig::builder().build().unwrap();
        assert_eq!(c.max_extracted_chars, 12_000);
        assert_eq!(c.content_budget_chars, 8_000);
        assert_eq!(c.generation_timeout_ms, 2_000);
        assert_eq!(c.thresholds.ocr_min_chars, 200);
    }

    #[test]
    fn budget_is_clamped() {
        let c = SummaryConfig::builder()
            .content_budget_chars(100)
            .build()
            .unwrap();
        assert_eq!(c.content_budget_chars, 6_000);
        let c = SummaryConfig::builder()
            .content_budget_chars(50_000)
            .build()
            .unwrap();
        assert_eq!(c.content_budget_chars, 14_000);
    }

    #[test]
    fn inverted_thresholds_rejected() {
        let t = QualityThresholds {
            readable_min_score: 0.5,
            ..QualityThresholds::default()
        };
        let err = SummaryConfig::builder().thresholds(t).build().unwrap_err();
        assert!(err.to_string().contains("readable_min_score"));
    }

    #[test]
    fn out_of_range_threshold_rejected() {
        let t = QualityThresholds {
            ocr_min_score: 1.5,
            ..QualityThresholds::default()
        };
        assert!(SummaryConfig::builder().thresholds(t).build().is_err());
    }

    #[test]
    fn zero_timeout_rejected() {
        assert!(SummaryConfig::builder()
            .generation_timeout_ms(0)
            .build()
            .is_err());
    }

    #[test]
    fn per_style_tokens_and_override() {
        let c = SummaryConfig::default();
        assert_eq!(c.max_tokens_for(SummaryStyle::Brief), 150);
        assert_eq!(c.max_tokens_for(SummaryStyle::Detailed), 500);
        let c = SummaryConfig::builder().max_tokens(64).build().unwrap();
        assert_eq!(c.max_tokens_for(SummaryStyle::Technical), 64);
    }

    #[test]
    fn provider_shape_parse() {
        assert_eq!("chat".parse::<ProviderShape>().unwrap(), ProviderShape::Chat);
        assert_eq!(
            "Completion".parse::<ProviderShape>().unwrap(),
            ProviderShape::Completion
        );
        assert!("rpc".parse::<ProviderShape>().is_err());
    }
}
