//! Generative summarisation: one capability, two provider shapes.
//!
//! The orchestrator only knows [`TextGenerator`]: "summarise this text in
//! this style". [`LlmGenerator`] implements it over an `edgequake-llm`
//! provider, framing the prompt as chat messages or as a single completion
//! string depending on [`ProviderShape`]. All prompt wording lives in
//! [`crate::prompts`].
//!
//! ## Deadline
//!
//! [`generate_with_timeout`] wraps the call in `tokio::time::timeout`. When
//! the deadline passes the generation future is dropped, which drops the
//! underlying HTTP request and closes its connection. Nothing is retried:
//! a failed or late call falls through to the extractive summary.

use crate::config::ProviderShape;
use crate::error::DegradedError;
use crate::prompts::{chat_prompt, completion_prompt};
use crate::request::SummaryStyle;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

/// Sampling parameters for one generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_tokens: usize,
    pub temperature: f32,
}

/// Something that can write a summary of `text` in a given style.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Identifier of the model behind this generator, reported in results.
    fn model_id(&self) -> String;

    /// Produce the summary text. Errors are non-fatal by construction.
    async fn generate(
        &self,
        text: &str,
        style: SummaryStyle,
        params: &GenerationParams,
    ) -> Result<String, DegradedError>;
}

/// [`TextGenerator`] backed by an `edgequake-llm` provider.
pub struct LlmGenerator {
    provider: Arc<dyn LLMProvider>,
    shape: ProviderShape,
    model: Option<String>,
}

impl LlmGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, shape: ProviderShape) -> Self {
        Self {
            provider,
            shape,
            model: None,
        }
    }

    /// Report `model` instead of the provider's own model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

#[async_trait]
impl TextGenerator for LlmGenerator {
    fn model_id(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| self.provider.model().to_string())
    }

    async fn generate(
        &self,
        text: &str,
        style: SummaryStyle,
        params: &GenerationParams,
    ) -> Result<String, DegradedError> {
        let options = build_options(params);

        let response = match self.shape {
            ProviderShape::Chat => {
                let (system, user) = chat_prompt(style, text);
                let messages = vec![ChatMessage::system(&system), ChatMessage::user(&user)];
                self.provider.chat(&messages, Some(&options)).await
            }
            ProviderShape::Completion => {
                let prompt = completion_prompt(style, text);
                self.provider.complete_with_options(&prompt, &options).await
            }
        }
        .map_err(|e| DegradedError::GenerationFailed {
            detail: format!("{}", e),
        })?;

        debug!(
            "Summary generated: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );
        Ok(response.content)
    }
}

/// Build `CompletionOptions` from generation parameters.
fn build_options(params: &GenerationParams) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(params.temperature),
        max_tokens: Some(params.max_tokens),
        ..Default::default()
    }
}

/// Run one generation under a hard deadline.
///
/// Returns the trimmed response, or the reason it is unusable:
/// provider error, timeout, or an empty body.
pub async fn generate_with_timeout(
    generator: &dyn TextGenerator,
    text: &str,
    style: SummaryStyle,
    params: &GenerationParams,
    timeout_ms: u64,
) -> Result<String, DegradedError> {
    let start = Instant::now();
    let outcome = timeout(
        Duration::from_millis(timeout_ms),
        generator.generate(text, style, params),
    )
    .await;

    match outcome {
        Err(_) => {
            warn!("Summary generation timed out after {}ms", timeout_ms);
            Err(DegradedError::GenerationTimeout { ms: timeout_ms })
        }
        Ok(Err(e)) => {
            warn!("Summary generation failed: {}", e);
            Err(e)
        }
        Ok(Ok(body)) => {
            let body = body.trim();
            if body.is_empty() {
                warn!("Summary generation returned an empty body");
                return Err(DegradedError::EmptyResponse);
            }
            debug!("Summary generation finished in {:?}", start.elapsed());
            Ok(body.to_string())
        }
    }
}
