//! Summarisation entry points and the request state machine.
//!
//! A request moves through explicit [`Stage`]s:
//!
//! ```text
//! Preparing ─▶ Extracting ─▶ Gating ─┬─▶ Truncating ─▶ Summarizing ─┬─▶ Succeeded (ai)
//!                                    │                              └─▶ FallingBack ─▶ Succeeded (fallback)
//!                                    └─▶ Succeeded (not readable)
//! ```
//!
//! Only `Preparing` (bad request) and `Extracting` (storage failure, nothing
//! extractable) can end in `Err`. Every later stage is infallible, and a
//! panic in any stage is caught at [`Summarizer::run`] and turned into the
//! best fallback summary available from the text produced so far.

use crate::config::{SummaryConfig, MAX_EXTRACTED_CHARS, TRUNCATION_MARKER};
use crate::error::{DegradedError, SummarizeError};
use crate::output::{SummaryResult, SummarySource};
use crate::pipeline::fallback::{extractive_summary, APOLOGY};
use crate::pipeline::llm::{generate_with_timeout, GenerationParams, LlmGenerator, TextGenerator};
use crate::pipeline::loader::{self, ContainerKind, ObjectStore};
use crate::pipeline::ocr::{self, OcrService, VisionOcr};
use crate::pipeline::pdf::extract_pdf_text;
use crate::pipeline::quality::{self, needs_ocr, is_unreadable};
use crate::pipeline::sanitize::{cap_chars, sanitize};
use crate::prompts::NOT_READABLE;
use crate::request::{Document, DocumentKind, SummaryRequest, SummaryStyle, WireRequest};
use edgequake_llm::{LLMProvider, ProviderFactory};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default model when a provider is named without one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// The summarisation service: configuration plus its three collaborators.
///
/// Holds no per-request state; one instance can serve concurrent requests.
#[derive(Clone)]
pub struct Summarizer {
    config: SummaryConfig,
    store: Option<Arc<dyn ObjectStore>>,
    generator: Option<Arc<dyn TextGenerator>>,
    ocr: Option<Arc<dyn OcrService>>,
}

impl std::fmt::Debug for Summarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Summarizer")
            .field("config", &self.config)
            .field("store", &self.store.as_ref().map(|_| "<dyn ObjectStore>"))
            .field("generator", &self.generator.as_ref().map(|g| g.model_id()))
            .field("ocr", &self.ocr.as_ref().map(|_| "<dyn OcrService>"))
            .finish()
    }
}

impl Summarizer {
    /// A summariser with no collaborators: notes only, extractive summaries.
    pub fn new(config: SummaryConfig) -> Self {
        Self {
            config,
            store: None,
            generator: None,
            ocr: None,
        }
    }

    /// Build a summariser whose generator and OCR share the resolved LLM
    /// provider. With `ai_enabled = false` no provider is resolved.
    pub fn from_config(config: SummaryConfig) -> Result<Self, SummarizeError> {
        if !config.ai_enabled {
            return Ok(Self::new(config));
        }
        let provider = resolve_provider(&config)?;
        let mut generator = LlmGenerator::new(Arc::clone(&provider), config.provider_shape);
        if let Some(ref model) = config.model {
            generator = generator.with_model(model.clone());
        }
        let ocr_enabled = config.ocr_enabled;
        let mut summarizer = Self::new(config).with_generator(Arc::new(generator));
        if ocr_enabled {
            summarizer = summarizer.with_ocr(Arc::new(VisionOcr::new(provider)));
        }
        Ok(summarizer)
    }

    pub fn with_store(mut self, store: Arc<dyn ObjectStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_ocr(mut self, ocr: Arc<dyn OcrService>) -> Self {
        self.ocr = Some(ocr);
        self
    }

    pub fn config(&self) -> &SummaryConfig {
        &self.config
    }

    /// Summarise a raw wire request, validating it first.
    pub async fn summarize_wire(&self, request: WireRequest) -> Result<SummaryResult, SummarizeError> {
        self.run(Stage::Preparing(request)).await
    }

    /// Summarise an already validated request.
    ///
    /// # Errors
    /// Only before any text exists:
    /// - [`SummarizeError::ContentUnavailable`] when storage cannot supply the file
    /// - [`SummarizeError::EmptyContent`] when extraction yields nothing
    pub async fn summarize(&self, request: SummaryRequest) -> Result<SummaryResult, SummarizeError> {
        self.run(Stage::Extracting(request)).await
    }

    /// Drive the state machine to a terminal stage.
    async fn run(&self, mut stage: Stage) -> Result<SummaryResult, SummarizeError> {
        let start = Instant::now();
        let mut recovery = Recovery::default();

        loop {
            if let Stage::Succeeded(result) = stage {
                info!(
                    "Summary ready: source={:?}, {} chars, {}ms",
                    result.source,
                    result.summary_text.len(),
                    start.elapsed().as_millis()
                );
                return Ok(result);
            }

            recovery.observe(&stage);
            let name = stage.name();
            debug!("Stage: {}", name);

            stage = match AssertUnwindSafe(self.step(stage)).catch_unwind().await {
                Ok(Ok(next)) => next,
                Ok(Err(e)) => return Err(e),
                Err(panic) => {
                    let msg = panic_message(&*panic);
                    warn!("Stage {} panicked: {}; degrading to fallback", name, msg);
                    Stage::Succeeded(std::mem::take(&mut recovery).into_result(&msg))
                }
            };
        }
    }

    /// One transition.
    async fn step(&self, stage: Stage) -> Result<Stage, SummarizeError> {
        match stage {
            Stage::Preparing(wire) => Ok(Stage::Extracting(wire.validate()?)),
            Stage::Extracting(request) => self.extract(request).await.map(Stage::Gating),
            Stage::Gating(draft) => Ok(self.gate(draft)),
            Stage::Truncating(draft) => Ok(self.truncate(draft)),
            Stage::Summarizing { draft, prompt_text } => {
                Ok(self.generate(draft, &prompt_text).await)
            }
            Stage::FallingBack { draft, reason } => Ok(Stage::Succeeded(fall_back(draft, reason))),
            Stage::Succeeded(result) => Ok(Stage::Succeeded(result)),
        }
    }

    // ── Extracting ───────────────────────────────────────────────────────

    async fn extract(&self, request: SummaryRequest) -> Result<Draft, SummarizeError> {
        let SummaryRequest { document, style } = request;
        let cap = self.config.max_extracted_chars;
        let loaded = loader::load(&document, self.store.as_deref()).await?;
        let mut warnings = Vec::new();

        let mut text = match (&document, loaded.container) {
            (Document::Note { text }, _) => text.clone(),
            (Document::File { .. }, ContainerKind::Pdf) => extract_pdf_text(&loaded.bytes, cap).text,
            (Document::File { .. }, ContainerKind::Opaque) => {
                cap_chars(&String::from_utf8_lossy(&loaded.bytes), cap)
            }
        };

        if text.trim().is_empty() {
            return Err(SummarizeError::EmptyContent {
                label: document.label().to_string(),
            });
        }

        if let Document::File { .. } = document {
            text = self.maybe_ocr(text, &loaded.bytes, &mut warnings).await;
        }

        let sanitized = sanitize(&text, cap);
        info!(
            "Extracted {} chars, sanitised to {} chars",
            text.chars().count(),
            sanitized.len()
        );

        Ok(Draft {
            kind: document.kind(),
            style,
            original_length: text.chars().count(),
            sanitized,
            warnings,
        })
    }

    /// Replace `native` with OCR output when native extraction is poor and
    /// OCR does better. OCR failures leave `native` in place.
    async fn maybe_ocr(&self, native: String, bytes: &[u8], warnings: &mut Vec<String>) -> String {
        let t = &self.config.thresholds;
        let native_score = quality::score(&native);
        let native_len = native.chars().count();
        if !needs_ocr(&native_score, native_len, t) {
            return native;
        }

        let service = match (&self.ocr, self.config.ocr_enabled) {
            (Some(service), true) => service,
            _ => {
                debug!("OCR warranted (score {:.2}) but not available", native_score.composite);
                return native;
            }
        };

        info!(
            "Native extraction weak (score {:.2}, {} chars); running OCR",
            native_score.composite, native_len
        );
        match ocr::recognize(service.as_ref(), bytes).await {
            Ok(ocr_text) => {
                let ocr_score = quality::score(&ocr_text);
                if ocr_score.composite >= t.ocr_min_score
                    && ocr_score.composite >= native_score.composite
                {
                    info!("Using OCR text (score {:.2})", ocr_score.composite);
                    cap_chars(&ocr_text, self.config.max_extracted_chars)
                } else {
                    debug!(
                        "OCR text not better (score {:.2}); keeping native extraction",
                        ocr_score.composite
                    );
                    native
                }
            }
            Err(e) => {
                warn!("OCR failed, keeping native extraction: {}", e);
                warnings.push(e.to_string());
                native
            }
        }
    }

    // ── Gating ───────────────────────────────────────────────────────────

    fn gate(&self, draft: Draft) -> Stage {
        let score = quality::score(&draft.sanitized);
        debug!(
            "Sanitised quality: {:.2} (letters {:.2}, vowels {:.2}, words {:.2})",
            score.composite, score.letters_ratio, score.vowel_ratio, score.word_score
        );

        // Short notes are normal; notes skip only the token-count check.
        let t = &self.config.thresholds;
        let unreadable = match draft.kind {
            DocumentKind::File => is_unreadable(&score, &draft.sanitized, t),
            DocumentKind::Note => {
                draft.sanitized.is_empty() || score.composite < t.readable_min_score
            }
        };

        if unreadable {
            info!("Content not readable (score {:.2}); skipping AI", score.composite);
            let reason = format!("content quality score {:.2} is too low", score.composite);
            return Stage::Succeeded(unreadable_result(draft, &reason));
        }
        Stage::Truncating(draft)
    }

    // ── Truncating ───────────────────────────────────────────────────────

    fn truncate(&self, mut draft: Draft) -> Stage {
        let budget = self.config.content_budget_chars;
        let prompt_text = if draft.sanitized.chars().count() > budget {
            info!("Truncating content to {} chars for the model", budget);
            draft
                .warnings
                .push(format!("content truncated to {budget} characters for AI summarization"));
            format!("{}{}", cap_chars(&draft.sanitized, budget), TRUNCATION_MARKER)
        } else {
            draft.sanitized.clone()
        };
        Stage::Summarizing { draft, prompt_text }
    }

    // ── Summarizing ──────────────────────────────────────────────────────

    async fn generate(&self, draft: Draft, prompt_text: &str) -> Stage {
        let generator = match (&self.generator, self.config.ai_enabled) {
            (Some(g), true) => g,
            (None, true) => {
                return Stage::FallingBack {
                    draft,
                    reason: Some(DegradedError::GenerationFailed {
                        detail: "no LLM provider configured".into(),
                    }),
                }
            }
            (_, false) => return Stage::FallingBack { draft, reason: None },
        };

        let params = GenerationParams {
            max_tokens: self.config.max_tokens_for(draft.style),
            temperature: self.config.temperature,
        };
        let outcome = generate_with_timeout(
            generator.as_ref(),
            prompt_text,
            draft.style,
            &params,
            self.config.generation_timeout_ms,
        )
        .await;

        match outcome {
            Ok(summary) => {
                let score = quality::score(&summary);
                if score.composite < self.config.thresholds.readable_min_score {
                    warn!("AI summary scored {:.2}; using fallback", score.composite);
                    return Stage::FallingBack {
                        draft,
                        reason: Some(DegradedError::LowConfidence {
                            score: score.composite,
                        }),
                    };
                }
                let model = generator.model_id();
                Stage::Succeeded(draft.finish(summary, SummarySource::Ai, Some(model)))
            }
            Err(reason) => Stage::FallingBack {
                draft,
                reason: Some(reason),
            },
        }
    }
}

// ── States ───────────────────────────────────────────────────────────────────

/// Request-scoped working state carried between stages.
#[derive(Debug, Clone)]
struct Draft {
    kind: DocumentKind,
    style: SummaryStyle,
    original_length: usize,
    /// Untruncated sanitised text; the fallback always works from this.
    sanitized: String,
    warnings: Vec<String>,
}

impl Draft {
    fn finish(self, summary: String, source: SummarySource, model: Option<String>) -> SummaryResult {
        SummaryResult {
            summary_text: summary,
            source,
            original_length: self.original_length,
            kind: self.kind,
            style: self.style,
            model_identifier: model,
            warning: join_warnings(&self.warnings),
        }
    }
}

/// Explicit states of one summarisation request.
#[derive(Debug)]
enum Stage {
    Preparing(WireRequest),
    Extracting(SummaryRequest),
    Gating(Draft),
    Truncating(Draft),
    Summarizing { draft: Draft, prompt_text: String },
    FallingBack {
        draft: Draft,
        reason: Option<DegradedError>,
    },
    Succeeded(SummaryResult),
}

impl Stage {
    fn name(&self) -> &'static str {
        match self {
            Stage::Preparing(_) => "preparing",
            Stage::Extracting(_) => "extracting",
            Stage::Gating(_) => "gating",
            Stage::Truncating(_) => "truncating",
            Stage::Summarizing { .. } => "summarizing",
            Stage::FallingBack { .. } => "falling-back",
            Stage::Succeeded(_) => "succeeded",
        }
    }
}

fn fall_back(mut draft: Draft, reason: Option<DegradedError>) -> SummaryResult {
    if let Some(reason) = reason {
        info!("Falling back to extractive summary: {}", reason);
        draft.warnings.push(reason.to_string());
    }
    let summary = extractive_summary(&draft.sanitized);
    draft.finish(summary, SummarySource::Fallback, None)
}

fn unreadable_result(mut draft: Draft, reason: &str) -> SummaryResult {
    draft.warnings.push(reason.to_string());
    let summary = format!(
        "{NOT_READABLE}. The document does not contain enough readable text to summarize."
    );
    draft.finish(summary, SummarySource::Fallback, None)
}

fn join_warnings(warnings: &[String]) -> Option<String> {
    if warnings.is_empty() {
        None
    } else {
        Some(warnings.join("; "))
    }
}

// ── Panic recovery ───────────────────────────────────────────────────────────

/// What the run loop knows so far, for building a result after a panic.
#[derive(Default)]
struct Recovery {
    kind: Option<DocumentKind>,
    style: SummaryStyle,
    /// Note text, known before extraction runs.
    note: Option<String>,
    draft: Option<Draft>,
}

impl Recovery {
    fn observe(&mut self, stage: &Stage) {
        match stage {
            Stage::Extracting(req) => {
                self.kind = Some(req.document.kind());
                self.style = req.style;
                if let Document::Note { text } = &req.document {
                    self.note = Some(text.clone());
                }
            }
            Stage::Gating(d) | Stage::Truncating(d) => self.draft = Some(d.clone()),
            Stage::Summarizing { draft, .. } | Stage::FallingBack { draft, .. } => {
                self.draft = Some(draft.clone())
            }
            Stage::Preparing(_) | Stage::Succeeded(_) => {}
        }
    }

    fn into_result(self, panic_msg: &str) -> SummaryResult {
        let warning = format!("internal error: {panic_msg}");
        match (self.draft, self.note) {
            (Some(mut draft), _) => {
                draft.warnings.push(warning);
                let summary = extractive_summary(&draft.sanitized);
                draft.finish(summary, SummarySource::Fallback, None)
            }
            (None, Some(note)) => SummaryResult {
                summary_text: extractive_summary(&sanitize(&note, MAX_EXTRACTED_CHARS)),
                source: SummarySource::Fallback,
                original_length: note.chars().count(),
                kind: DocumentKind::Note,
                style: self.style,
                model_identifier: None,
                warning: Some(warning),
            },
            (None, None) => SummaryResult {
                summary_text: APOLOGY.to_string(),
                source: SummarySource::Fallback,
                original_length: 0,
                kind: self.kind.unwrap_or(DocumentKind::Note),
                style: self.style,
                model_identifier: None,
                warning: Some(warning),
            },
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ── Provider resolution ──────────────────────────────────────────────────────

/// Instantiate a named provider with the given model.
fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, SummarizeError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        SummarizeError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific:
///
/// 1. **Pre-built provider** (`config.provider`) used as-is.
/// 2. **Named provider + model** (`config.provider_name`).
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
/// 4. **OpenAI** when `OPENAI_API_KEY` is set.
/// 5. **Full auto-detection** via `ProviderFactory::from_env`.
pub fn resolve_provider(config: &SummaryConfig) -> Result<Arc<dyn LLMProvider>, SummarizeError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !model.is_empty() {
            return create_provider(&prov, &model);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| SummarizeError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

/// Synchronous wrapper around [`Summarizer::summarize`].
///
/// Creates a temporary tokio runtime internally.
pub fn summarize_sync(
    summarizer: &Summarizer,
    request: SummaryRequest,
) -> Result<SummaryResult, SummarizeError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SummarizeError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(summarizer.summarize(request))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(text: &str, kind: DocumentKind) -> Draft {
        Draft {
            kind,
            style: SummaryStyle::Brief,
            original_length: text.len(),
            sanitized: text.to_string(),
            warnings: Vec::new(),
        }
    }

    #[test]
    fn gate_sends_noise_files_to_unreadable() {
        let s = Summarizer::new(SummaryConfig::default());
        match s.gate(draft("just four short words", DocumentKind::File)) {
            Stage::Succeeded(r) => {
                assert_eq!(r.source, SummarySource::Fallback);
                assert!(r.summary_text.starts_with(NOT_READABLE));
            }
            other => panic!("expected unreadable result, got {}", other.name()),
        }
    }

    #[test]
    fn gate_lets_short_notes_through() {
        let s = Summarizer::new(SummaryConfig::default());
        let next = s.gate(draft("Buy milk. Call Alice.", DocumentKind::Note));
        assert_eq!(next.name(), "truncating");
    }

    #[test]
    fn truncation_keeps_original_for_fallback() {
        let s = Summarizer::new(SummaryConfig::default());
        let long = "lorem ipsum ".repeat(1_000);
        match s.truncate(draft(&long, DocumentKind::File)) {
            Stage::Summarizing { draft, prompt_text } => {
                assert!(prompt_text.ends_with(TRUNCATION_MARKER));
                assert_eq!(
                    prompt_text.chars().count(),
                    8_000 + TRUNCATION_MARKER.chars().count()
                );
                assert_eq!(draft.sanitized, long);
                assert!(draft.warnings[0].contains("truncated"));
            }
            other => panic!("unexpected stage {}", other.name()),
        }
    }

    #[test]
    fn short_text_not_truncated() {
        let s = Summarizer::new(SummaryConfig::default());
        match s.truncate(draft("short text", DocumentKind::Note)) {
            Stage::Summarizing { draft, prompt_text } => {
                assert_eq!(prompt_text, "short text");
                assert!(draft.warnings.is_empty());
            }
            other => panic!("unexpected stage {}", other.name()),
        }
    }

    #[test]
    fn recovery_without_text_apologises() {
        let mut r = Recovery::default();
        r.observe(&Stage::Extracting(SummaryRequest::file("k", SummaryStyle::Bullet)));
        let result = r.into_result("boom");
        assert_eq!(result.summary_text, APOLOGY);
        assert_eq!(result.kind, DocumentKind::File);
        assert_eq!(result.style, SummaryStyle::Bullet);
        assert!(result.warning.unwrap().contains("boom"));
    }

    #[test]
    fn recovery_before_draft_uses_note_text() {
        let note = "Buy milk. Call Alice. Finish report.";
        let mut r = Recovery::default();
        r.observe(&Stage::Extracting(SummaryRequest::note(note, SummaryStyle::Brief)));
        let result = r.into_result("boom");
        assert_eq!(result.summary_text, note);
        assert_eq!(result.kind, DocumentKind::Note);
        assert_eq!(result.original_length, note.chars().count());
        assert!(result.warning.unwrap().contains("boom"));
    }

    #[test]
    fn gate_rejects_low_scoring_notes() {
        let s = Summarizer::new(SummaryConfig::default());
        match s.gate(draft("b1111 c2222", DocumentKind::Note)) {
            Stage::Succeeded(r) => assert!(r.summary_text.starts_with(NOT_READABLE)),
            other => panic!("expected unreadable result, got {}", other.name()),
        }
    }

    #[test]
    fn warnings_join() {
        assert_eq!(join_warnings(&[]), None);
        assert_eq!(
            join_warnings(&["a".into(), "b".into()]).as_deref(),
            Some("a; b")
        );
    }
}
