//! OCR fallback for documents whose native extraction scored low.
//!
//! [`OcrService`] is the boundary to the recognition engine. The pipeline
//! calls it at most once per request through [`recognize`], which flattens
//! the recognised lines into one string. A failure is never fatal: the
//! caller keeps the pre-OCR text and records the error as a warning.
//!
//! [`VisionOcr`] is the bundled implementation. It sends page images to a
//! vision-capable LLM. Page images come from raster uploads (PNG/JPEG) or,
//! for scanned PDFs, from the `DCTDecode` JPEG streams each page embeds.

use crate::error::DegradedError;
use crate::pipeline::pdf::embedded_jpegs;
use crate::prompts::OCR_SYSTEM_PROMPT;
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use image::DynamicImage;
use std::io::Cursor;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Text recognition over raw document bytes.
#[async_trait]
pub trait OcrService: Send + Sync {
    /// Recognised text lines in reading order.
    async fn detect_text(&self, bytes: &[u8]) -> Result<Vec<String>, DegradedError>;
}

/// Run OCR and join the recognised lines, each trimmed, with single spaces.
pub async fn recognize(service: &dyn OcrService, bytes: &[u8]) -> Result<String, DegradedError> {
    let lines = service.detect_text(bytes).await?;
    let text = lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    info!("OCR recognised {} lines, {} chars", lines.len(), text.len());
    Ok(text)
}

// ── Vision-LLM implementation ────────────────────────────────────────────────

/// [`OcrService`] that reads page images with a vision LLM.
pub struct VisionOcr {
    provider: Arc<dyn LLMProvider>,
    max_pages: usize,
    max_image_pixels: u32,
    max_tokens: usize,
}

impl VisionOcr {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            max_pages: 5,
            max_image_pixels: 2000,
            max_tokens: 2048,
        }
    }

    /// Only the first `n` page images are sent. Default: 5.
    pub fn max_pages(mut self, n: usize) -> Self {
        self.max_pages = n.max(1);
        self
    }

    /// Longest edge of an image sent to the model. Default: 2000 px.
    pub fn max_image_pixels(mut self, px: u32) -> Self {
        self.max_image_pixels = px.max(100);
        self
    }
}

#[async_trait]
impl OcrService for VisionOcr {
    async fn detect_text(&self, bytes: &[u8]) -> Result<Vec<String>, DegradedError> {
        let sources = page_images(bytes);
        if sources.is_empty() {
            return Err(DegradedError::OcrFailed {
                detail: "no page images found".into(),
            });
        }
        let total = sources.len();
        let sources: Vec<Vec<u8>> = sources
            .into_iter()
            .take(self.max_pages)
            .map(<[u8]>::to_vec)
            .collect();
        if total > sources.len() {
            warn!("OCR limited to {} of {} page images", sources.len(), total);
        }

        let options = CompletionOptions {
            temperature: Some(0.0),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        let mut lines = Vec::new();
        for (idx, raw) in sources.into_iter().enumerate() {
            let max_px = self.max_image_pixels;
            let image = tokio::task::spawn_blocking(move || encode_page_image(&raw, max_px))
                .await
                .map_err(|e| DegradedError::OcrFailed {
                    detail: format!("encode task panicked: {e}"),
                })??;

            let messages = vec![
                ChatMessage::system(OCR_SYSTEM_PROMPT),
                ChatMessage::user_with_images("", vec![image]),
            ];
            let response = self
                .provider
                .chat(&messages, Some(&options))
                .await
                .map_err(|e| DegradedError::OcrFailed {
                    detail: format!("page image {}: {}", idx + 1, e),
                })?;

            debug!(
                "OCR page image {}: {} output tokens",
                idx + 1,
                response.completion_tokens
            );
            lines.extend(response.content.lines().map(str::to_string));
        }
        Ok(lines)
    }
}

/// Raster payloads worth sending to OCR: the upload itself when it is a
/// PNG/JPEG, or the JPEG pages embedded in a PDF.
pub fn page_images(bytes: &[u8]) -> Vec<&[u8]> {
    if is_raster(bytes) {
        vec![bytes]
    } else if bytes.starts_with(b"%PDF") {
        embedded_jpegs(bytes)
    } else {
        Vec::new()
    }
}

fn is_raster(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0x89, b'P', b'N', b'G']) || bytes.starts_with(&[0xFF, 0xD8, 0xFF])
}

/// Decode, bound the size, and re-encode a page as base64 PNG for the API.
///
/// PNG is lossless, so text edges stay crisp after downscaling.
fn encode_page_image(raw: &[u8], max_pixels: u32) -> Result<ImageData, DegradedError> {
    let img = image::load_from_memory(raw).map_err(|e| DegradedError::OcrFailed {
        detail: format!("undecodable page image: {e}"),
    })?;
    let img = bound_size(img, max_pixels);

    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| DegradedError::OcrFailed {
            detail: format!("PNG encoding failed: {e}"),
        })?;

    let b64 = STANDARD.encode(&buf);
    debug!(
        "Encoded {}x{} page image → {} bytes base64",
        img.width(),
        img.height(),
        b64.len()
    );
    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}

fn bound_size(img: DynamicImage, max_pixels: u32) -> DynamicImage {
    if img.width().max(img.height()) <= max_pixels {
        img
    } else {
        img.resize(max_pixels, max_pixels, image::imageops::FilterType::Triangle)
    }
}
