//! Prompts for LLM summarisation and vision OCR.
//!
//! Every template lives here so a wording change touches exactly one place,
//! and unit tests can inspect prompts without calling a model.
//!
//! Each style template shares the same guard-rails ([`GROUNDING_RULES`]):
//! use only information present in the text, skip garbled fragments, and
//! answer "Text not readable" when there is nothing usable.

use crate::request::SummaryStyle;

/// Phrase the model is told to answer with, and that the pipeline itself
/// uses for unreadable documents.
pub const NOT_READABLE: &str = "Text not readable";

/// Role line used as the system message for chat-style providers.
pub const SYSTEM_ROLE: &str =
    "You are a careful assistant that writes faithful summaries of documents.";

/// Guard-rails appended to every style instruction.
pub const GROUNDING_RULES: &str = r#"Rules:
- Use ONLY information present in the text below. Do not add facts.
- Ignore garbled, corrupted or non-English fragments left over from extraction.
- If the text does not contain enough readable content to summarise, reply exactly: "Text not readable"
- Output only the summary, with no preamble."#;

/// Style-specific instruction, without the guard-rails.
pub fn style_instruction(style: SummaryStyle) -> &'static str {
    match style {
        SummaryStyle::Brief => {
            "Summarise the following text in 2-3 concise sentences that capture its main point."
        }
        SummaryStyle::Detailed => {
            "Write a detailed summary of the following text in a few short paragraphs. \
             Cover every main point and the important supporting details."
        }
        SummaryStyle::Bullet => {
            "Summarise the following text as 3-7 bullet points. \
             Start each point with \"- \" and keep each to one line."
        }
        SummaryStyle::Sentiment => {
            "Describe the overall sentiment and tone of the following text \
             (positive, negative, neutral or mixed) and briefly explain why, \
             citing what the text says."
        }
        SummaryStyle::Technical => {
            "Write a technical summary of the following text. Focus on methods, \
             technical concepts, figures and terminology, and keep precise names and numbers."
        }
    }
}

/// Full instruction block for a style: style line + guard-rails.
pub fn instructions(style: SummaryStyle) -> String {
    format!("{}\n\n{}", style_instruction(style), GROUNDING_RULES)
}

/// Chat-shaped prompt: `(system, user)`.
pub fn chat_prompt(style: SummaryStyle, text: &str) -> (String, String) {
    (
        format!("{}\n\n{}", SYSTEM_ROLE, instructions(style)),
        format!("Text:\n\"\"\"\n{}\n\"\"\"", text),
    )
}

/// Completion-shaped prompt: one string ending where the model should continue.
pub fn completion_prompt(style: SummaryStyle, text: &str) -> String {
    format!(
        "{}\n\nText:\n\"\"\"\n{}\n\"\"\"\n\nSummary:",
        instructions(style),
        text
    )
}

/// System prompt for vision OCR of a scanned page.
pub const OCR_SYSTEM_PROMPT: &str = r#"You are an OCR engine. Transcribe every line of text visible in the image.

Rules:
- Output one line of text per visual line, top to bottom.
- Do NOT describe the image, add commentary, or wrap the output in fences.
- If the image contains no text, output nothing."#;
