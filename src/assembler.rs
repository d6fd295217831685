//! Builds the multi-part prompt for one analysis request.
//!
//! Image parts come first (reference chart, then essay photo), followed by a
//! single text part. The `[Image N]` labels in the text follow that same order.

use crate::models::{AnalysisRequest, EssayInput, ImagePayload};
use crate::prompts;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptPart {
    Image(ImagePayload),
    Text(String),
}

/// System instruction plus the ordered user-message parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    pub system_instruction: &'static str,
    pub parts: Vec<PromptPart>,
}

impl AssembledPrompt {
    /// The composed user text (always the last part).
    pub fn user_text(&self) -> &str {
        self.parts
            .iter()
            .rev()
            .find_map(|part| match part {
                PromptPart::Text(text) => Some(text.as_str()),
                PromptPart::Image(_) => None,
            })
            .unwrap_or_default()
    }

    pub fn image_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|part| matches!(part, PromptPart::Image(_)))
            .count()
    }
}

pub fn assemble(request: &AnalysisRequest) -> AssembledPrompt {
    let mut parts = Vec::with_capacity(3);
    let (min_words, max_words) = request.task_type.word_range();
    let mut text = prompts::render(
        prompts::USER_HEADER,
        &[
            ("task_type", request.task_type.label()),
            ("topic", request.topic.trim()),
            ("min_words", &min_words.to_string()),
            ("max_words", &max_words.to_string()),
        ],
    );
    text.push('\n');

    if let Some(reference) = &request.reference {
        parts.push(PromptPart::Image(reference.clone()));
        let index = parts.len().to_string();
        text.push_str(&prompts::render(
            prompts::USER_REFERENCE_IMAGE,
            &[("index", &index)],
        ));
        text.push('\n');
    }

    match &request.essay {
        EssayInput::Image(essay_image) => {
            parts.push(PromptPart::Image(essay_image.clone()));
            let index = parts.len().to_string();
            text.push_str(&prompts::render(
                prompts::USER_ESSAY_IMAGE,
                &[("index", &index)],
            ));
        }
        EssayInput::Text(essay) if !essay.trim().is_empty() => {
            text.push_str(&prompts::render(
                prompts::USER_ESSAY_TEXT,
                &[("essay", essay)],
            ));
        }
        EssayInput::Text(_) | EssayInput::None => {
            text.push_str(prompts::USER_NO_ESSAY);
        }
    }

    tracing::debug!(
        "Assembled prompt: {} image part(s), {} chars of user text",
        parts.len(),
        text.len()
    );

    parts.push(PromptPart::Text(text));

    AssembledPrompt {
        system_instruction: prompts::SYSTEM_INSTRUCTION,
        parts,
    }
}
