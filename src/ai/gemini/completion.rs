use super::client::GeminiHttpClient;
use super::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, InlineData, Part,
    ThinkingConfig,
};
use crate::ai::CompletionService;
use crate::assembler::{AssembledPrompt, PromptPart};
use crate::models::Config;
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

const TEMPERATURE: f32 = 0.5;
const TOP_P: f32 = 0.95;
const THINKING_BUDGET: u32 = 8192;

pub struct GeminiCompletionClient {
    http: GeminiHttpClient,
}

impl GeminiCompletionClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, model, timeout, reqwest::Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        timeout: Duration,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(api_key, model, timeout, client),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.api_key.clone(),
            config.model.clone(),
            config.timeout,
        )
    }

    pub fn model(&self) -> &str {
        self.http.model()
    }

    fn build_request(prompt: &AssembledPrompt) -> GenerateContentRequest {
        let parts = prompt
            .parts
            .iter()
            .map(|part| match part {
                PromptPart::Image(image) => Part::InlineData {
                    inline_data: InlineData {
                        mime_type: image.media_type.clone(),
                        data: image.data.clone(),
                    },
                },
                PromptPart::Text(text) => Part::Text {
                    text: text.clone(),
                    thought: None,
                },
            })
            .collect();

        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text {
                    text: prompt.system_instruction.to_string(),
                    thought: None,
                }],
            },
            contents: vec![Content {
                role: Some("user".to_string()),
                parts,
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                top_p: TOP_P,
                thinking_config: ThinkingConfig {
                    thinking_budget: THINKING_BUDGET,
                },
            },
        }
    }

    /// Join the answer text of the first candidate, skipping thought summaries.
    fn extract_text(response: &GenerateContentResponse) -> Option<String> {
        let content = response.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text, thought } if *thought != Some(true) => Some(text.as_str()),
                _ => None,
            })
            .collect();

        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[cfg(test)]
super::impl_with_gemini_base_url!(GeminiCompletionClient);

#[async_trait]
impl CompletionService for GeminiCompletionClient {
    async fn complete(&self, prompt: &AssembledPrompt) -> Result<String> {
        tracing::debug!(
            "Requesting completion from {} ({} image part(s))",
            self.model(),
            prompt.image_count()
        );

        let request = Self::build_request(prompt);
        let response: GenerateContentResponse = self.http.generate_content(&request).await?;

        Self::extract_text(&response).ok_or_else(|| {
            let reason = response
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason.clone())
                .or_else(|| {
                    response
                        .candidates
                        .first()
                        .and_then(|c| c.finish_reason.clone())
                })
                .unwrap_or_else(|| "no candidates".to_string());
            tracing::error!("Gemini returned no text (reason: {})", reason);
            Error::Completion(format!("No text in Gemini response (reason: {})", reason))
        })
    }
}
