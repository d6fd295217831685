//! Data models and structures
//!
//! Defines the request-side data for a writing analysis (task type, essay
//! input, image payloads) and the process-wide configuration.

use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WritingTaskType {
    Task1,
    Task2,
}

impl WritingTaskType {
    pub fn label(&self) -> &'static str {
        match self {
            WritingTaskType::Task1 => "Task 1",
            WritingTaskType::Task2 => "Task 2",
        }
    }

    /// Target length, in words, of each generated example response.
    pub fn word_range(&self) -> (u32, u32) {
        match self {
            WritingTaskType::Task1 => (150, 180),
            WritingTaskType::Task2 => (250, 280),
        }
    }
}

impl fmt::Display for WritingTaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for WritingTaskType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(' ', "");
        match normalized.as_str() {
            "1" | "task1" => Ok(WritingTaskType::Task1),
            "2" | "task2" => Ok(WritingTaskType::Task2),
            _ => Err(format!(
                "Invalid task type '{}'. Expected 1, 2, \"Task 1\" or \"Task 2\"",
                s
            )),
        }
    }
}

/// Base64 image data plus its media type, without any data-URI prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub media_type: String,
    pub data: String,
}

impl ImagePayload {
    pub fn new(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            media_type: media_type.into(),
            data: data.into(),
        }
    }

    /// Re-attach the `data:<type>;base64,` prefix for local previews.
    pub fn to_data_uri(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// The essay the user supplied, if any. Text and image are never both active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EssayInput {
    Text(String),
    Image(ImagePayload),
    None,
}

impl EssayInput {
    /// Pick the active input: an image wins, whitespace-only text counts as absent.
    ///
    /// Text is kept as typed; trimming only decides emptiness.
    pub fn from_parts(text: Option<&str>, image: Option<ImagePayload>) -> Self {
        if let Some(image) = image {
            if text.is_some_and(|t| !t.trim().is_empty()) {
                tracing::warn!("Both essay text and essay image supplied; using the image");
            }
            return EssayInput::Image(image);
        }

        match text {
            Some(t) if !t.trim().is_empty() => EssayInput::Text(t.to_string()),
            _ => EssayInput::None,
        }
    }

    pub fn is_provided(&self) -> bool {
        !matches!(self, EssayInput::None)
    }
}

/// One submission's worth of input, built fresh per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRequest {
    pub task_type: WritingTaskType,
    pub topic: String,
    pub essay: EssayInput,
    pub reference: Option<ImagePayload>,
}

impl AnalysisRequest {
    pub fn new(
        task_type: WritingTaskType,
        topic: impl Into<String>,
        essay: EssayInput,
        reference: Option<ImagePayload>,
    ) -> Result<Self> {
        let topic = topic.into();
        crate::validation::validate_topic(&topic)?;

        Ok(Self {
            task_type,
            topic,
            essay,
            reference,
        })
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_key = non_blank("GEMINI_API_KEY")
            .or_else(|| non_blank("API_KEY"))
            .ok_or_else(|| Error::Config("GEMINI_API_KEY not set".to_string()))?;

        let model = non_blank("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let timeout_secs = match non_blank("COMPLETION_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|_| {
                Error::Config(format!(
                    "COMPLETION_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                    raw
                ))
            })?,
            None => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Self {
            api_key,
            model,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_task_type_parsing() {
        assert_eq!("1".parse::<WritingTaskType>(), Ok(WritingTaskType::Task1));
        assert_eq!("Task 2".parse::<WritingTaskType>(), Ok(WritingTaskType::Task2));
        assert_eq!("task1".parse::<WritingTaskType>(), Ok(WritingTaskType::Task1));
        assert!("3".parse::<WritingTaskType>().is_err());
    }

    #[test]
    fn test_task_type_label_round_trips() {
        for task in [WritingTaskType::Task1, WritingTaskType::Task2] {
            assert_eq!(task.to_string().parse::<WritingTaskType>(), Ok(task));
        }
    }

    #[test]
    fn test_task_type_word_ranges() {
        assert_eq!(WritingTaskType::Task1.word_range(), (150, 180));
        assert_eq!(WritingTaskType::Task2.word_range(), (250, 280));
    }

    #[test]
    fn test_essay_input_whitespace_text_is_none() {
        assert_eq!(EssayInput::from_parts(Some("  \n\t "), None), EssayInput::None);
        assert_eq!(EssayInput::from_parts(None, None), EssayInput::None);
    }

    #[test]
    fn test_essay_input_keeps_text_verbatim() {
        let input = EssayInput::from_parts(Some("  My essay.  "), None);
        assert_eq!(input, EssayInput::Text("  My essay.  ".to_string()));
        assert!(input.is_provided());
    }

    #[test]
    fn test_essay_input_image_wins_over_text() {
        let image = ImagePayload::new("image/jpeg", "AAAA");
        let input = EssayInput::from_parts(Some("typed text"), Some(image.clone()));
        assert_eq!(input, EssayInput::Image(image));
    }

    #[test]
    fn test_analysis_request_rejects_blank_topic() {
        let err = AnalysisRequest::new(WritingTaskType::Task2, "   ", EssayInput::None, None)
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_data_uri() {
        let image = ImagePayload::new("image/png", "iVBORw0KGgo=");
        assert_eq!(image.to_data_uri(), "data:image/png;base64,iVBORw0KGgo=");
    }

    #[test]
    fn test_config_requires_api_key() {
        let err = Config::from_vars(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));

        let err = Config::from_vars(lookup(&[("GEMINI_API_KEY", "  ")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_vars(lookup(&[("GEMINI_API_KEY", "key")])).unwrap();
        assert_eq!(config.api_key, "key");
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.timeout, Duration::from_secs(DEFAULT_TIMEOUT_SECS));
    }

    #[test]
    fn test_config_api_key_fallback_and_overrides() {
        let config = Config::from_vars(lookup(&[
            ("API_KEY", "fallback"),
            ("GEMINI_MODEL", "gemini-2.5-pro"),
            ("COMPLETION_TIMEOUT_SECS", "45"),
        ]))
        .unwrap();
        assert_eq!(config.api_key, "fallback");
        assert_eq!(config.model, "gemini-2.5-pro");
        assert_eq!(config.timeout, Duration::from_secs(45));
    }

    #[test]
    fn test_config_rejects_bad_timeout() {
        let err = Config::from_vars(lookup(&[
            ("GEMINI_API_KEY", "key"),
            ("COMPLETION_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
