//! Application entry point for analysing one writing submission.

use crate::ai::{CompletionService, GeminiCompletionClient};
use crate::assembler::assemble;
use crate::encoder::{self, RawImage};
use crate::models::{AnalysisRequest, Config, EssayInput, WritingTaskType};
use crate::render::check_contract;
use crate::session::Session;
use crate::{validation, Result};
use tracing::{info, warn, Instrument};

/// Everything the user entered for one submission.
#[derive(Debug, Clone)]
pub struct Submission {
    pub task_type: WritingTaskType,
    pub topic: String,
    pub essay_text: Option<String>,
    pub reference_image: Option<RawImage>,
    pub essay_image: Option<RawImage>,
}

impl Submission {
    pub fn new(task_type: WritingTaskType, topic: impl Into<String>) -> Self {
        Self {
            task_type,
            topic: topic.into(),
            essay_text: None,
            reference_image: None,
            essay_image: None,
        }
    }

    pub fn with_essay_text(mut self, text: impl Into<String>) -> Self {
        self.essay_text = Some(text.into());
        self
    }

    pub fn with_reference_image(mut self, image: RawImage) -> Self {
        self.reference_image = Some(image);
        self
    }

    pub fn with_essay_image(mut self, image: RawImage) -> Self {
        self.essay_image = Some(image);
        self
    }
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub completion: Box<dyn CompletionService>,
}

/// Turns user input into a request, sends it, and returns the model's reply.
pub struct App {
    completion: Box<dyn CompletionService>,
}

impl App {
    pub fn with_services(services: AppServices) -> Self {
        Self {
            completion: services.completion,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let client = GeminiCompletionClient::from_config(config);
        info!(
            "Completion provider: Gemini (model: {}, timeout: {}s)",
            client.model(),
            config.timeout.as_secs()
        );
        Self::with_services(AppServices {
            completion: Box::new(client),
        })
    }

    /// Construct an app from environment configuration (`Config::from_env`).
    pub fn new() -> Result<Self> {
        let config = Config::from_env()?;
        Ok(Self::from_config(&config))
    }

    /// Analyse one essay, or request example answers when no essay is given.
    ///
    /// An image that cannot be read aborts before anything is sent.
    pub async fn analyze(
        &self,
        task_type: WritingTaskType,
        topic: &str,
        essay_text: Option<&str>,
        reference_image: Option<&RawImage>,
        essay_image: Option<&RawImage>,
    ) -> Result<String> {
        validation::validate_topic(topic)?;

        let (reference, essay_payload) =
            encoder::encode_pair(reference_image, essay_image).await?;
        let essay = EssayInput::from_parts(essay_text, essay_payload);
        let expects_analysis = essay.is_provided();

        let request = AnalysisRequest::new(task_type, topic, essay, reference)?;
        let prompt = assemble(&request);

        info!(
            "Requesting {} for {} ({} image part(s))",
            if expects_analysis {
                "analysis and examples"
            } else {
                "examples only"
            },
            task_type,
            prompt.image_count()
        );

        let text = self.completion.complete(&prompt).await?;
        info!("Received response ({} chars)", text.len());

        let report = check_contract(&text, expects_analysis);
        if !report.is_satisfied() {
            warn!(
                "Response does not match the requested format (missing: {:?}, unexpected analysis: {})",
                report.missing, report.unexpected_analysis
            );
        }

        Ok(text)
    }

    /// Run [`App::analyze`] under the session's single-submission gate.
    ///
    /// Rejected with [`crate::Error::InvalidState`] while another submission
    /// is in flight; the session is left untouched in that case.
    ///
    /// If the returned future is dropped before it completes, the session
    /// moves to `Failed` and accepts a new submission.
    pub async fn submit(&self, session: &Session, submission: &Submission) -> Result<String> {
        let guard = session.begin_guarded()?;
        let id = guard.id();
        let span = tracing::info_span!("submission", %id);

        let outcome = self
            .analyze(
                submission.task_type,
                &submission.topic,
                submission.essay_text.as_deref(),
                submission.reference_image.as_ref(),
                submission.essay_image.as_ref(),
            )
            .instrument(span)
            .await;

        match outcome {
            Ok(text) => {
                guard.succeed(text.clone())?;
                Ok(text)
            }
            Err(e) => {
                warn!("Submission {} failed: {}", id, e);
                guard.fail(e.user_message())?;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{App, AppServices, Submission};
    use crate::ai::MockCompletionClient;
    use crate::assembler::PromptPart;
    use crate::encoder::RawImage;
    use crate::models::WritingTaskType;
    use crate::session::{Session, View};
    use crate::Error;
    use std::time::Duration;

    const JPEG: [u8; 4] = [0xFF, 0xD8, 0xFF, 0xE0];
    const PNG: [u8; 4] = [0x89, 0x50, 0x4E, 0x47];

    fn build_test_app(completion: MockCompletionClient) -> App {
        App::with_services(AppServices {
            completion: Box::new(completion),
        })
    }

    #[tokio::test]
    async fn test_analyze_sends_images_in_fixed_order() {
        let mock = MockCompletionClient::new();
        let handle = mock.clone();
        let app = build_test_app(mock);

        let reference = RawImage::from_bytes(PNG.to_vec());
        let essay = RawImage::from_bytes(JPEG.to_vec());

        app.analyze(
            WritingTaskType::Task1,
            "The chart shows population growth",
            None,
            Some(&reference),
            Some(&essay),
        )
        .await
        .unwrap();

        let prompts = handle.received_prompts();
        assert_eq!(prompts.len(), 1);
        let parts = &prompts[0].parts;
        assert!(matches!(&parts[0], PromptPart::Image(p) if p.media_type == "image/png"));
        assert!(matches!(&parts[1], PromptPart::Image(p) if p.media_type == "image/jpeg"));
        assert!(prompts[0]
            .user_text()
            .contains("[Image 1] attached is the Task 1 Question Reference"));
        assert!(prompts[0]
            .user_text()
            .contains("[Image 2] attached is the student's handwritten essay"));
    }

    #[tokio::test]
    async fn test_analyze_rejects_blank_topic_without_calling_service() {
        let mock = MockCompletionClient::new();
        let handle = mock.clone();
        let app = build_test_app(mock);

        let err = app
            .analyze(WritingTaskType::Task2, "  ", Some("essay"), None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(handle.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_unreadable_image_aborts_before_remote_call() {
        let mock = MockCompletionClient::new();
        let handle = mock.clone();
        let app = build_test_app(mock);
        let dir = tempfile::tempdir().unwrap();
        let missing = RawImage::from_path(dir.path().join("essay.jpg"));

        let err = app
            .analyze(WritingTaskType::Task2, "Cities", None, None, Some(&missing))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Encoding(_)));
        assert_eq!(handle.get_call_count(), 0);
    }

    #[tokio::test]
    async fn test_submit_updates_session() {
        let app = build_test_app(MockCompletionClient::new().with_response("### Done".to_string()));
        let session = Session::new();

        let text = app
            .submit(&session, &Submission::new(WritingTaskType::Task2, "Cities"))
            .await
            .unwrap();
        assert_eq!(text, "### Done");
        assert_eq!(session.view(), View::Result("### Done".to_string()));
    }

    #[tokio::test]
    async fn test_submit_failure_shows_user_message() {
        let app = build_test_app(MockCompletionClient::new().with_failure("HTTP 500".to_string()));
        let session = Session::new();

        let err = app
            .submit(&session, &Submission::new(WritingTaskType::Task2, "Cities"))
            .await
            .unwrap_err();
        assert_eq!(session.view(), View::Error(err.user_message()));
    }

    #[tokio::test]
    async fn test_concurrent_submission_is_rejected() {
        let mock = MockCompletionClient::new().with_delay(Duration::from_millis(200));
        let handle = mock.clone();
        let app = build_test_app(mock);
        let session = Session::new();
        let submission = Submission::new(WritingTaskType::Task2, "Cities");

        let (first, second) = tokio::join!(app.submit(&session, &submission), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            assert_eq!(session.view(), View::Loading);
            app.submit(&session, &submission).await
        });

        assert!(first.is_ok());
        assert!(matches!(second, Err(Error::InvalidState(_))));
        assert_eq!(handle.get_call_count(), 1);
        assert!(matches!(session.view(), View::Result(_)));
    }

    #[tokio::test]
    async fn test_timed_out_submission_allows_resubmission() {
        let mock = MockCompletionClient::new()
            .with_response("### Done".to_string())
            .with_delay(Duration::from_millis(200));
        let handle = mock.clone();
        let app = build_test_app(mock);
        let session = Session::new();
        let submission = Submission::new(WritingTaskType::Task2, "Cities");

        let timed_out =
            tokio::time::timeout(Duration::from_millis(20), app.submit(&session, &submission))
                .await;
        assert!(timed_out.is_err());
        assert!(!session.is_in_flight());
        assert!(matches!(session.view(), View::Error(_)));

        let text = app.submit(&session, &submission).await.unwrap();
        assert_eq!(text, "### Done");
        assert_eq!(session.view(), View::Result("### Done".to_string()));
        assert_eq!(handle.get_call_count(), 2);
    }
}
