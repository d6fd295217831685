use super::CompletionService;
use crate::assembler::AssembledPrompt;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Default reply: the example-only shape.
pub const DEFAULT_MOCK_RESPONSE: &str = "### Example Responses by Band Level
#### Band 6
A band 6 answer.
#### Band 7
A band 7 answer.
#### Band 8
A band 8 answer.
#### Band 9
A band 9 answer.";

/// Scripted completion service. Replies are cycled in the order they were added.
#[derive(Clone)]
pub struct MockCompletionClient {
    script: Arc<Mutex<Vec<std::result::Result<String, String>>>>,
    prompts: Arc<Mutex<Vec<AssembledPrompt>>>,
    call_count: Arc<Mutex<usize>>,
    delay: Option<Duration>,
}

impl MockCompletionClient {
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
            delay: None,
        }
    }

    pub fn with_response(self, response: String) -> Self {
        self.script.lock().unwrap().push(Ok(response));
        self
    }

    pub fn with_failure(self, reason: String) -> Self {
        self.script.lock().unwrap().push(Err(reason));
        self
    }

    /// Hold each call open for `delay` before replying.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Prompts received so far, oldest first.
    pub fn received_prompts(&self) -> Vec<AssembledPrompt> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockCompletionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionService for MockCompletionClient {
    async fn complete(&self, prompt: &AssembledPrompt) -> Result<String> {
        let index = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count - 1
        };
        self.prompts.lock().unwrap().push(prompt.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let script = self.script.lock().unwrap();
        if script.is_empty() {
            return Ok(DEFAULT_MOCK_RESPONSE.to_string());
        }

        match &script[index % script.len()] {
            Ok(text) => Ok(text.clone()),
            Err(reason) => Err(Error::Completion(reason.clone())),
        }
    }
}
