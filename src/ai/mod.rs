//! Remote text-completion integration
//!
//! Sends an assembled prompt to a generative model and returns the full text
//! of its single response. Failures of any kind surface as
//! [`crate::Error::Completion`]; retrying is left to the caller.

pub mod gemini;
pub mod mock;

pub use gemini::GeminiCompletionClient;
pub use mock::MockCompletionClient;

use crate::assembler::AssembledPrompt;
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &AssembledPrompt) -> Result<String>;
}
