pub mod fake;
pub mod real;

use anyhow::Result;
use async_openai::types::{
    ChatCompletionRequestMessage, CreateChatCompletionResponse,
};
use async_trait::async_trait;

/// What a single completion request asked for.
#[derive(Debug, Clone)]
pub struct ModelRequest {
    pub model_name: String,
    pub temperature: f32,
    pub messages: Vec<ChatCompletionRequestMessage>,
}

/// A trait that abstracts OpenAI client functionality for testing
///
/// Both the real client and [`fake::FakeOpenAIClient`] implement it, so the
/// insight pipeline never talks to `async_openai` directly.
#[async_trait]
pub trait OpenAIClientTrait: Send + Sync {
    /// Creates a chat completion by sending messages to the language model
    ///
    /// # Arguments
    /// * `model` - The model identifier (e.g., "gpt-4")
    /// * `messages` - A sequence of messages using OpenAI types
    /// * `temperature` - Sampling temperature; keep it low for extraction
    ///
    /// # Returns
    /// The complete ChatCompletionResponse from the model, or an error if
    /// the request could not be completed
    async fn chat_completion(
        &self,
        model: String,
        messages: Vec<ChatCompletionRequestMessage>,
        temperature: f32,
    ) -> Result<CreateChatCompletionResponse, anyhow::Error>;
}
