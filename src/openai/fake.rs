use anyhow::Result;
use async_openai::types::{
    ChatChoice, ChatCompletionRequestMessage, ChatCompletionResponseMessage,
    CompletionUsage, CreateChatCompletionResponse, FinishReason, Role,
};
use async_trait::async_trait;
use std::sync::Mutex;

use crate::openai::{ModelRequest, OpenAIClientTrait};

/// One scripted outcome of a fake completion call.
#[derive(Debug, Clone)]
pub enum FakeReply {
    /// A normal reply whose first choice carries this content.
    Content(Option<String>),
    /// A reply with an empty `choices` list.
    NoChoices,
    /// The request itself fails, as a network or service error would.
    Error(String),
}

/// A fake implementation of the OpenAI client for testing
///
/// Replies are handed out in the order they were queued. Once the queue is
/// empty every call gets the default response. Every request is recorded so
/// tests can check what was sent.
///
/// # Example
///
/// ```
/// use guestbrief::openai::OpenAIClientTrait;
/// use guestbrief::openai::fake::FakeOpenAIClient;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let client = FakeOpenAIClient::new()
///         .with_response(r#"{"priority": "VIP"}"#)
///         .with_error("connection reset");
///
///     let response = client.chat_completion("gpt-4".to_string(), vec![], 0.1).await?;
///     let content = response.choices.first()
///         .and_then(|choice| choice.message.content.as_ref())
///         .map(String::from)
///         .unwrap_or_default();
///     assert_eq!(content, r#"{"priority": "VIP"}"#);
///
///     assert!(client.chat_completion("gpt-4".to_string(), vec![], 0.1).await.is_err());
///     Ok(())
/// }
/// ```
pub struct FakeOpenAIClient {
    replies: Mutex<Vec<FakeReply>>,
    default_response: String,
    // Track requests for verification in tests
    pub requests: Mutex<Vec<ModelRequest>>,
}

impl Default for FakeOpenAIClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeOpenAIClient {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(vec![]),
            default_response: "Fake default response".to_string(),
            requests: Mutex::new(vec![]),
        }
    }

    /// Add a response to be returned by the fake client
    pub fn with_response(self, response: &str) -> Self {
        self.with_reply(FakeReply::Content(Some(response.to_string())))
    }

    /// Add multiple responses to be returned by the fake client in sequence
    pub fn with_responses(self, responses: Vec<&str>) -> Self {
        responses
            .into_iter()
            .fold(self, |client, response| client.with_response(response))
    }

    /// Configure the client to return a response with None content
    pub fn with_none_content_response(self) -> Self {
        self.with_reply(FakeReply::Content(None))
    }

    /// Configure the next call to fail before any response is produced
    pub fn with_error(self, message: &str) -> Self {
        self.with_reply(FakeReply::Error(message.to_string()))
    }

    pub fn with_reply(self, reply: FakeReply) -> Self {
        self.replies.lock().unwrap().push(reply);
        self
    }

    /// Content returned once the scripted replies run out
    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = response.to_string();
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl OpenAIClientTrait for FakeOpenAIClient {
    #[allow(deprecated)]
    async fn chat_completion(
        &self,
        model: String,
        messages: Vec<ChatCompletionRequestMessage>,
        temperature: f32,
    ) -> Result<CreateChatCompletionResponse, anyhow::Error> {
        self.requests.lock().unwrap().push(ModelRequest {
            model_name: model.clone(),
            temperature,
            messages,
        });

        let reply = {
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                FakeReply::Content(Some(self.default_response.clone()))
            } else {
                replies.remove(0)
            }
        };

        let choices = match reply {
            FakeReply::Error(message) => return Err(anyhow::anyhow!(message)),
            FakeReply::NoChoices => vec![],
            FakeReply::Content(content) => {
                let message = ChatCompletionResponseMessage {
                    role: Role::Assistant,
                    content,
                    #[allow(deprecated)]
                    function_call: None,
                    tool_calls: None,
                    #[allow(deprecated)]
                    refusal: None,
                    audio: None,
                };
                vec![ChatChoice {
                    index: 0,
                    message,
                    finish_reason: Some(FinishReason::Stop),
                    logprobs: None,
                }]
            }
        };

        let usage = CompletionUsage {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            prompt_tokens_details: None,
            completion_tokens_details: None,
        };

        Ok(CreateChatCompletionResponse {
            id: "fake_id".to_string(),
            object: "chat.completion".to_string(),
            created: 0,
            model,
            system_fingerprint: Some("fake-fingerprint".to_string()),
            service_tier: None,
            choices,
            usage: Some(usage),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_openai::types::ChatCompletionRequestSystemMessageArgs;

    fn first_content(response: &CreateChatCompletionResponse) -> Option<String> {
        response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
    }

    #[tokio::test]
    async fn test_fake_openai_client_responses() -> Result<(), anyhow::Error> {
        let client = FakeOpenAIClient::new()
            .with_responses(vec!["First response", "Second response"]);

        let system_msg = ChatCompletionRequestSystemMessageArgs::default()
            .content("You are helpful")
            .build()?;

        let response1 = client
            .chat_completion(
                "gpt-4".to_string(),
                vec![ChatCompletionRequestMessage::System(system_msg)],
                0.1,
            )
            .await?;
        assert_eq!(first_content(&response1), Some("First response".to_string()));

        let response2 =
            client.chat_completion("gpt-4".to_string(), vec![], 0.1).await?;
        assert_eq!(
            first_content(&response2),
            Some("Second response".to_string())
        );

        let response3 =
            client.chat_completion("gpt-4".to_string(), vec![], 0.1).await?;
        assert_eq!(
            first_content(&response3),
            Some("Fake default response".to_string())
        );

        Ok(())
    }

    #[tokio::test]
    async fn test_scripted_error_and_empty_choices() {
        let client = FakeOpenAIClient::new()
            .with_error("service unavailable")
            .with_reply(FakeReply::NoChoices);

        let err = client
            .chat_completion("gpt-4".to_string(), vec![], 0.1)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "service unavailable");

        let response = client
            .chat_completion("gpt-4".to_string(), vec![], 0.1)
            .await
            .unwrap();
        assert!(response.choices.is_empty());
    }

    #[tokio::test]
    async fn test_default_response_override() {
        let client =
            FakeOpenAIClient::new().with_default_response(r#"{"priority": "VIP"}"#);

        for _ in 0..3 {
            let response = client
                .chat_completion("gpt-4".to_string(), vec![], 0.1)
                .await
                .unwrap();
            assert_eq!(
                first_content(&response),
                Some(r#"{"priority": "VIP"}"#.to_string())
            );
        }
    }

    #[tokio::test]
    async fn test_request_tracking() {
        let client = FakeOpenAIClient::new().with_response("Test response");

        let _ = client
            .chat_completion("gpt-4".to_string(), vec![], 0.2)
            .await
            .unwrap();

        let requests = client.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model_name, "gpt-4");
        assert_eq!(requests[0].temperature, 0.2);
    }

    #[tokio::test]
    async fn test_none_content_response() {
        let client = FakeOpenAIClient::new().with_none_content_response();

        let response = client
            .chat_completion("gpt-4".to_string(), vec![], 0.1)
            .await
            .unwrap();

        assert_eq!(response.choices[0].message.content, None);
    }
}
