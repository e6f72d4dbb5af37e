//! [`LlmDriver`] – chat client for a local [Ollama](https://ollama.com)
//! server.
//!
//! Talks to Ollama's native `/api/chat` endpoint with streaming disabled and
//! returns the assistant's reply text.  The turn loop only depends on the
//! [`ChatOracle`] trait, so tests and other backends can stand in for it.
//!
//! # Example
//!
//! ```rust,no_run
//! use homebot_runtime::llm_driver::{ChatMessage, ChatOracle, LlmDriver, Role};
//!
//! # async fn demo() -> Result<(), homebot_runtime::llm_driver::LlmError> {
//! let driver = LlmDriver::new("http://localhost:11434", "llama3", 0.7);
//! let messages = vec![
//!     ChatMessage::system("You are the brain of a home robot."),
//!     ChatMessage::user("What do you see?"),
//! ];
//! let reply = driver.complete(&messages).await?;
//! # let _ = reply;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Upper bound on a single chat round-trip.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Errors that can arise from chat requests.
#[derive(Error, Debug)]
pub enum LlmError {
    /// The HTTP request failed, timed out, or returned a non-success status.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The response body did not have the expected shape.
    #[error("Unexpected response format: {0}")]
    BadResponse(String),
}

/// The role of a participant in a chat conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single message in a chat conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// A request/response chat-completion backend.
#[async_trait]
pub trait ChatOracle: Send + Sync {
    /// Send the ordered `messages` and return the free-text reply.
    ///
    /// # Errors
    ///
    /// Any non-success outcome is an error; the caller does not retry.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError>;
}

#[derive(Serialize)]
struct Options {
    temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: Options,
}

#[derive(Deserialize)]
struct ChatResponse {
    message: Option<ChatMessage>,
}

/// Ollama `/api/chat` client.  Construct once and reuse across turns.
pub struct LlmDriver {
    base_url: String,
    model: String,
    temperature: f32,
    client: reqwest::Client,
}

impl LlmDriver {
    /// Create a driver for `base_url` (e.g. `"http://localhost:11434"`) using
    /// `model` (e.g. `"llama3"`) at the given sampling `temperature`.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>, temperature: f32) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            temperature,
            client: reqwest::Client::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }

    fn request<'a>(&'a self, messages: &'a [ChatMessage]) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages,
            stream: false,
            options: Options {
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl ChatOracle for LlmDriver {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        debug!(model = %self.model, messages = messages.len(), "sending chat request");
        let response: ChatResponse = self
            .client
            .post(self.chat_url())
            .timeout(REQUEST_TIMEOUT)
            .json(&self.request(messages))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        response
            .message
            .map(|m| m.content)
            .ok_or_else(|| LlmError::BadResponse("missing message in chat response".into()))
    }
}
