//! DeepSeek API types
//!
//! Structs that mirror the OpenAI-compatible chat completions format used by
//! DeepSeek. Only the fields the client reads are modeled.

use serde::{Deserialize, Serialize};

/// Chat completions request body
#[derive(Serialize, Debug)]
pub struct ChatCompletionRequest {
    /// Model name (e.g. "deepseek-chat")
    pub model: String,
    /// Conversation; a single user message here
    pub messages: Vec<ChatMessage>,
    /// Output token cap
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Always false; responses are read whole
    pub stream: bool,
}

/// One chat message
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatMessage {
    /// "system", "user" or "assistant"
    pub role: String,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// A user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completions response body
#[derive(Deserialize, Debug)]
pub struct ChatCompletionResponse {
    /// Generated choices; the client reads the first
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// A generated choice
#[derive(Deserialize, Debug)]
pub struct Choice {
    /// The generated message
    pub message: ResponseMessage,
    /// Why generation stopped
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Message inside a choice
#[derive(Deserialize, Debug)]
pub struct ResponseMessage {
    /// Generated text; may be null
    #[serde(default)]
    pub content: Option<String>,
}
