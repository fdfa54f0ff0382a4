//! DeepSeek chat completions client
//!
//! Production [`GenerativeBackend`]. Sends one user message per call,
//! retrying timeouts and connection failures with a fixed delay.

use crate::backends::deepseek_types::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::backends::{GenerationError, GenerativeBackend};
use crate::config::DeepSeekConfig;
use crate::orchestrator::utils::{char_len, clip_chars};
use async_trait::async_trait;
use std::time::Duration;

/// Appended to prompts cut to the configured maximum
pub const PROMPT_TRUNCATION_SUFFIX: &str =
    "...\n\nPlease produce a concise summary based on the content above.";

/// DeepSeek API client
pub struct DeepSeekClient {
    client: reqwest::Client,
    config: DeepSeekConfig,
}

impl DeepSeekClient {
    /// Create a client over a shared `reqwest::Client` (connection pooling)
    pub fn new(client: reqwest::Client, config: DeepSeekConfig) -> Self {
        Self { client, config }
    }

    /// Client configuration
    pub fn config(&self) -> &DeepSeekConfig {
        &self.config
    }

    /// Cut `prompt` to the configured maximum, adding the summary suffix
    pub fn cap_prompt(&self, prompt: &str) -> String {
        if char_len(prompt) <= self.config.max_prompt_chars {
            return prompt.to_string();
        }
        tracing::debug!(
            prompt_chars = char_len(prompt),
            max_prompt_chars = self.config.max_prompt_chars,
            "Truncating prompt"
        );
        clip_chars(prompt, self.config.max_prompt_chars, PROMPT_TRUNCATION_SUFFIX)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    /// One HTTP round trip
    async fn send_once(
        &self,
        api_key: &str,
        request_body: &ChatCompletionRequest,
    ) -> Result<String, GenerationError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key)
            .timeout(Duration::from_secs(self.config.timeout_secs))
            .json(request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout(self.config.timeout_secs)
                } else {
                    GenerationError::Connection(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error body".to_string());

            tracing::error!(
                status_code = status_code,
                error_body = %error_body,
                "DeepSeek API returned error status"
            );

            if status_code == 429 {
                return Err(GenerationError::RateLimited {
                    status: status_code,
                    body: error_body,
                });
            }
            return Err(GenerationError::Upstream {
                status: status_code,
                body: error_body,
            });
        }

        let response_body = response.text().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout(self.config.timeout_secs)
            } else {
                GenerationError::Connection(e.to_string())
            }
        })?;

        let parsed: ChatCompletionResponse = serde_json::from_str(&response_body)
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            GenerationError::InvalidResponse("response contains no choices".to_string())
        })?;

        let text = choice.message.content.unwrap_or_default();
        if text.trim().is_empty() {
            return Err(GenerationError::InvalidResponse(
                "response content is empty".to_string(),
            ));
        }

        tracing::debug!(
            response_len = text.len(),
            finish_reason = ?choice.finish_reason,
            "Received DeepSeek completion"
        );
        Ok(text)
    }
}

#[async_trait]
impl GenerativeBackend for DeepSeekClient {
    async fn complete(
        &self,
        prompt: &str,
        max_output_tokens: u32,
    ) -> Result<String, GenerationError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or(GenerationError::MissingApiKey)?;

        let request_body = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![ChatMessage::user(self.cap_prompt(prompt))],
            max_tokens: max_output_tokens.min(self.config.max_output_tokens),
            temperature: self.config.temperature,
            stream: false,
        };

        tracing::debug!(
            model = %self.config.model,
            max_tokens = request_body.max_tokens,
            prompt_chars = char_len(prompt),
            "Calling DeepSeek API"
        );

        let mut attempt = 0;
        loop {
            match self.send_once(api_key, &request_body).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        error = %e,
                        attempt = attempt,
                        max_retries = self.config.max_retries,
                        "DeepSeek request failed, retrying"
                    );
                    tokio::time::sleep(Duration::from_millis(self.config.retry_delay_ms)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
