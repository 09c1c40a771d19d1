//! OpenRouter chat-completion client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{truncate_body, ChatMessage, LlmClient, LlmError};
use crate::config::Config;

const MAX_ERROR_BODY: usize = 500;

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    /// OpenRouter reports some failures with a 200 and an `error` object.
    #[serde(default)]
    error: Option<UpstreamError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    message: String,
}

/// Client for `POST {base}/chat/completions`.
pub struct OpenRouterClient {
    http: Client,
    api_key: String,
    base_url: String,
    timeout: Duration,
}

impl OpenRouterClient {
    pub fn new(api_key: String, base_url: String, timeout: Duration) -> Result<Self, LlmError> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("prompt-relay/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, LlmError> {
        Self::new(
            config.api_key.clone(),
            config.openrouter_base_url.clone(),
            config.request_timeout(),
        )
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

#[async_trait]
impl LlmClient for OpenRouterClient {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
    ) -> Result<String, LlmError> {
        tracing::debug!(model = %model, messages = messages.len(), "Sending chat completion");

        let response = self
            .http
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", "http://localhost")
            .header("X-Title", "prompt-relay")
            .json(&CompletionRequest { model, messages })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout(self.timeout)
                } else {
                    LlmError::Http(e)
                }
            })?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: truncate_body(&body, MAX_ERROR_BODY),
            });
        }

        parse_reply(&body)
    }
}

fn parse_reply(body: &str) -> Result<String, LlmError> {
    let parsed: CompletionResponse =
        serde_json::from_str(body).map_err(|e| LlmError::Malformed(e.to_string()))?;

    if let Some(err) = parsed.error {
        return Err(LlmError::Upstream(err.message));
    }

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::Malformed("no choices in response".to_string()))?;

    match choice.message.content {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(LlmError::EmptyReply),
    }
}
