//! Hugging Face inference client used for image captions.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::{truncate_body, LlmError};
use crate::config::Config;

#[derive(Debug, Deserialize)]
struct Caption {
    #[serde(default)]
    generated_text: Option<String>,
}

pub struct HuggingFaceClient {
    http: Client,
    api_key: String,
    model_url: String,
    timeout: Duration,
}

impl HuggingFaceClient {
    /// Build a client, or `None` when no usable key is configured.
    pub fn from_config(config: &Config) -> Result<Option<Self>, LlmError> {
        let Some(api_key) = config.huggingface_key() else {
            return Ok(None);
        };
        let timeout = config.request_timeout();
        let http = Client::builder().timeout(timeout).build()?;
        let model_url = format!(
            "{}/models/{}",
            config.huggingface_base_url.trim_end_matches('/'),
            config.huggingface_model
        );
        Ok(Some(Self {
            http,
            api_key: api_key.to_string(),
            model_url,
            timeout,
        }))
    }

    /// Caption the image at `image_url`.
    pub async fn describe_image(&self, image_url: &str) -> Result<String, LlmError> {
        let response = self
            .http
            .post(&self.model_url)
            .bearer_auth(&self.api_key)
            .json(&json!({ "inputs": image_url }))
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
                body: truncate_body(&body, 500),
            });
        }

        let captions: Vec<Caption> =
            serde_json::from_str(&body).map_err(|e| LlmError::Malformed(e.to_string()))?;
        Ok(captions
            .into_iter()
            .next()
            .and_then(|c| c.generated_text)
            .unwrap_or_else(|| "Could not generate a description for the image.".to_string()))
    }
}
