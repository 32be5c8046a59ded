use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::GenerationProvider;
use super::types::GenerationRequest;
use crate::core::config::GenerationConfig;
use crate::core::errors::ApiError;

/// OpenAI-compatible chat-completions provider.
#[derive(Clone)]
pub struct OpenAiProvider {
    base_url: String,
    model: String,
    api_key: String,
    client: Client,
}

impl OpenAiProvider {
    pub fn from_config(config: &GenerationConfig) -> Result<Self, ApiError> {
        let api_key = std::env::var(&config.api_key_env).unwrap_or_default();
        if api_key.is_empty() {
            tracing::warn!(
                "{} is not set; synthesis calls will fail until it is",
                config.api_key_env
            );
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ApiError::internal)?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            api_key,
            client,
        })
    }
}

#[async_trait]
impl GenerationProvider for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: GenerationRequest) -> Result<String, ApiError> {
        if self.api_key.is_empty() {
            return Err(ApiError::SynthesisFailed(
                "generation API key is not configured".to_string(),
            ));
        }

        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = json!({
            "model": self.model,
            "messages": request.messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
            "stream": false,
        });

        // A timeout here is indistinguishable from any other failed call.
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(ApiError::synthesis)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::SynthesisFailed(format!(
                "provider returned {}: {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(ApiError::synthesis)?;
        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        if content.is_empty() {
            return Err(ApiError::SynthesisFailed(
                "provider returned an empty completion".to_string(),
            ));
        }

        Ok(content)
    }
}
