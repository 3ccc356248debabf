use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, warn};

use crate::error::{OpenRouterError, Result};
use crate::types::*;

pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_MODEL: &str = "google/gemini-2.5-pro";

/// A text-in, text-out language model.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String>;
}

/// Client for OpenRouter API
#[derive(Clone)]
pub struct OpenRouterClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OpenRouterClient {
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
        temperature: Option<f32>,
        max_tokens: Option<u32>,
    ) -> Result<String> {
        debug!(
            "Creating chat completion with {} messages, model {}",
            messages.len(),
            self.model
        );

        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages,
            temperature,
            max_tokens,
            stream: Some(false),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                warn!("Rate limited by OpenRouter");
                return Err(OpenRouterError::RateLimited { retry_after: None });
            }

            if let Ok(error_resp) = serde_json::from_str::<OpenRouterErrorBody>(&error_text) {
                error!(
                    "OpenRouter API error: {} (type: {:?})",
                    error_resp.error.message, error_resp.error.error_type
                );
                return Err(OpenRouterError::Api {
                    message: error_resp.error.message,
                    status_code: Some(status.as_u16()),
                });
            }

            return Err(OpenRouterError::Api {
                message: error_text,
                status_code: Some(status.as_u16()),
            });
        }

        let chat_response: ChatCompletionResponse =
            response.json().await.map_err(|e| self.classify(e))?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or(OpenRouterError::EmptyCompletion)
    }

    fn classify(&self, err: reqwest::Error) -> OpenRouterError {
        if err.is_timeout() {
            OpenRouterError::Timeout(self.timeout.as_secs())
        } else {
            OpenRouterError::Http(err)
        }
    }
}

#[async_trait]
impl CompletionService for OpenRouterClient {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String> {
        self.chat_completion(messages, None, None).await
    }
}
