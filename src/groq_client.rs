use crate::config::GroqConfig;
use crate::models::chat::ChatTurn;
use crate::services::refinement::{completion_messages, PromptRefiner, RefineError, MAX_TOKENS, TEMPERATURE};
use async_trait::async_trait;
use backoff::{future::retry, ExponentialBackoff};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client for Groq's OpenAI-compatible chat completions API.
#[derive(Debug, Clone)]
pub struct GroqClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    timeout: Duration,
    retry_max_elapsed: Duration,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatTurn>,
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl GroqClient {
    pub fn new(config: &GroqConfig) -> Self {
        Self {
            client: Client::new(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            timeout: config.timeout,
            retry_max_elapsed: config.retry_max_elapsed,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn complete(&self, conversation: &[ChatTurn]) -> Result<String, RefineError> {
        let request = CompletionRequest {
            model: self.model.clone(),
            messages: completion_messages(conversation),
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        tracing::debug!("Groq API Request messages count: {}", request.messages.len());

        let response = if self.retry_max_elapsed.is_zero() {
            self.send_once(&request).await.map_err(into_inner)?
        } else {
            let backoff_config = ExponentialBackoff {
                initial_interval: Duration::from_secs(1),
                max_interval: Duration::from_secs(30),
                multiplier: 2.0,
                max_elapsed_time: Some(self.retry_max_elapsed),
                ..Default::default()
            };
            retry(backoff_config, || self.send_once(&request)).await?
        };

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(RefineError::EmptyCompletion);
        }
        Ok(text)
    }

    async fn send_once(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, backoff::Error<RefineError>> {
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    tracing::warn!("Groq API connection error: {}", e);
                    backoff::Error::transient(RefineError::Http(e))
                } else {
                    tracing::error!("Groq API request error: {}", e);
                    backoff::Error::permanent(RefineError::Http(e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = RefineError::Api { status: status.as_u16(), body };
            // 429 and 5xx are worth another attempt
            return if status.as_u16() == 429 || status.is_server_error() {
                tracing::warn!("Groq API returned {}: {}", status, err);
                Err(backoff::Error::transient(err))
            } else {
                tracing::error!("Groq API permanent error ({}): {}", status, err);
                Err(backoff::Error::permanent(err))
            };
        }

        response
            .json::<CompletionResponse>()
            .await
            .map_err(|e| backoff::Error::permanent(RefineError::Http(e)))
    }
}

fn into_inner(err: backoff::Error<RefineError>) -> RefineError {
    match err {
        backoff::Error::Permanent(e) => e,
        backoff::Error::Transient { err, .. } => err,
    }
}

#[async_trait]
impl PromptRefiner for GroqClient {
    async fn refine(&self, conversation: &[ChatTurn]) -> Result<String, RefineError> {
        self.complete(conversation).await
    }
}
