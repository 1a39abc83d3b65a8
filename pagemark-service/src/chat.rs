//! Client for an OpenAI-compatible chat-completion API.

use std::future::Future;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::ChatConfig;
use crate::error::{ChatError, ServiceResult};

/// A single message in a chat-completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Seam for substituting the hosted model with a test double.
pub trait ChatCompleter {
    fn complete(
        &self,
        messages: Vec<ChatMessage>,
    ) -> impl Future<Output = ServiceResult<String>> + Send;
}

/// Chat-completion API client
pub struct ChatClient {
    client: Client,
    config: ChatConfig,
}

impl ChatClient {
    /// Create a new client from an explicit configuration
    pub fn new(config: ChatConfig) -> ServiceResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ChatError::Connection {
                url: config.base_url.clone(),
                source: e,
            })?;

        Ok(Self { client, config })
    }

    /// Check if the chat backend is reachable
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/v1/models", self.config.base_url);

        match self
            .client
            .get(&url)
            .bearer_auth(&self.config.api_key)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                warn!(error = %e, "Chat backend health check failed");
                false
            }
        }
    }
}

impl ChatCompleter for ChatClient {
    fn complete(
        &self,
        messages: Vec<ChatMessage>,
    ) -> impl Future<Output = ServiceResult<String>> + Send {
        async move {
            let url = format!("{}/v1/chat/completions", self.config.base_url);

            let request = CompletionRequest {
                model: self.config.model.clone(),
                messages,
                max_tokens: self.config.max_output_tokens,
            };

            let response = self
                .client
                .post(&url)
                .bearer_auth(&self.config.api_key)
                .json(&request)
                .send()
                .await
                .map_err(|e| ChatError::Connection {
                    url: url.clone(),
                    source: e,
                })?;

            if !response.status().is_success() {
                let status = response.status().as_u16();
                let message = response.text().await.unwrap_or_default();
                return Err(ChatError::Completion { status, message }.into());
            }

            let completion: CompletionResponse =
                response
                    .json()
                    .await
                    .map_err(|e| ChatError::InvalidResponse {
                        message: e.to_string(),
                    })?;

            let choice = completion.choices.into_iter().next().ok_or_else(|| {
                ChatError::InvalidResponse {
                    message: "response contained no choices".to_string(),
                }
            })?;

            Ok(choice.message.content)
        }
    }
}

// Wire types for the chat-completions endpoint

#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: String,
}
