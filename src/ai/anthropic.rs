//! Anthropic messages adapter.
//!
//! The messages API takes the system prompt out of band, so the DDL is
//! folded into the system string rather than sent as a message.

use crate::ai::provider::{AiProvider, CompletionRequest, ProviderError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const PROVIDER_TAG: &str = "anthropic";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 2048;

pub struct AnthropicProvider {
    http_client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl AnthropicProvider {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let http_client = Client::builder()
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            http_client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            timeout,
        }
    }

    fn build_request(&self, request: &CompletionRequest) -> MessagesRequest {
        let mut messages = Vec::with_capacity(request.history.len() * 2 + 1);
        for turn in &request.history {
            messages.push(Message {
                role: "user".to_string(),
                content: turn.user.clone(),
            });
            messages.push(Message {
                role: "assistant".to_string(),
                content: turn.assistant.clone(),
            });
        }
        messages.push(Message {
            role: "user".to_string(),
            content: request.message.clone(),
        });

        MessagesRequest {
            model: self.model.clone(),
            max_tokens: MAX_TOKENS,
            system: format!(
                "{}\nDatabase DDL:\n{}",
                request.system_prompt, request.schema_ddl
            ),
            messages,
        }
    }
}

#[async_trait]
impl AiProvider for AnthropicProvider {
    fn provider_tag(&self) -> &'static str {
        PROVIDER_TAG
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let body = self.build_request(request);
        let url = format!("{}/v1/messages", self.base_url.trim_end_matches('/'));
        debug!(model = %self.model, url = %url, "Calling Anthropic messages API");

        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout {
                        provider: PROVIDER_TAG.to_string(),
                        elapsed_secs: self.timeout.as_secs(),
                    }
                } else {
                    ProviderError::Network {
                        provider: PROVIDER_TAG.to_string(),
                        message: e.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Auth {
                provider: PROVIDER_TAG.to_string(),
                message: body,
            });
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(ProviderError::RateLimited {
                provider: PROVIDER_TAG.to_string(),
                retry_after_secs,
            });
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ProviderError::Network {
                provider: PROVIDER_TAG.to_string(),
                message: format!("API error {}: {}", status, body),
            });
        }

        let messages_response: MessagesResponse =
            response.json().await.map_err(|e| ProviderError::MalformedResponse {
                provider: PROVIDER_TAG.to_string(),
                message: e.to_string(),
            })?;

        let text: String = messages_response
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(ProviderError::MalformedResponse {
                provider: PROVIDER_TAG.to_string(),
                message: "No text blocks in response".to_string(),
            });
        }
        Ok(text)
    }
}

// ============================================================================
// Anthropic API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    system: String,
    messages: Vec<Message>,
}

#[derive(Debug, Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ddl_folded_into_system() {
        let provider = AnthropicProvider::new(
            "https://api.anthropic.com",
            "key",
            "claude-3-5-sonnet",
            Duration::from_secs(30),
        );
        let request = CompletionRequest::new("be helpful", "CREATE TABLE t (id int);", "hi");
        let body = provider.build_request(&request);

        assert!(body.system.contains("be helpful"));
        assert!(body.system.contains("Database DDL:"));
        assert_eq!(body.messages.len(), 1);
        assert_eq!(body.messages[0].role, "user");
        assert_eq!(body.max_tokens, MAX_TOKENS);
    }
}
