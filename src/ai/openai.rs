//! OpenAI chat-completions adapter.
//!
//! Works against any OpenAI-compatible endpoint. The DDL rides in a second
//! system message so the question itself stays a clean user turn.

use crate::ai::provider::{AiProvider, CompletionRequest, ProviderError};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const PROVIDER_TAG: &str = "openai";

pub struct OpenAiProvider {
    http_client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiProvider {
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

    fn build_messages(&self, request: &CompletionRequest) -> Vec<ChatMessage> {
        let mut messages = vec![
            ChatMessage {
                role: "system".to_string(),
                content: request.system_prompt.clone(),
            },
            ChatMessage {
                role: "system".to_string(),
                content: format!("Database DDL:\n{}", request.schema_ddl),
            },
        ];

        for turn in &request.history {
            messages.push(ChatMessage {
                role: "user".to_string(),
                content: turn.user.clone(),
            });
            messages.push(ChatMessage {
                role: "assistant".to_string(),
                content: turn.assistant.clone(),
            });
        }

        messages.push(ChatMessage {
            role: "user".to_string(),
            content: request.message.clone(),
        });
        messages
    }
}

#[async_trait]
impl AiProvider for OpenAiProvider {
    fn provider_tag(&self) -> &'static str {
        PROVIDER_TAG
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        let chat_request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: self.build_messages(request),
        };

        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        debug!(model = %self.model, url = %url, "Calling OpenAI chat completion");

        let response = self
            .http_client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&chat_request)
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

        let chat_response: ChatCompletionResponse =
            response.json().await.map_err(|e| ProviderError::MalformedResponse {
                provider: PROVIDER_TAG.to_string(),
                message: e.to_string(),
            })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ProviderError::MalformedResponse {
                provider: PROVIDER_TAG.to_string(),
                message: "Empty completion in response".to_string(),
            })
    }
}

// ============================================================================
// OpenAI API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_order() {
        let provider = OpenAiProvider::new(
            "https://api.openai.com/v1",
            "key",
            "gpt-4o",
            Duration::from_secs(30),
        );
        let request = CompletionRequest::new("be helpful", "CREATE TABLE t (id int);", "hi")
            .with_history(vec![crate::ai::provider::ChatTurn {
                user: "earlier question".into(),
                assistant: "earlier answer".into(),
            }]);

        let messages = provider.build_messages(&request);
        let roles: Vec<_> = messages.iter().map(|m| m.role.as_str()).collect();
        assert_eq!(roles, vec!["system", "system", "user", "assistant", "user"]);
        assert!(messages[1].content.starts_with("Database DDL:"));
        assert_eq!(messages.last().unwrap().content, "hi");
    }
}
