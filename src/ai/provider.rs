//! AI provider capability surface.
//!
//! Providers expose a single `complete` operation: prompt context in, text
//! out. The transports behind it (OpenAI, Anthropic) are consumed as-is;
//! this module only defines the contract and the error taxonomy the
//! orchestrator's retry policy depends on.

use async_trait::async_trait;
use thiserror::Error;

/// One prior exchange in the conversation.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub user: String,
    pub assistant: String,
}

/// Context for a single completion call. Built fresh per orchestration
/// step, never persisted.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// Active system prompt for the role being invoked
    pub system_prompt: String,
    /// Schema rendered as dialect-specific DDL text
    pub schema_ddl: String,
    /// Prior turns, oldest first, already bounded by the session
    pub history: Vec<ChatTurn>,
    /// The current user message
    pub message: String,
}

impl CompletionRequest {
    pub fn new(
        system_prompt: impl Into<String>,
        schema_ddl: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            schema_ddl: schema_ddl.into(),
            history: Vec::new(),
            message: message.into(),
        }
    }

    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.history = history;
        self
    }
}

/// Errors surfaced by provider adapters.
///
/// All kinds are surfaced to the orchestrator, which decides whether to
/// retry: rate limits, network failures and timeouts are transient;
/// authentication failures and malformed responses are not.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider}: authentication failed: {message}")]
    Auth { provider: String, message: String },

    #[error("{provider}: rate limited")]
    RateLimited {
        provider: String,
        /// Server-suggested wait, when the response carried one
        retry_after_secs: Option<u64>,
    },

    #[error("{provider}: malformed response: {message}")]
    MalformedResponse { provider: String, message: String },

    #[error("{provider}: network failure: {message}")]
    Network { provider: String, message: String },

    #[error("{provider}: request timed out after {elapsed_secs}s")]
    Timeout { provider: String, elapsed_secs: u64 },
}

impl ProviderError {
    /// Whether a retry with the same request can reasonably succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::Network { .. } | Self::Timeout { .. }
        )
    }

    /// Short kind name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth { .. } => "auth",
            Self::RateLimited { .. } => "rate_limited",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::Network { .. } => "network",
            Self::Timeout { .. } => "timeout",
        }
    }
}

/// Polymorphic capability over {send a prompt + context, receive text}.
#[async_trait]
pub trait AiProvider: Send + Sync {
    /// Provider tag, e.g. "openai" or "anthropic".
    fn provider_tag(&self) -> &'static str;

    /// Model identifier this adapter was configured with.
    fn model(&self) -> &str;

    /// Send the prompt context and return the completion text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;
}
