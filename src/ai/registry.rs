//! Model factory and registry.
//!
//! `provider:model` pairs from configuration are resolved to concrete
//! adapter instances once at startup. Unknown provider tags and missing
//! credentials are fatal configuration errors - they fail the process
//! before any conversation starts, not at call time. The registry is
//! read-only afterwards; role lookup is O(1) and an unconfigured role is
//! `None`, never a crash.

use crate::ai::anthropic::AnthropicProvider;
use crate::ai::openai::OpenAiProvider;
use crate::ai::provider::AiProvider;
use crate::config::{Config, ConfigError};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Closed set of supported provider tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderTag {
    OpenAi,
    Anthropic,
}

impl ProviderTag {
    /// Parse a provider tag; unknown tags are a fatal configuration error.
    pub fn parse(tag: &str) -> Result<Self, ConfigError> {
        match tag.trim().to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }
}

impl std::fmt::Display for ProviderTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated `provider:model` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub provider: ProviderTag,
    pub model: String,
}

impl ModelSpec {
    /// Parse a "provider:model" string.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let (provider, model) = s
            .split_once(':')
            .ok_or_else(|| ConfigError::InvalidModelSpec(s.to_string()))?;
        let model = model.trim();
        if model.is_empty() {
            return Err(ConfigError::InvalidModelSpec(s.to_string()));
        }
        Ok(Self {
            provider: ProviderTag::parse(provider)?,
            model: model.to_string(),
        })
    }
}

impl std::fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.provider, self.model)
    }
}

/// Orchestration roles a model can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Expert,
    Reviewer,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Expert => write!(f, "expert"),
            Self::Reviewer => write!(f, "reviewer"),
        }
    }
}

/// One registered model with its instantiated adapter.
pub struct RegistryEntry {
    pub spec: ModelSpec,
    pub adapter: Arc<dyn AiProvider>,
}

/// Process-wide model registry, built once at startup and read-only after.
pub struct ModelRegistry {
    entries: Vec<RegistryEntry>,
    expert: Option<Arc<dyn AiProvider>>,
    reviewer: Option<Arc<dyn AiProvider>>,
}

/// Credentials and endpoints needed to instantiate adapters.
#[derive(Debug, Clone)]
pub struct ProviderCredentials {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub openai_base_url: String,
    pub anthropic_base_url: String,
}

impl ProviderCredentials {
    fn from_config(config: &Config) -> Self {
        Self {
            openai_api_key: config.openai_api_key.clone(),
            anthropic_api_key: config.anthropic_api_key.clone(),
            openai_base_url: config.openai_base_url.clone(),
            anthropic_base_url: config.anthropic_base_url.clone(),
        }
    }
}

impl ModelRegistry {
    /// Build the registry from configuration. Fails fast on unknown
    /// provider tags and missing credentials.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let credentials = ProviderCredentials::from_config(config);
        let timeout = config.ai_timeout_duration();

        let specs: Vec<ModelSpec> = config
            .models
            .iter()
            .map(|s| ModelSpec::parse(s))
            .collect::<Result<_, _>>()?;

        let mut entries = Vec::with_capacity(specs.len());
        for spec in &specs {
            let adapter = make_adapter(spec, &credentials, timeout)?;
            entries.push(RegistryEntry {
                spec: spec.clone(),
                adapter,
            });
        }

        // Role binding: explicit overrides win; otherwise the first listed
        // model is the expert and the second (or first) the reviewer.
        let expert = match &config.expert {
            Some(s) => {
                let spec = ModelSpec::parse(s)?;
                Some(resolve(&entries, &spec, &credentials, timeout)?)
            }
            None => entries.first().map(|e| Arc::clone(&e.adapter)),
        };

        let reviewer = match &config.reviewer {
            Some(s) => {
                let spec = ModelSpec::parse(s)?;
                Some(resolve(&entries, &spec, &credentials, timeout)?)
            }
            None => entries
                .get(1)
                .or_else(|| entries.first())
                .map(|e| Arc::clone(&e.adapter)),
        };

        if let Some(p) = &expert {
            info!(provider = p.provider_tag(), model = p.model(), "Expert model configured");
        }
        if let Some(p) = &reviewer {
            info!(provider = p.provider_tag(), model = p.model(), "Reviewer model configured");
        }

        Ok(Self {
            entries,
            expert,
            reviewer,
        })
    }

    /// Build a registry from pre-built adapters, bypassing configuration.
    /// Useful when embedding the pipeline with custom providers.
    pub fn from_adapters(
        expert: Option<Arc<dyn AiProvider>>,
        reviewer: Option<Arc<dyn AiProvider>>,
    ) -> Self {
        Self {
            entries: Vec::new(),
            expert,
            reviewer,
        }
    }

    /// Look up the adapter bound to a role. `None` means the role is
    /// unconfigured; orchestration for that role is skipped.
    pub fn get(&self, role: Role) -> Option<Arc<dyn AiProvider>> {
        match role {
            Role::Expert => self.expert.clone(),
            Role::Reviewer => self.reviewer.clone(),
        }
    }

    /// All registered models, in configured order.
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    /// Formatted `provider:model` choices.
    pub fn model_choices(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.spec.to_string()).collect()
    }
}

/// Reuse the already-built adapter when the override names a listed model.
fn resolve(
    entries: &[RegistryEntry],
    spec: &ModelSpec,
    credentials: &ProviderCredentials,
    timeout: Duration,
) -> Result<Arc<dyn AiProvider>, ConfigError> {
    if let Some(entry) = entries.iter().find(|e| &e.spec == spec) {
        return Ok(Arc::clone(&entry.adapter));
    }
    make_adapter(spec, credentials, timeout)
}

fn make_adapter(
    spec: &ModelSpec,
    credentials: &ProviderCredentials,
    timeout: Duration,
) -> Result<Arc<dyn AiProvider>, ConfigError> {
    match spec.provider {
        ProviderTag::OpenAi => {
            let api_key = credentials.openai_api_key.as_ref().ok_or(
                ConfigError::MissingCredential {
                    provider: "openai".to_string(),
                    env_var: "OPENAI_API_KEY",
                },
            )?;
            Ok(Arc::new(OpenAiProvider::new(
                &credentials.openai_base_url,
                api_key,
                &spec.model,
                timeout,
            )))
        }
        ProviderTag::Anthropic => {
            let api_key = credentials.anthropic_api_key.as_ref().ok_or(
                ConfigError::MissingCredential {
                    provider: "anthropic".to_string(),
                    env_var: "ANTHROPIC_API_KEY",
                },
            )?;
            Ok(Arc::new(AnthropicProvider::new(
                &credentials.anthropic_base_url,
                api_key,
                &spec.model,
                timeout,
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Command;

    fn config_with_models(models: Vec<&str>) -> Config {
        Config {
            databases: vec!["sqlite:test.db".to_string()],
            models: models.into_iter().map(String::from).collect(),
            expert: None,
            reviewer: None,
            expert_prompt: None,
            reviewer_prompt: None,
            openai_api_key: Some("sk-test".to_string()),
            anthropic_api_key: Some("sk-ant-test".to_string()),
            openai_base_url: "https://api.openai.com/v1".to_string(),
            anthropic_base_url: "https://api.anthropic.com".to_string(),
            query_timeout: 30,
            connect_timeout: 10,
            ai_timeout: 90,
            row_limit: 100,
            history_turns: 20,
            log_level: "info".to_string(),
            json_logs: false,
            command: Command::Ddl { connection: None },
        }
    }

    #[test]
    fn test_model_spec_parse() {
        let spec = ModelSpec::parse("openai:gpt-4o").unwrap();
        assert_eq!(spec.provider, ProviderTag::OpenAi);
        assert_eq!(spec.model, "gpt-4o");

        let spec = ModelSpec::parse("Anthropic:claude-3-5-sonnet").unwrap();
        assert_eq!(spec.provider, ProviderTag::Anthropic);
    }

    #[test]
    fn test_model_spec_unknown_provider_is_fatal() {
        let result = ModelSpec::parse("mistral:large");
        assert!(matches!(result, Err(ConfigError::UnknownProvider(_))));
    }

    #[test]
    fn test_model_spec_missing_colon() {
        let result = ModelSpec::parse("gpt-4o");
        assert!(matches!(result, Err(ConfigError::InvalidModelSpec(_))));
    }

    #[test]
    fn test_model_spec_empty_model() {
        let result = ModelSpec::parse("openai:");
        assert!(matches!(result, Err(ConfigError::InvalidModelSpec(_))));
    }

    #[test]
    fn test_default_role_binding_two_models() {
        let config = config_with_models(vec!["openai:gpt-4o", "anthropic:claude-3-5-sonnet"]);
        let registry = ModelRegistry::from_config(&config).unwrap();

        let expert = registry.get(Role::Expert).unwrap();
        let reviewer = registry.get(Role::Reviewer).unwrap();
        assert_eq!(expert.provider_tag(), "openai");
        assert_eq!(reviewer.provider_tag(), "anthropic");
    }

    #[test]
    fn test_single_model_doubles_as_reviewer() {
        let config = config_with_models(vec!["openai:gpt-4o"]);
        let registry = ModelRegistry::from_config(&config).unwrap();

        assert!(registry.get(Role::Expert).is_some());
        let reviewer = registry.get(Role::Reviewer).unwrap();
        assert_eq!(reviewer.provider_tag(), "openai");
    }

    #[test]
    fn test_no_models_leaves_roles_unconfigured() {
        let config = config_with_models(vec![]);
        let registry = ModelRegistry::from_config(&config).unwrap();

        assert!(registry.get(Role::Expert).is_none());
        assert!(registry.get(Role::Reviewer).is_none());
    }

    #[test]
    fn test_explicit_role_override() {
        let mut config = config_with_models(vec!["openai:gpt-4o", "anthropic:claude-3-5-sonnet"]);
        config.expert = Some("anthropic:claude-3-5-sonnet".to_string());
        let registry = ModelRegistry::from_config(&config).unwrap();

        let expert = registry.get(Role::Expert).unwrap();
        assert_eq!(expert.provider_tag(), "anthropic");
    }

    #[test]
    fn test_missing_credential_is_fatal() {
        let mut config = config_with_models(vec!["openai:gpt-4o"]);
        config.openai_api_key = None;
        let result = ModelRegistry::from_config(&config);
        assert!(matches!(
            result,
            Err(ConfigError::MissingCredential { .. })
        ));
    }

    #[test]
    fn test_model_choices() {
        let config = config_with_models(vec!["openai:gpt-4o", "anthropic:claude-3-5-sonnet"]);
        let registry = ModelRegistry::from_config(&config).unwrap();
        assert_eq!(
            registry.model_choices(),
            vec!["openai:gpt-4o", "anthropic:claude-3-5-sonnet"]
        );
    }
}
