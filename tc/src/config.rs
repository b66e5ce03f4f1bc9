//! TaktCouncil configuration types and loading

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::AgentRole;
use crate::orchestrator::OrchestratorConfig;

/// Main TaktCouncil configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// LLM provider configuration
    pub llm: LlmConfig,

    /// Per-role overrides, keyed by role id
    pub agents: BTreeMap<AgentRole, AgentSettings>,

    /// Orchestration behavior
    pub orchestrator: OrchestratorConfig,

    /// Prompt template locations
    pub prompts: PromptsConfig,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Checks that every provider used by the given roles has its API key
    /// environment variable set. Call this before starting a session to fail
    /// fast with a clear error message.
    pub fn validate(&self, roles: &[AgentRole]) -> Result<()> {
        debug!(role_count = roles.len(), "Config::validate: called");
        for role in roles {
            let resolved = self.resolve_role(*role)?;
            if std::env::var(&resolved.api_key_env).is_err() {
                return Err(eyre!(
                    "API key for provider '{}' (used by {}) not found. Set the {} environment variable.",
                    resolved.provider,
                    role,
                    resolved.api_key_env
                ));
            }
        }
        Ok(())
    }

    /// Resolve the provider/model a role should use
    pub fn resolve_role(&self, role: AgentRole) -> Result<ResolvedLlmConfig> {
        let settings = self.agents.get(&role);
        let selector = settings
            .and_then(|s| s.model.as_deref())
            .unwrap_or(self.llm.default.as_str());
        debug!(%role, %selector, "Config::resolve_role: called");

        let mut resolved = self.llm.resolve(selector)?;
        if let Some(max_tokens) = settings.and_then(|s| s.max_tokens) {
            debug!(%max_tokens, "Config::resolve_role: max-tokens override");
            resolved.max_tokens = max_tokens;
        }
        Ok(resolved)
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .taktcouncil.yml
        let local_config = PathBuf::from(".taktcouncil.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/taktcouncil/taktcouncil.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("taktcouncil").join("taktcouncil.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let path = match config_path {
            Some(p) => p.clone(),
            None => {
                let local = PathBuf::from(".taktcouncil.yml");
                if local.exists() {
                    local
                } else {
                    dirs::config_dir()?.join("taktcouncil").join("taktcouncil.yml")
                }
            }
        };
        let content = fs::read_to_string(path).ok()?;
        let config: Self = serde_yaml::from_str(&content).ok()?;
        config.log_level
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Wire protocol spoken by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Anthropic Messages API
    Anthropic,
    /// OpenAI Chat Completions API (and compatible endpoints)
    OpenAI,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anthropic => write!(f, "anthropic"),
            Self::OpenAI => write!(f, "openai"),
        }
    }
}

/// A hosted model provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Protocol used to talk to this provider
    pub kind: ProviderKind,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Models known to be served by this provider (informational)
    #[serde(default)]
    pub models: Vec<String>,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Default model in `provider/model` form
    pub default: String,

    /// Named providers
    pub providers: BTreeMap<String, ProviderConfig>,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        let mut providers = BTreeMap::new();
        providers.insert(
            "anthropic".to_string(),
            ProviderConfig {
                kind: ProviderKind::Anthropic,
                api_key_env: "ANTHROPIC_API_KEY".to_string(),
                base_url: "https://api.anthropic.com".to_string(),
                models: vec!["claude-sonnet-4-20250514".to_string()],
            },
        );
        providers.insert(
            "openai".to_string(),
            ProviderConfig {
                kind: ProviderKind::OpenAI,
                api_key_env: "OPENAI_API_KEY".to_string(),
                base_url: "https://api.openai.com".to_string(),
                models: vec!["gpt-4o".to_string()],
            },
        );
        providers.insert(
            "groq".to_string(),
            ProviderConfig {
                kind: ProviderKind::OpenAI,
                api_key_env: "GROQ_API_KEY".to_string(),
                base_url: "https://api.groq.com/openai".to_string(),
                models: vec!["llama-3.3-70b-versatile".to_string()],
            },
        );

        Self {
            default: "anthropic/claude-sonnet-4-20250514".to_string(),
            providers,
            max_tokens: 4096,
            timeout_ms: 120_000,
        }
    }
}

impl LlmConfig {
    /// Resolve a `provider/model` string into a concrete client configuration
    pub fn resolve(&self, selector: &str) -> Result<ResolvedLlmConfig> {
        debug!(%selector, "LlmConfig::resolve: called");
        let (provider, model) = selector
            .split_once('/')
            .ok_or_else(|| eyre!("Invalid model '{}': expected provider/model", selector))?;

        if model.is_empty() {
            return Err(eyre!("Invalid model '{}': model name is empty", selector));
        }

        let provider_config = self.providers.get(provider).ok_or_else(|| {
            eyre!(
                "Unknown LLM provider: '{}'. Configured: {}",
                provider,
                self.providers.keys().cloned().collect::<Vec<_>>().join(", ")
            )
        })?;

        Ok(ResolvedLlmConfig {
            provider: provider.to_string(),
            kind: provider_config.kind,
            model: model.to_string(),
            api_key_env: provider_config.api_key_env.clone(),
            base_url: provider_config.base_url.clone(),
            max_tokens: self.max_tokens,
            timeout_ms: self.timeout_ms,
        })
    }
}

/// Fully resolved settings for one client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLlmConfig {
    pub provider: String,
    pub kind: ProviderKind,
    pub model: String,
    pub api_key_env: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub timeout_ms: u64,
}

impl ResolvedLlmConfig {
    /// Read the API key from the configured environment variable
    pub fn get_api_key(&self) -> Result<String> {
        std::env::var(&self.api_key_env)
            .map_err(|_| eyre!("API key not found. Set the {} environment variable.", self.api_key_env))
    }
}

/// Per-role overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Model in `provider/model` form
    pub model: Option<String>,

    /// Maximum tokens for this role
    #[serde(rename = "max-tokens")]
    pub max_tokens: Option<u32>,
}

/// Prompt template locations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory of `.pmt` overrides
    pub dir: Option<PathBuf>,
}
