//! Detector configuration loaded from the environment

use crate::error::ConfigError;
use std::str::FromStr;
use std::time::Duration;

pub const ENV_PROVIDER: &str = "SPECSNIFF_PROVIDER";
pub const ENV_API_KEY: &str = "SPECSNIFF_API_KEY";
pub const ENV_BASE_URL: &str = "SPECSNIFF_BASE_URL";
pub const ENV_MODEL: &str = "SPECSNIFF_MODEL";
pub const ENV_MAX_TOKENS: &str = "SPECSNIFF_MAX_TOKENS";
pub const ENV_TIMEOUT_MS: &str = "SPECSNIFF_TIMEOUT_MS";
pub const ENV_DAILY_BUDGET_USD: &str = "SPECSNIFF_DAILY_BUDGET_USD";
pub const ENV_CACHE_TTL_SECS: &str = "SPECSNIFF_CACHE_TTL_SECS";
pub const ENV_GROUP_SIZE: &str = "SPECSNIFF_GROUP_SIZE";
pub const ENV_GROUP_DELAY_MS: &str = "SPECSNIFF_GROUP_DELAY_MS";
pub const ENV_MAX_CONTENT_CHARS: &str = "SPECSNIFF_MAX_CONTENT_CHARS";
pub const ENV_SPEC_THRESHOLD: &str = "SPECSNIFF_SPEC_THRESHOLD";

/// Which oracle backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Anthropic,
    OpenAI,
    /// Offline heuristics; free and credential-less.
    Local,
}

impl ProviderKind {
    pub fn name(&self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAI => "openai",
            ProviderKind::Local => "local",
        }
    }

    /// Provider-specific credential variable, if the provider needs one.
    pub fn credential_var(&self) -> Option<&'static str> {
        match self {
            ProviderKind::Anthropic => Some("ANTHROPIC_API_KEY"),
            ProviderKind::OpenAI => Some("OPENAI_API_KEY"),
            ProviderKind::Local => None,
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Ok(ProviderKind::Anthropic),
            "openai" | "openrouter" => Ok(ProviderKind::OpenAI),
            "local" => Ok(ProviderKind::Local),
            other => Err(ConfigError::UnknownProvider(other.to_string())),
        }
    }
}

/// Everything the detector needs to start.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub provider: ProviderKind,
    pub api_key: Option<String>,
    /// Overrides the provider's default endpoint.
    pub base_url: Option<String>,
    /// Overrides the provider's default (low-cost) model.
    pub model: Option<String>,
    pub max_tokens: u32,
    pub timeout: Duration,
    pub daily_budget_usd: f64,
    pub cache_ttl: Duration,
    pub group_size: usize,
    pub group_delay: Duration,
    pub max_content_chars: usize,
    pub spec_threshold: u8,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Anthropic,
            api_key: None,
            base_url: None,
            model: None,
            max_tokens: 1000,
            timeout: Duration::from_millis(10_000),
            daily_budget_usd: 10.0,
            cache_ttl: Duration::from_secs(86_400),
            group_size: 10,
            group_delay: Duration::from_millis(1000),
            max_content_chars: 8000,
            spec_threshold: 7,
        }
    }
}

impl DetectorConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(provider) = get(ENV_PROVIDER) {
            config.provider = provider.parse()?;
        }
        let provider = config.provider;
        config.api_key = get(ENV_API_KEY)
            .or_else(|| provider.credential_var().and_then(|var| get(var)));
        config.base_url = get(ENV_BASE_URL);
        config.model = get(ENV_MODEL);

        if let Some(v) = get(ENV_MAX_TOKENS) {
            config.max_tokens = parse_value(ENV_MAX_TOKENS, &v)?;
        }
        if let Some(v) = get(ENV_TIMEOUT_MS) {
            config.timeout = Duration::from_millis(parse_value(ENV_TIMEOUT_MS, &v)?);
        }
        if let Some(v) = get(ENV_DAILY_BUDGET_USD) {
            config.daily_budget_usd = parse_value(ENV_DAILY_BUDGET_USD, &v)?;
        }
        if let Some(v) = get(ENV_CACHE_TTL_SECS) {
            config.cache_ttl = Duration::from_secs(parse_value(ENV_CACHE_TTL_SECS, &v)?);
        }
        if let Some(v) = get(ENV_GROUP_SIZE) {
            config.group_size = parse_value(ENV_GROUP_SIZE, &v)?;
        }
        if let Some(v) = get(ENV_GROUP_DELAY_MS) {
            config.group_delay = Duration::from_millis(parse_value(ENV_GROUP_DELAY_MS, &v)?);
        }
        if let Some(v) = get(ENV_MAX_CONTENT_CHARS) {
            config.max_content_chars = parse_value(ENV_MAX_CONTENT_CHARS, &v)?;
        }
        if let Some(v) = get(ENV_SPEC_THRESHOLD) {
            config.spec_threshold = parse_value(ENV_SPEC_THRESHOLD, &v)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject settings the orchestrator cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.group_size == 0 {
            return Err(ConfigError::InvalidSetting("group size must be at least 1".into()));
        }
        if !self.daily_budget_usd.is_finite() || self.daily_budget_usd < 0.0 {
            return Err(ConfigError::InvalidSetting(format!(
                "daily budget must be a non-negative amount, got {}",
                self.daily_budget_usd
            )));
        }
        if self.spec_threshold > crate::model::MAX_CONFIDENCE {
            return Err(ConfigError::InvalidSetting(format!(
                "spec threshold must be at most {}, got {}",
                crate::model::MAX_CONFIDENCE,
                self.spec_threshold
            )));
        }
        if self.max_content_chars == 0 {
            return Err(ConfigError::InvalidSetting("max content chars must be at least 1".into()));
        }
        Ok(())
    }

    /// The credential, or the error a remote provider should fail with.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or_else(|| ConfigError::MissingCredential {
            provider: self.provider.name().to_string(),
            var: self
                .provider
                .credential_var()
                .map(|var| format!("{var} or {ENV_API_KEY}"))
                .unwrap_or_else(|| ENV_API_KEY.to_string()),
        })
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        key: key.to_string(),
        value: value.to_string(),
    })
}
