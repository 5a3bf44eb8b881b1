//! Oracle provider implementations

pub mod openai;
pub mod anthropic;
pub mod local;

use super::bridge::OracleProvider;
use crate::prompt::truncate_content;
use specsniff_core::{ConfigError, DetectorConfig, OracleError, ProviderKind};
use std::sync::Arc;
use std::time::Duration;

/// Factory function to create oracle providers.
///
/// Remote providers refuse to start without a credential.
pub fn create_provider(config: &DetectorConfig) -> Result<Arc<dyn OracleProvider>, ConfigError> {
    match config.provider {
        ProviderKind::Anthropic => Ok(Arc::new(anthropic::AnthropicProvider::from_config(config)?)),
        ProviderKind::OpenAI => Ok(Arc::new(openai::OpenAIProvider::from_config(config)?)),
        ProviderKind::Local => Ok(Arc::new(local::LocalProvider::new())),
    }
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, ConfigError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ConfigError::InvalidSetting(format!("cannot build HTTP client: {e}")))
}

pub(crate) fn transport_error(err: reqwest::Error, timeout: Duration) -> OracleError {
    if err.is_timeout() {
        OracleError::Timeout(timeout)
    } else {
        OracleError::Transport(err.to_string())
    }
}

/// Longest error body kept; it ends up in fallback reasoning
pub(crate) const MAX_ERROR_BODY_CHARS: usize = 500;

/// Turn a non-success response into an error carrying status and body
pub(crate) async fn status_error(response: reqwest::Response) -> OracleError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let (body, _) = truncate_content(&body, MAX_ERROR_BODY_CHARS);
    OracleError::Status {
        status,
        body: body.to_string(),
    }
}
