//! Error taxonomy shared by the detector crates

use std::time::Duration;
use thiserror::Error;

/// A single oracle call could not produce a usable verdict.
///
/// Always recovered per file: the orchestrator swaps in a fallback result.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OracleError {
    #[error("oracle call timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("oracle transport failure: {0}")]
    Transport(String),

    #[error("oracle returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("oracle returned an empty response")]
    EmptyResponse,

    #[error("malformed oracle response: {0}")]
    MalformedResponse(String),
}

/// Startup configuration is unusable. Fatal: the detector refuses to start.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no credential for provider `{provider}`; set {var}")]
    MissingCredential { provider: String, var: String },

    #[error("invalid value `{value}` for {key}")]
    Invalid { key: String, value: String },

    #[error("unknown oracle provider `{0}`")]
    UnknownProvider(String),

    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}
