//! Specsniff Core — classification data model, fingerprints, errors and configuration

pub mod model;
pub mod fingerprint;
pub mod error;
pub mod config;


pub use model::{
    ClassificationRequest, ClassificationResult, SpecType, FALLBACK_CONFIDENCE, MAX_CONFIDENCE,
    MIN_CONFIDENCE,
};
pub use fingerprint::{Fingerprint, fingerprint};
pub use error::{OracleError, ConfigError};
pub use config::{DetectorConfig, ProviderKind};
