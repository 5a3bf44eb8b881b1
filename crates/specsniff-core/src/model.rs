//! Core data structures for spec classification

use serde::{Deserialize, Serialize};

/// Lowest confidence an oracle may report for a real verdict.
pub const MIN_CONFIDENCE: u8 = 1;

/// Highest confidence an oracle may report.
pub const MAX_CONFIDENCE: u8 = 10;

/// Confidence carried by fallback results. Never produced by the oracle.
pub const FALLBACK_CONFIDENCE: u8 = 0;

/// A file handed over by the discovery side for classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRequest {
    /// Repository-relative path.
    pub path: String,
    /// Full, untruncated file text.
    pub content: String,
}

impl ClassificationRequest {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Which family of API description a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecType {
    #[serde(rename = "openapi-3.x")]
    OpenApi3,
    #[serde(rename = "swagger-2.x")]
    Swagger2,
    #[serde(rename = "asyncapi")]
    AsyncApi,
    #[serde(rename = "graphql")]
    GraphQl,
    #[serde(rename = "unknown")]
    Unknown,
}

impl SpecType {
    /// Wire name, as sent to and expected from the oracle.
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecType::OpenApi3 => "openapi-3.x",
            SpecType::Swagger2 => "swagger-2.x",
            SpecType::AsyncApi => "asyncapi",
            SpecType::GraphQl => "graphql",
            SpecType::Unknown => "unknown",
        }
    }

    pub const ALL: [SpecType; 5] = [
        SpecType::OpenApi3,
        SpecType::Swagger2,
        SpecType::AsyncApi,
        SpecType::GraphQl,
        SpecType::Unknown,
    ];
}

impl std::fmt::Display for SpecType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict for a single file.
///
/// Produced either by the oracle (confidence 1–10) or as a fallback when the
/// oracle could not be consulted (confidence 0). Callers only tell the two
/// apart through `confidence` and `reasoning`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub is_api_spec: bool,
    pub spec_type: SpecType,
    pub confidence: u8,
    pub reasoning: String,
    pub estimated_endpoint_count: Option<u32>,
}

impl ClassificationResult {
    /// Safe default substituted when no real verdict is available.
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self {
            is_api_spec: false,
            spec_type: SpecType::Unknown,
            confidence: FALLBACK_CONFIDENCE,
            reasoning: reason.into(),
            estimated_endpoint_count: Some(0),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.confidence == FALLBACK_CONFIDENCE
    }

    /// True when the file is a spec and the verdict clears `threshold`.
    pub fn is_likely_spec(&self, threshold: u8) -> bool {
        self.is_api_spec && self.confidence >= threshold
    }
}
