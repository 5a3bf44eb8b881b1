//! Oracle bridge: provider seam plus the client adapter that meters and parses calls

use crate::budget::BudgetTracker;
use crate::prompt::{classification_prompt, truncate_content, CLASSIFICATION_SYSTEM_PROMPT};
use serde::{Deserialize, Deserializer};
use specsniff_core::{
    ClassificationResult, DetectorConfig, OracleError, SpecType, MAX_CONFIDENCE, MIN_CONFIDENCE,
};
use std::sync::Arc;
use std::time::Duration;

/// Resource consumption reported by the oracle for one call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input_tokens.saturating_add(self.output_tokens)
    }

    /// Rough estimate for providers that omit usage: ~4 characters per token
    pub fn estimate(prompt_chars: usize, completion_chars: usize) -> Self {
        Self {
            input_tokens: (prompt_chars / 4) as u32,
            output_tokens: (completion_chars / 4) as u32,
        }
    }
}

/// Fixed pricing for a provider, in USD per million tokens
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CostRate {
    pub input_per_million: f64,
    pub output_per_million: f64,
}

impl CostRate {
    pub const FREE: CostRate = CostRate {
        input_per_million: 0.0,
        output_per_million: 0.0,
    };

    /// Estimated cost of a call
    pub fn cost(&self, usage: &TokenUsage) -> f64 {
        (usage.input_tokens as f64 * self.input_per_million
            + usage.output_tokens as f64 * self.output_per_million)
            / 1_000_000.0
    }
}

/// One outbound classification call
#[derive(Debug, Clone)]
pub struct OracleRequest {
    /// Path of the file, for provider-side logging and heuristics
    pub path: String,
    /// File content after truncation
    pub content: String,
    pub system: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// Raw oracle answer before parsing
#[derive(Debug, Clone)]
pub struct OracleReply {
    pub content: String,
    pub usage: TokenUsage,
}

/// Oracle backend trait for different LLM providers
#[async_trait::async_trait]
pub trait OracleProvider: Send + Sync {
    /// Send one request and return the raw text answer
    async fn complete(&self, request: &OracleRequest) -> Result<OracleReply, OracleError>;

    /// Pricing used to turn usage into spend
    fn cost_rate(&self) -> CostRate;

    /// Get provider name
    fn name(&self) -> &str;
}

/// Per-call limits applied by [`OracleClient`]
#[derive(Debug, Clone)]
pub struct OracleSettings {
    pub max_tokens: u32,
    pub timeout: Duration,
    pub max_content_chars: usize,
    pub temperature: f32,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self::from(&DetectorConfig::default())
    }
}

impl From<&DetectorConfig> for OracleSettings {
    fn from(config: &DetectorConfig) -> Self {
        Self {
            max_tokens: config.max_tokens,
            timeout: config.timeout,
            max_content_chars: config.max_content_chars,
            temperature: 0.0,
        }
    }
}

/// Classifies one file per call and charges the budget for it.
pub struct OracleClient {
    provider: Arc<dyn OracleProvider>,
    budget: Arc<BudgetTracker>,
    settings: OracleSettings,
}

impl OracleClient {
    pub fn new(
        provider: Arc<dyn OracleProvider>,
        budget: Arc<BudgetTracker>,
        settings: OracleSettings,
    ) -> Self {
        Self {
            provider,
            budget,
            settings,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn settings(&self) -> &OracleSettings {
        &self.settings
    }

    /// Ask the oracle whether `content` is an API spec.
    ///
    /// Spend is recorded as soon as the oracle answers, before parsing, so an
    /// unusable answer still counts against the budget.
    pub async fn classify(
        &self,
        path: &str,
        content: &str,
    ) -> Result<ClassificationResult, OracleError> {
        let (body, truncated) = truncate_content(content, self.settings.max_content_chars);
        if truncated {
            tracing::debug!(
                "Truncated {} from {} to {} chars",
                path,
                content.chars().count(),
                self.settings.max_content_chars
            );
        }

        let request = OracleRequest {
            path: path.to_string(),
            content: body.to_string(),
            system: CLASSIFICATION_SYSTEM_PROMPT.to_string(),
            prompt: classification_prompt(path, body, truncated),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let call = self.provider.complete(&request);
        let reply = match tokio::time::timeout(self.settings.timeout, call).await {
            Ok(reply) => reply?,
            Err(_) => return Err(OracleError::Timeout(self.settings.timeout)),
        };

        let cost = self.provider.cost_rate().cost(&reply.usage);
        self.budget.record_spend(cost);
        tracing::debug!(
            "{} classified {} using {} tokens (${:.6})",
            self.provider.name(),
            path,
            reply.usage.total(),
            cost
        );

        parse_classification(&reply.content)
    }
}

/// Wire shape the oracle is instructed to return
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OracleVerdict {
    is_api_spec: bool,
    spec_type: SpecType,
    confidence: u8,
    reasoning: String,
    #[serde(deserialize_with = "present_but_nullable")]
    endpoints: Option<u32>,
}

// Key must exist; `null` is allowed
fn present_but_nullable<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<u32>::deserialize(deserializer)
}

/// Strictly parse an oracle answer.
///
/// Accepts a bare JSON object or one wrapped in a Markdown code fence. Any
/// missing or mistyped field, or an out-of-range confidence, is an error
/// rather than a default.
pub fn parse_classification(raw: &str) -> Result<ClassificationResult, OracleError> {
    let json = strip_code_fence(raw);
    if json.is_empty() {
        return Err(OracleError::EmptyResponse);
    }

    let verdict: OracleVerdict =
        serde_json::from_str(json).map_err(|e| OracleError::MalformedResponse(e.to_string()))?;

    if !(MIN_CONFIDENCE..=MAX_CONFIDENCE).contains(&verdict.confidence) {
        return Err(OracleError::MalformedResponse(format!(
            "confidence {} outside {}..={}",
            verdict.confidence, MIN_CONFIDENCE, MAX_CONFIDENCE
        )));
    }

    Ok(ClassificationResult {
        is_api_spec: verdict.is_api_spec,
        spec_type: verdict.spec_type,
        confidence: verdict.confidence,
        reasoning: verdict.reasoning,
        estimated_endpoint_count: verdict.endpoints,
    })
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if let Some(rest) = trimmed.strip_prefix("```") {
        let rest = rest.strip_prefix("json").unwrap_or(rest);
        if let Some(end) = rest.rfind("```") {
            return rest[..end].trim();
        }
    }
    trimmed
}
