//! OpenAI-compatible provider implementation (OpenAI, OpenRouter)

use super::super::bridge::{CostRate, OracleProvider, OracleReply, OracleRequest, TokenUsage};
use super::{http_client, status_error, transport_error};
use serde::{Deserialize, Serialize};
use specsniff_core::{ConfigError, DetectorConfig, OracleError};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

pub struct OpenAIProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl OpenAIProvider {
    pub fn from_config(config: &DetectorConfig) -> Result<Self, ConfigError> {
        let api_key = config.require_api_key()?.to_string();
        Ok(Self {
            client: http_client(config.timeout)?,
            api_key,
            model: config.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            timeout: config.timeout,
        })
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    // `null` on refusals and tool calls
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    #[serde(default)]
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// First choice's text, possibly empty. Usage is kept either way so the call
/// is charged; the parser rejects an empty answer afterwards.
fn into_reply(response: OpenAIResponse, request: &OracleRequest) -> OracleReply {
    let content = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .unwrap_or_default();

    // OpenRouter backends do not always report usage
    let usage = match response.usage {
        Some(usage) => TokenUsage {
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
        },
        None => {
            tracing::debug!("No usage reported for {}, estimating", request.path);
            TokenUsage::estimate(request.system.len() + request.prompt.len(), content.len())
        }
    };

    OracleReply { content, usage }
}

#[async_trait::async_trait]
impl OracleProvider for OpenAIProvider {
    async fn complete(&self, request: &OracleRequest) -> Result<OracleReply, OracleError> {
        let openai_request = OpenAIRequest {
            model: self.model.clone(),
            messages: vec![
                OpenAIMessage {
                    role: "system".to_string(),
                    content: Some(request.system.clone()),
                },
                OpenAIMessage {
                    role: "user".to_string(),
                    content: Some(request.prompt.clone()),
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url.trim_end_matches('/')))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("X-Title", "specsniff")
            .json(&openai_request)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let openai_response: OpenAIResponse = response
            .json()
            .await
            .map_err(|e| OracleError::MalformedResponse(format!("OpenAI response: {e}")))?;

        Ok(into_reply(openai_response, request))
    }

    fn cost_rate(&self) -> CostRate {
        // gpt-4o-mini pricing
        CostRate {
            input_per_million: 0.15,
            output_per_million: 0.60,
        }
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> OracleRequest {
        OracleRequest {
            path: "openapi.yaml".to_string(),
            content: "openapi: 3.0.0".to_string(),
            system: "s".repeat(40),
            prompt: "p".repeat(360),
            max_tokens: 1000,
            temperature: 0.0,
        }
    }

    #[test]
    fn test_null_content_keeps_usage() {
        let response: OpenAIResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": null}}],
                "usage": {"prompt_tokens": 1000000, "completion_tokens": 0}}"#,
        )
        .unwrap();

        let reply = into_reply(response, &request());
        assert!(reply.content.is_empty());
        assert_eq!(reply.usage.input_tokens, 1_000_000);
    }

    #[test]
    fn test_missing_usage_is_estimated() {
        let response: OpenAIResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"role": "assistant", "content": "abcdefgh"}}]}"#)
                .unwrap();

        let reply = into_reply(response, &request());
        assert_eq!(reply.content, "abcdefgh");
        assert_eq!(reply.usage, TokenUsage { input_tokens: 100, output_tokens: 2 });
    }
}
