//! Anthropic Claude provider implementation

use super::super::bridge::{CostRate, OracleProvider, OracleReply, OracleRequest, TokenUsage};
use super::{http_client, status_error, transport_error};
use serde::{Deserialize, Serialize};
use specsniff_core::{ConfigError, DetectorConfig, OracleError};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "claude-3-haiku-20240307";
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl AnthropicProvider {
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
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'a str,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    usage: MessagesUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MessagesUsage {
    input_tokens: u32,
    output_tokens: u32,
}

/// Join the text blocks. An empty answer is still returned with its usage so
/// the call is charged; the parser rejects it afterwards.
fn into_reply(response: MessagesResponse) -> OracleReply {
    let content = response
        .content
        .into_iter()
        .filter(|block| block.kind == "text")
        .filter_map(|block| block.text)
        .collect::<Vec<_>>()
        .join("");

    OracleReply {
        content,
        usage: TokenUsage {
            input_tokens: response.usage.input_tokens,
            output_tokens: response.usage.output_tokens,
        },
    }
}

#[async_trait::async_trait]
impl OracleProvider for AnthropicProvider {
    async fn complete(&self, request: &OracleRequest) -> Result<OracleReply, OracleError> {
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            system: &request.system,
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base_url.trim_end_matches('/')))
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.timeout))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let parsed: MessagesResponse = response
            .json()
            .await
            .map_err(|e| OracleError::MalformedResponse(format!("Anthropic response: {e}")))?;

        Ok(into_reply(parsed))
    }

    fn cost_rate(&self) -> CostRate {
        // Haiku pricing
        CostRate {
            input_per_million: 0.25,
            output_per_million: 1.25,
        }
    }

    fn name(&self) -> &str {
        "Anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_blocks_are_joined() {
        let response: MessagesResponse = serde_json::from_str(
            r#"{"content": [{"type": "text", "text": "{\"a\":"}, {"type": "tool_use"}, {"type": "text", "text": "1}"}],
                "usage": {"input_tokens": 10, "output_tokens": 4}}"#,
        )
        .unwrap();

        let reply = into_reply(response);
        assert_eq!(reply.content, r#"{"a":1}"#);
        assert_eq!(reply.usage.total(), 14);
    }

    #[test]
    fn test_empty_answer_keeps_usage() {
        let response: MessagesResponse =
            serde_json::from_str(r#"{"usage": {"input_tokens": 1000, "output_tokens": 0}}"#).unwrap();

        let reply = into_reply(response);
        assert!(reply.content.is_empty());
        assert_eq!(reply.usage.input_tokens, 1000);
    }
}
