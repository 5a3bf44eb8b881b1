//! Local provider for offline spec detection

use super::super::bridge::{CostRate, OracleProvider, OracleReply, OracleRequest, TokenUsage};
use regex::Regex;
use specsniff_core::{OracleError, SpecType};
use std::sync::LazyLock;

static OPENAPI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^[\s{]*["']?openapi["']?\s*:\s*["']?3\.\d+"#).unwrap());
static SWAGGER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^[\s{]*["']?swagger["']?\s*:\s*["']?2\.0"#).unwrap());
static ASYNCAPI_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?m)^[\s{]*["']?asyncapi["']?\s*:\s*["']?\d+\."#).unwrap());
static GRAPHQL_ROOT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^\s*(?:extend\s+)?(?:type\s+(?:Query|Mutation|Subscription)\b|schema\s*\{)").unwrap()
});

const HTTP_METHODS: [&str; 8] =
    ["get", "put", "post", "delete", "options", "head", "patch", "trace"];

/// Heuristic oracle: no network, no cost, answers in the same JSON shape as
/// the remote providers.
pub struct LocalProvider;

impl LocalProvider {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
struct Verdict {
    is_api_spec: bool,
    spec_type: SpecType,
    confidence: u8,
    reasoning: String,
    endpoints: Option<u32>,
}

fn detect(path: &str, content: &str) -> Verdict {
    let doc: Option<serde_yaml::Value> = serde_yaml::from_str(content).ok();

    if OPENAPI_RE.is_match(content) || SWAGGER_RE.is_match(content) {
        let spec_type = if OPENAPI_RE.is_match(content) {
            SpecType::OpenApi3
        } else {
            SpecType::Swagger2
        };
        let endpoints = doc.as_ref().and_then(count_operations);
        return Verdict {
            is_api_spec: true,
            spec_type,
            confidence: if endpoints.is_some() { 9 } else { 7 },
            reasoning: format!("{} version header found", spec_type),
            endpoints,
        };
    }

    if ASYNCAPI_RE.is_match(content) {
        let endpoints = doc.as_ref().and_then(count_channels);
        return Verdict {
            is_api_spec: true,
            spec_type: SpecType::AsyncApi,
            confidence: if endpoints.is_some() { 9 } else { 7 },
            reasoning: "asyncapi version header found".to_string(),
            endpoints,
        };
    }

    if GRAPHQL_ROOT_RE.is_match(content) {
        let is_schema_file = path.ends_with(".graphql") || path.ends_with(".gql");
        return Verdict {
            is_api_spec: true,
            spec_type: SpecType::GraphQl,
            confidence: if is_schema_file { 9 } else { 6 },
            reasoning: "GraphQL root operation type defined".to_string(),
            endpoints: Some(count_graphql_root_fields(content)),
        };
    }

    Verdict {
        is_api_spec: false,
        spec_type: SpecType::Unknown,
        confidence: 6,
        reasoning: "No API description markers found".to_string(),
        endpoints: None,
    }
}

/// Operations under `paths` (path items x HTTP methods)
fn count_operations(doc: &serde_yaml::Value) -> Option<u32> {
    let paths = doc.get("paths")?.as_mapping()?;
    let count = paths
        .values()
        .filter_map(|item| item.as_mapping())
        .flat_map(|item| item.keys())
        .filter_map(|key| key.as_str())
        .filter(|key| HTTP_METHODS.contains(&key.to_ascii_lowercase().as_str()))
        .count();
    Some(count as u32)
}

fn count_channels(doc: &serde_yaml::Value) -> Option<u32> {
    let channels = doc.get("channels")?.as_mapping()?;
    Some(channels.len() as u32)
}

/// Fields declared inside `type Query/Mutation/Subscription { ... }` blocks
fn count_graphql_root_fields(content: &str) -> u32 {
    let mut in_root = false;
    let mut depth = 0usize;
    let mut count = 0u32;

    for line in content.lines() {
        let trimmed = line.trim();
        if !in_root {
            let opens_root = ["Query", "Mutation", "Subscription"]
                .iter()
                .any(|name| {
                    trimmed.starts_with(&format!("type {name}"))
                        || trimmed.starts_with(&format!("extend type {name}"))
                });
            if opens_root && trimmed.contains('{') {
                in_root = true;
                depth = 1;
            }
            continue;
        }

        if depth == 1 && trimmed.contains(':') && !trimmed.starts_with('#') {
            count += 1;
        }
        depth += trimmed.matches('{').count();
        depth = depth.saturating_sub(trimmed.matches('}').count());
        if depth == 0 {
            in_root = false;
        }
    }
    count
}

#[async_trait::async_trait]
impl OracleProvider for LocalProvider {
    async fn complete(&self, request: &OracleRequest) -> Result<OracleReply, OracleError> {
        let verdict = detect(&request.path, &request.content);
        tracing::debug!("Local heuristics for {}: {:?}", request.path, verdict);

        let content = serde_json::json!({
            "isApiSpec": verdict.is_api_spec,
            "specType": verdict.spec_type,
            "confidence": verdict.confidence,
            "reasoning": verdict.reasoning,
            "endpoints": verdict.endpoints,
        })
        .to_string();

        Ok(OracleReply {
            content,
            usage: TokenUsage::default(),
        })
    }

    fn cost_rate(&self) -> CostRate {
        CostRate::FREE
    }

    fn name(&self) -> &str {
        "Local (Heuristic)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_yaml_counts_operations() {
        let content = "openapi: 3.0.3\ninfo:\n  title: Pets\n  version: '1'\npaths:\n  /pets:\n    get: {}\n    post: {}\n  /pets/{id}:\n    parameters: []\n    get: {}\n";
        let verdict = detect("api/openapi.yaml", content);

        assert!(verdict.is_api_spec);
        assert_eq!(verdict.spec_type, SpecType::OpenApi3);
        assert_eq!(verdict.endpoints, Some(3));
        assert_eq!(verdict.confidence, 9);
    }

    #[test]
    fn test_swagger_json() {
        let content = r#"{"swagger": "2.0", "paths": {"/users": {"get": {}, "delete": {}}}}"#;
        let verdict = detect("swagger.json", content);

        assert_eq!(verdict.spec_type, SpecType::Swagger2);
        assert_eq!(verdict.endpoints, Some(2));
    }

    #[test]
    fn test_asyncapi_channels() {
        let content = "asyncapi: 2.6.0\nchannels:\n  user/signedup: {}\n  user/deleted: {}\n";
        let verdict = detect("asyncapi.yml", content);

        assert_eq!(verdict.spec_type, SpecType::AsyncApi);
        assert_eq!(verdict.endpoints, Some(2));
    }

    #[test]
    fn test_graphql_root_fields() {
        let content = "type User {\n  id: ID!\n}\n\ntype Query {\n  user(id: ID!): User\n  users: [User!]!\n}\n\ntype Mutation {\n  createUser(input: CreateUserInput!): User\n}\n";
        let verdict = detect("schema.graphql", content);

        assert_eq!(verdict.spec_type, SpecType::GraphQl);
        assert_eq!(verdict.endpoints, Some(3));
        assert_eq!(verdict.confidence, 9);
    }

    #[test]
    fn test_plain_config_is_not_a_spec() {
        let verdict = detect("config/app.yaml", "server:\n  port: 8080\n  host: localhost\n");

        assert!(!verdict.is_api_spec);
        assert_eq!(verdict.spec_type, SpecType::Unknown);
    }

    #[test]
    fn test_truncated_openapi_still_detected() {
        // Unterminated flow mapping: not parseable, header still visible
        let verdict = detect("openapi.yaml", "openapi: 3.1.0\npaths: {\n  /a: {get: {}");

        assert!(verdict.is_api_spec);
        assert_eq!(verdict.endpoints, None);
        assert_eq!(verdict.confidence, 7);
    }
}
