//! Prompt templates for spec classification

use specsniff_core::SpecType;

/// Cut `content` to at most `max_chars` characters.
///
/// Always keeps the same prefix for the same input, so identical files send
/// identical payloads. Returns whether anything was dropped.
pub fn truncate_content(content: &str, max_chars: usize) -> (&str, bool) {
    match content.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (&content[..byte_idx], true),
        None => (content, false),
    }
}

/// Generate the user prompt for classifying one file
pub fn classification_prompt(path: &str, content: &str, truncated: bool) -> String {
    let spec_types = SpecType::ALL
        .iter()
        .map(|t| format!("\"{}\"", t.as_str()))
        .collect::<Vec<_>>()
        .join(" | ");

    let truncation_note = if truncated {
        "\n(Content truncated; only the beginning of the file is shown.)"
    } else {
        ""
    };

    format!(r#"Decide whether the following file is an API specification.

Path: {}{}

File content:
```
{}
```

Instructions:
1. Look at the document structure, not just keywords in prose or comments
2. OpenAPI 3.x files declare a top-level `openapi: 3.x` key; Swagger 2.0 files declare `swagger: "2.0"`
3. AsyncAPI files declare a top-level `asyncapi` key; GraphQL schemas define `type Query`, `type Mutation` or a `schema` block
4. Rate your confidence from 1 (guess) to 10 (certain)
5. Estimate the number of endpoints (paths x methods, channels, or root operations), or null if not applicable

Return only a JSON object with exactly these fields:
{{
  "isApiSpec": true,
  "specType": {},
  "confidence": 8,
  "reasoning": "One sentence explaining the verdict",
  "endpoints": 12
}}"#,
        path,
        truncation_note,
        content,
        spec_types,
    )
}

/// System prompt for spec classification
pub const CLASSIFICATION_SYSTEM_PROMPT: &str = r#"You are an expert in API description formats. Your role is to:

1. Recognise OpenAPI 3.x, Swagger 2.0, AsyncAPI and GraphQL schema documents
2. Distinguish real specifications from files that merely mention APIs
3. Be conservative - a generic JSON or YAML config file is not a specification
4. Respond with a single valid JSON object and nothing else"#;
