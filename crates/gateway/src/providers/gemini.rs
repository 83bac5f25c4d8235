use crate::error::Result;
use crate::provider::{
    require_api_key, synthesize_output, ModelProvider, ProviderRequest, ProviderResponse,
    ToolCall, ToolParamKind, ToolSpec,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::{Duration, Instant};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Adapter for the Gemini generateContent API
pub struct GeminiProvider {
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for GeminiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDeclarations>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_config: Option<ToolConfig>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<TextPart>,
}

#[derive(Serialize)]
struct TextPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolDeclarations {
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: GeminiSchema,
}

#[derive(Serialize)]
struct GeminiSchema {
    #[serde(rename = "type")]
    schema_type: &'static str,
    properties: serde_json::Map<String, Value>,
    required: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ToolConfig {
    function_calling_config: FunctionCallingConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FunctionCallingConfig {
    mode: &'static str,
    allowed_function_names: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: UsageMetadata,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    function_call: Option<WireFunctionCall>,
}

#[derive(Deserialize)]
struct WireFunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

/// Gemini speaks upper-case schema type names; unknown kinds would default
/// to STRING, but the kind set is closed so the match is exhaustive.
fn gemini_type(kind: ToolParamKind) -> &'static str {
    match kind {
        ToolParamKind::String => "STRING",
        ToolParamKind::Number => "NUMBER",
        ToolParamKind::Boolean => "BOOLEAN",
    }
}

fn convert_tools(tools: &[ToolSpec]) -> Option<Vec<ToolDeclarations>> {
    if tools.is_empty() {
        return None;
    }

    let declarations = tools
        .iter()
        .map(|tool| {
            let mut properties = serde_json::Map::new();
            for param in &tool.params {
                properties.insert(
                    param.name.clone(),
                    json!({
                        "type": gemini_type(param.kind),
                        "description": param.description,
                    }),
                );
            }
            FunctionDeclaration {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: GeminiSchema {
                    schema_type: "OBJECT",
                    properties,
                    required: tool.required_names(),
                },
            }
        })
        .collect();

    Some(vec![ToolDeclarations {
        function_declarations: declarations,
    }])
}

fn from_wire(response: GenerateResponse, elapsed: Duration) -> ProviderResponse {
    let mut text_parts = Vec::new();
    let mut tool_calls = Vec::new();

    if let Some(content) = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
    {
        for part in content.parts {
            if let Some(text) = part.text {
                text_parts.push(text);
            }
            if let Some(call) = part.function_call {
                tool_calls.push(ToolCall {
                    name: call.name,
                    args: call.args,
                });
            }
        }
    }

    ProviderResponse {
        output_text: synthesize_output(&text_parts, &tool_calls),
        tool_calls,
        input_tokens: response.usage_metadata.prompt_token_count,
        output_tokens: response.usage_metadata.candidates_token_count,
        elapsed,
    }
}

#[async_trait]
impl ModelProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn invoke(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let api_key = require_api_key(request, self.name())?;
        let started = Instant::now();

        let tools = convert_tools(&request.tools);
        let tool_config = tools.as_ref().map(|_| ToolConfig {
            function_calling_config: FunctionCallingConfig {
                mode: "ANY",
                allowed_function_names: request.tools.iter().map(|t| t.name.clone()).collect(),
            },
        });

        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![TextPart {
                    text: request.input_text.clone(),
                }],
            }],
            tools,
            tool_config,
        };

        let url = format!("{API_BASE}/{}:generateContent?key={api_key}", request.model_id);
        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<GenerateResponse>()
            .await?;

        Ok(from_wire(response, started.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ToolParam;
    use pretty_assertions::assert_eq;

    #[test]
    fn tool_specs_map_to_function_declarations() {
        let tools = vec![ToolSpec {
            name: "write-file".to_string(),
            description: "Write a file".to_string(),
            params: vec![
                ToolParam {
                    name: "path".to_string(),
                    kind: ToolParamKind::String,
                    description: "The path".to_string(),
                },
                ToolParam {
                    name: "retries".to_string(),
                    kind: ToolParamKind::Number,
                    description: "How many times".to_string(),
                },
            ],
        }];

        let wire = serde_json::to_value(convert_tools(&tools).unwrap()).unwrap();

        assert_eq!(
            wire,
            serde_json::json!([{
                "functionDeclarations": [{
                    "name": "write-file",
                    "description": "Write a file",
                    "parameters": {
                        "type": "OBJECT",
                        "properties": {
                            "path": {"type": "STRING", "description": "The path"},
                            "retries": {"type": "NUMBER", "description": "How many times"},
                        },
                        "required": ["path", "retries"],
                    }
                }]
            }])
        );
    }

    #[test]
    fn no_tools_serializes_without_tool_fields() {
        assert!(convert_tools(&[]).is_none());
    }

    #[test]
    fn parts_are_split_into_text_and_calls() {
        let body = r#"{
            "candidates": [{
                "content": {
                    "parts": [
                        {"text": "  "},
                        {"functionCall": {"name": "write-file", "args": {"path": "a"}}}
                    ]
                }
            }],
            "usageMetadata": {"promptTokenCount": 4, "candidatesTokenCount": 9}
        }"#;
        let response: GenerateResponse = serde_json::from_str(body).unwrap();

        let normalized = from_wire(response, Duration::from_millis(1));

        // Whitespace-only text does not count as content.
        assert_eq!(normalized.output_text, "write-file: {\"path\":\"a\"}");
        assert_eq!(normalized.input_tokens, 4);
        assert_eq!(normalized.output_tokens, 9);
    }

    #[test]
    fn empty_candidates_produce_empty_output() {
        let response: GenerateResponse = serde_json::from_str(r#"{"candidates": []}"#).unwrap();
        let normalized = from_wire(response, Duration::from_millis(1));
        assert_eq!(normalized.output_text, "");
        assert!(normalized.tool_calls.is_empty());
    }
}
