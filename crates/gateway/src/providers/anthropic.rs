use crate::error::Result;
use crate::provider::{
    require_api_key, synthesize_output, ModelProvider, ProviderRequest, ProviderResponse,
    ToolCall, ToolSpec,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::{Duration, Instant};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 20_000;

/// Adapter for the Anthropic Messages API
pub struct AnthropicProvider {
    client: reqwest::Client,
}

impl AnthropicProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for AnthropicProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<UserMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<AnthropicTool>,
}

#[derive(Serialize)]
struct UserMessage {
    role: &'static str,
    content: String,
}

#[derive(Serialize)]
struct AnthropicTool {
    name: String,
    description: String,
    input_schema: InputSchema,
}

#[derive(Serialize)]
struct InputSchema {
    #[serde(rename = "type")]
    schema_type: &'static str,
    properties: serde_json::Map<String, Value>,
    required: Vec<String>,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Deserialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse { name: String, input: Value },
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Default)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

fn convert_tools(tools: &[ToolSpec]) -> Vec<AnthropicTool> {
    tools
        .iter()
        .map(|tool| {
            let mut properties = serde_json::Map::new();
            for param in &tool.params {
                properties.insert(
                    param.name.clone(),
                    json!({
                        "type": param.kind.json_type(),
                        "description": param.description,
                    }),
                );
            }
            AnthropicTool {
                name: tool.name.clone(),
                description: tool.description.clone(),
                input_schema: InputSchema {
                    schema_type: "object",
                    properties,
                    required: tool.required_names(),
                },
            }
        })
        .collect()
}

fn from_wire(response: MessagesResponse, elapsed: Duration) -> ProviderResponse {
    let mut text_parts = Vec::new();
    let mut tool_calls = Vec::new();

    for block in response.content {
        match block {
            ContentBlock::Text { text } => text_parts.push(text),
            ContentBlock::ToolUse { name, input } => {
                tool_calls.push(ToolCall { name, args: input })
            }
            ContentBlock::Other => {}
        }
    }

    ProviderResponse {
        output_text: synthesize_output(&text_parts, &tool_calls),
        tool_calls,
        input_tokens: response.usage.input_tokens,
        output_tokens: response.usage.output_tokens,
        elapsed,
    }
}

#[async_trait]
impl ModelProvider for AnthropicProvider {
    fn name(&self) -> &'static str {
        "anthropic"
    }

    async fn invoke(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let api_key = require_api_key(request, self.name())?;
        let started = Instant::now();

        let body = MessagesRequest {
            model: request.model_id.clone(),
            max_tokens: MAX_TOKENS,
            messages: vec![UserMessage {
                role: "user",
                content: request.input_text.clone(),
            }],
            tools: convert_tools(&request.tools),
        };

        let response = self
            .client
            .post(API_URL)
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<MessagesResponse>()
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
    fn tool_specs_map_to_input_schema() {
        let tools = vec![ToolSpec {
            name: "write-file".to_string(),
            description: "Write a file".to_string(),
            params: vec![
                ToolParam::string("path", "The path to write"),
                ToolParam::string("content", "The content"),
            ],
        }];

        let converted = convert_tools(&tools);
        let wire = serde_json::to_value(&converted).unwrap();

        assert_eq!(
            wire,
            serde_json::json!([{
                "name": "write-file",
                "description": "Write a file",
                "input_schema": {
                    "type": "object",
                    "properties": {
                        "path": {"type": "string", "description": "The path to write"},
                        "content": {"type": "string", "description": "The content"},
                    },
                    "required": ["path", "content"],
                }
            }])
        );
    }

    #[test]
    fn text_blocks_win_over_tool_use() {
        let body = r#"{
            "content": [
                {"type": "text", "text": "answer"},
                {"type": "tool_use", "name": "write-file", "input": {"path": "a"}}
            ],
            "usage": {"input_tokens": 12, "output_tokens": 3}
        }"#;
        let response: MessagesResponse = serde_json::from_str(body).unwrap();

        let normalized = from_wire(response, Duration::from_millis(5));

        assert_eq!(normalized.output_text, "answer");
        assert_eq!(normalized.tool_calls.len(), 1);
        assert_eq!(normalized.input_tokens, 12);
        assert_eq!(normalized.output_tokens, 3);
    }

    #[test]
    fn tool_only_responses_synthesize_output() {
        let body = r#"{
            "content": [
                {"type": "tool_use", "name": "write-file", "input": {"path": "a"}}
            ]
        }"#;
        let response: MessagesResponse = serde_json::from_str(body).unwrap();

        let normalized = from_wire(response, Duration::from_millis(5));

        assert_eq!(normalized.output_text, "write-file: {\"path\":\"a\"}");
        assert_eq!(normalized.input_tokens, 0);
    }

    #[test]
    fn unknown_content_blocks_are_ignored() {
        let body = r#"{
            "content": [
                {"type": "thinking", "thinking": "..."},
                {"type": "text", "text": "done"}
            ]
        }"#;
        let response: MessagesResponse = serde_json::from_str(body).unwrap();
        let normalized = from_wire(response, Duration::from_millis(1));
        assert_eq!(normalized.output_text, "done");
    }
}
