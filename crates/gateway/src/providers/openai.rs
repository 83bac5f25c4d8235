use crate::error::{GatewayError, Result};
use crate::provider::{
    require_api_key, synthesize_output, ModelProvider, ProviderRequest, ProviderResponse,
    ToolCall, ToolSpec,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::{Duration, Instant};

const API_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Adapter for the OpenAI chat-completions API.
///
/// The wire shapes here are shared with [`super::OpenRouterProvider`], which
/// speaks the same dialect against a different endpoint.
pub struct OpenAiProvider {
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for OpenAiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Serialize)]
pub(crate) struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ChatTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<Value>,
}

#[derive(Serialize)]
pub(crate) struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Serialize)]
pub(crate) struct ChatTool {
    #[serde(rename = "type")]
    pub tool_type: &'static str,
    pub function: FunctionDef,
}

#[derive(Serialize)]
pub(crate) struct FunctionDef {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[derive(Deserialize)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub usage: ChatUsage,
}

#[derive(Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChoiceMessage,
}

#[derive(Deserialize, Default)]
pub(crate) struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Vec<WireToolCall>,
}

#[derive(Deserialize)]
pub(crate) struct WireToolCall {
    pub function: WireFunctionCall,
}

#[derive(Deserialize)]
pub(crate) struct WireFunctionCall {
    pub name: String,
    /// JSON-encoded argument object
    pub arguments: String,
}

#[derive(Deserialize, Default)]
pub(crate) struct ChatUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

pub(crate) fn convert_tools(tools: &[ToolSpec]) -> Vec<ChatTool> {
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
            ChatTool {
                tool_type: "function",
                function: FunctionDef {
                    name: tool.name.clone(),
                    description: tool.description.clone(),
                    parameters: json!({
                        "type": "object",
                        "properties": properties,
                        "required": tool.required_names(),
                    }),
                },
            }
        })
        .collect()
}

fn from_wire(response: ChatResponse, elapsed: Duration) -> Result<ProviderResponse> {
    let mut text_parts = Vec::new();
    let mut tool_calls = Vec::new();

    if let Some(choice) = response.choices.into_iter().next() {
        if let Some(content) = choice.message.content {
            text_parts.push(content);
        }
        for call in choice.message.tool_calls {
            let args: Value = serde_json::from_str(&call.function.arguments).map_err(|err| {
                GatewayError::malformed(format!(
                    "Invalid tool-call arguments for {}: {err}",
                    call.function.name
                ))
            })?;
            tool_calls.push(ToolCall {
                name: call.function.name,
                args,
            });
        }
    }

    Ok(ProviderResponse {
        output_text: synthesize_output(&text_parts, &tool_calls),
        tool_calls,
        input_tokens: response.usage.prompt_tokens,
        output_tokens: response.usage.completion_tokens,
        elapsed,
    })
}

#[async_trait]
impl ModelProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn invoke(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let api_key = require_api_key(request, self.name())?;
        let started = Instant::now();

        let body = ChatRequest {
            model: request.model_id.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: request.input_text.clone(),
            }],
            tools: convert_tools(&request.tools),
            tool_choice: None,
        };

        let response = self
            .client
            .post(API_URL)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        from_wire(response, started.elapsed())
    }
}
