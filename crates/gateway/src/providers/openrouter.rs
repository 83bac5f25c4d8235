use crate::error::{GatewayError, Result};
use crate::provider::{require_api_key, ModelProvider, ProviderRequest, ProviderResponse};
use crate::providers::openai::{ChatMessage, ChatRequest, ChatResponse, ChatTool, FunctionDef};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::{Duration, Instant};

const API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const REFERER: &str = "https://carve.dev";
const TITLE: &str = "Carve CLI";
const SOLUTION_TOOL: &str = "provide_solution";

/// Adapter for OpenRouter's OpenAI-compatible endpoint.
///
/// Models behind OpenRouter vary widely in how they format free text, so
/// the adapter forces a `provide_solution` function call and reads the
/// output from its `response` argument.
pub struct OpenRouterProvider {
    client: reqwest::Client,
}

impl OpenRouterProvider {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for OpenRouterProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn solution_tool() -> ChatTool {
    ChatTool {
        tool_type: "function",
        function: FunctionDef {
            name: SOLUTION_TOOL.to_string(),
            description:
                "Provide the specific requested solution to the user's query as a clean string"
                    .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "response": {
                        "type": "string",
                        "description": "The output string for the specific user request to be programmatically consumed. This could be the raw file the user asked you to write if you were asked.",
                    }
                },
                "required": ["response"],
            }),
        },
    }
}

fn from_wire(response: ChatResponse, elapsed: Duration) -> Result<ProviderResponse> {
    let mut output_text = String::new();

    let first_call = response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.tool_calls.into_iter().next());

    if let Some(call) = first_call {
        if call.function.name == SOLUTION_TOOL {
            let args: Value = serde_json::from_str(&call.function.arguments).map_err(|err| {
                GatewayError::malformed(format!("Invalid {SOLUTION_TOOL} arguments: {err}"))
            })?;
            if let Some(text) = args.get("response").and_then(Value::as_str) {
                output_text = text.to_string();
            }
        }
    }

    Ok(ProviderResponse {
        output_text,
        tool_calls: Vec::new(),
        input_tokens: response.usage.prompt_tokens,
        output_tokens: response.usage.completion_tokens,
        elapsed,
    })
}

#[async_trait]
impl ModelProvider for OpenRouterProvider {
    fn name(&self) -> &'static str {
        "openrouter"
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
            tools: vec![solution_tool()],
            tool_choice: Some(json!({
                "type": "function",
                "function": {"name": SOLUTION_TOOL},
            })),
        };

        let response = self
            .client
            .post(API_URL)
            .bearer_auth(api_key)
            .header("HTTP-Referer", REFERER)
            .header("X-Title", TITLE)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json::<ChatResponse>()
            .await?;

        from_wire(response, started.elapsed())
    }
}
