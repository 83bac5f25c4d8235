use crate::error::{GatewayError, Result};
use crate::providers::{AnthropicProvider, GeminiProvider, OpenAiProvider, OpenRouterProvider};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Supported model backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    Anthropic,
    OpenAi,
    Gemini,
    OpenRouter,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Anthropic,
        ProviderKind::OpenAi,
        ProviderKind::Gemini,
        ProviderKind::OpenRouter,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenAi => "openai",
            ProviderKind::Gemini => "gemini",
            ProviderKind::OpenRouter => "openrouter",
        }
    }

    /// Model used when neither the caller nor the config names one
    pub fn default_model(self) -> &'static str {
        match self {
            ProviderKind::Anthropic => "claude-sonnet-4-20250514",
            ProviderKind::OpenAi => "gpt-4.1-2025-04-14",
            ProviderKind::Gemini => "gemini-2.5-flash-preview-05-20",
            ProviderKind::OpenRouter => "openai/gpt-4o",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "anthropic" => Ok(ProviderKind::Anthropic),
            "openai" => Ok(ProviderKind::OpenAi),
            "gemini" => Ok(ProviderKind::Gemini),
            "openrouter" => Ok(ProviderKind::OpenRouter),
            other => Err(GatewayError::UnknownProvider(other.to_string())),
        }
    }
}

/// Primitive type of a tool parameter; each backend maps these onto its own
/// schema dialect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolParamKind {
    String,
    Number,
    Boolean,
}

impl ToolParamKind {
    /// JSON-schema type name (OpenAI-style dialects)
    pub fn json_type(self) -> &'static str {
        match self {
            ToolParamKind::String => "string",
            ToolParamKind::Number => "number",
            ToolParamKind::Boolean => "boolean",
        }
    }
}

/// One parameter of a tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolParam {
    pub name: String,
    pub kind: ToolParamKind,
    pub description: String,
}

impl ToolParam {
    pub fn string(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ToolParamKind::String,
            description: description.into(),
        }
    }
}

/// Backend-agnostic tool description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
    pub params: Vec<ToolParam>,
}

impl ToolSpec {
    /// All parameters are required, matching the invocation contract
    pub fn required_names(&self) -> Vec<String> {
        self.params.iter().map(|p| p.name.clone()).collect()
    }
}

/// Normalized request passed to every adapter
#[derive(Debug, Clone)]
pub struct ProviderRequest {
    pub model_id: String,
    pub input_text: String,
    /// Opaque credential; absence is a provider error, not a config error
    pub api_key: Option<String>,
    pub tools: Vec<ToolSpec>,
}

/// A structured tool invocation returned by a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCall {
    pub name: String,
    pub args: Value,
}

/// Normalized response, uniform across backends
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub output_text: String,
    pub tool_calls: Vec<ToolCall>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub elapsed: Duration,
}

/// Uniform contract over the capability set {generate text, optional tool
/// calling}. One HTTP call per invocation, no retries.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn invoke(&self, request: &ProviderRequest) -> Result<ProviderResponse>;
}

/// Concrete adapter for a backend
pub fn provider_for(kind: ProviderKind) -> Box<dyn ModelProvider> {
    match kind {
        ProviderKind::Anthropic => Box::new(AnthropicProvider::new()),
        ProviderKind::OpenAi => Box::new(OpenAiProvider::new()),
        ProviderKind::Gemini => Box::new(GeminiProvider::new()),
        ProviderKind::OpenRouter => Box::new(OpenRouterProvider::new()),
    }
}

pub(crate) fn require_api_key<'a>(request: &'a ProviderRequest, provider: &str) -> Result<&'a str> {
    request
        .api_key
        .as_deref()
        .filter(|key| !key.is_empty())
        .ok_or_else(|| GatewayError::MissingApiKey(provider.to_string()))
}

/// Prefer free-text content; otherwise synthesize one line per tool call.
pub(crate) fn synthesize_output(text_parts: &[String], tool_calls: &[ToolCall]) -> String {
    let text = text_parts.join("\n");
    if !text.trim().is_empty() {
        return text;
    }

    tool_calls
        .iter()
        .map(|call| format!("{}: {}", call.name, call.args))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn provider_kind_round_trips_through_strings() {
        for kind in ProviderKind::ALL {
            assert_eq!(kind.as_str().parse::<ProviderKind>().unwrap(), kind);
        }
        assert!("mystery".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn text_output_is_preferred_over_tool_calls() {
        let calls = vec![ToolCall {
            name: "write-file".to_string(),
            args: json!({"path": "a.txt"}),
        }];
        let output = synthesize_output(&["hello".to_string()], &calls);
        assert_eq!(output, "hello");
    }

    #[test]
    fn tool_calls_synthesize_when_no_text_is_present() {
        let calls = vec![
            ToolCall {
                name: "write-file".to_string(),
                args: json!({"path": "a.txt"}),
            },
            ToolCall {
                name: "other".to_string(),
                args: json!({"x": 1}),
            },
        ];
        let output = synthesize_output(&[], &calls);
        assert_eq!(output, "write-file: {\"path\":\"a.txt\"}\nother: {\"x\":1}");
    }

    #[test]
    fn missing_api_key_is_a_provider_error() {
        let request = ProviderRequest {
            model_id: "m".to_string(),
            input_text: "in".to_string(),
            api_key: None,
            tools: Vec::new(),
        };
        assert!(matches!(
            require_api_key(&request, "anthropic"),
            Err(GatewayError::MissingApiKey(_))
        ));
    }
}
