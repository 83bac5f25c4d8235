//! Concrete adapters, one per backend wire dialect.

mod anthropic;
mod gemini;
mod openai;
mod openrouter;

pub use anthropic::AnthropicProvider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use openrouter::OpenRouterProvider;
