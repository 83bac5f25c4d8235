//! # Carve Gateway
//!
//! Cache-aware, concurrency-bounded dispatch to LLM backends.
//!
//! The gateway normalizes four provider wire dialects behind one
//! [`ModelProvider`] contract: plain-text input, generated text output, and
//! optional structured tool calling. Invocations flow cache-first: a
//! content-addressed [`InvocationCache`] hit short-circuits the provider
//! call entirely, and cache misses are admitted through a FIFO
//! [`ConcurrencyGate`] so a batch of calls never exceeds the configured
//! in-flight limit.
//!
//! Provider failures are reported once and recovered into an empty result;
//! a single failed call never aborts a batch of independent invocations.

mod cache;
mod error;
mod gate;
mod invoke;
mod provider;
mod providers;
mod tools;

pub use cache::InvocationCache;
pub use error::{GatewayError, Result};
pub use gate::ConcurrencyGate;
pub use invoke::{InvocationOutcome, InvokeArgs, Invoker};
pub use provider::{
    provider_for, ModelProvider, ProviderKind, ProviderRequest, ProviderResponse, ToolCall,
    ToolParam, ToolParamKind, ToolSpec,
};
pub use tools::{apply_write_file, write_file_tool, WRITE_FILE_TOOL_NAME};
