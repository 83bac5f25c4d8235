use crate::cache::InvocationCache;
use crate::error::Result;
use crate::gate::ConcurrencyGate;
use crate::provider::{
    provider_for, ModelProvider, ProviderKind, ProviderRequest, ToolCall, ToolSpec,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::PathBuf;

/// One model invocation: input file in, output file out
#[derive(Debug, Clone)]
pub struct InvokeArgs {
    pub provider: ProviderKind,
    pub model_id: String,
    pub input_file: PathBuf,
    pub output_file: PathBuf,
    pub api_key: Option<String>,
    pub tools: Vec<ToolSpec>,
}

/// Result of a completed invocation
#[derive(Debug, Clone)]
pub struct InvocationOutcome {
    pub output: String,
    pub tool_calls: Vec<ToolCall>,
    /// Whether the output came from the cache (hits report no token cost)
    pub cached: bool,
}

/// Ties the cache, the gate, and the provider adapters together.
///
/// Built once at process start; the same gate instance bounds every
/// invocation issued through it.
pub struct Invoker {
    cache: InvocationCache,
    gate: ConcurrencyGate,
}

impl Invoker {
    pub fn new(cache: InvocationCache, gate: ConcurrencyGate) -> Self {
        Self { cache, gate }
    }

    /// Invoke the configured backend for `args`.
    ///
    /// The cache is consulted first; a hit bypasses the gate and the
    /// adapter entirely. Provider failures are logged and recovered into
    /// `Ok(None)` so one failed call does not abort a batch. Input-file
    /// errors propagate.
    pub async fn invoke(&self, args: &InvokeArgs) -> Result<Option<InvocationOutcome>> {
        let provider = provider_for(args.provider);
        self.invoke_with(provider.as_ref(), args).await
    }

    /// Same flow with an explicit adapter; the seam used by tests.
    pub async fn invoke_with(
        &self,
        provider: &dyn ModelProvider,
        args: &InvokeArgs,
    ) -> Result<Option<InvocationOutcome>> {
        let input = tokio::fs::read_to_string(&args.input_file).await?;

        let digest = InvocationCache::key(provider.name(), &args.model_id, &input);
        if let Some(cached) = self.cache.get(&digest).await {
            log::info!("Using cached response for {} model", provider.name());
            tokio::fs::write(&args.output_file, &cached).await?;
            return Ok(Some(InvocationOutcome {
                output: cached,
                tool_calls: Vec::new(),
                cached: true,
            }));
        }

        log::info!(
            "Invoking {} model with input file {}",
            provider.name(),
            args.input_file.display()
        );
        let request = ProviderRequest {
            model_id: args.model_id.clone(),
            input_text: input,
            api_key: args.api_key.clone(),
            tools: args.tools.clone(),
        };

        let response = match self.gate.run(provider.invoke(&request)).await {
            Ok(response) => response,
            Err(err) => {
                log::warn!(
                    "Error invoking {} model, will result in no output: {err}",
                    provider.name()
                );
                return Ok(None);
            }
        };

        let elapsed_ms = response.elapsed.as_millis().max(1);
        let tokens_per_second = response.output_tokens as f64 / elapsed_ms as f64 * 1000.0;
        log::info!(
            "{} model responded with {} tokens (input tokens: {}) in {elapsed_ms}ms ({tokens_per_second:.2} tokens/s)",
            provider.name(),
            response.output_tokens,
            response.input_tokens,
        );

        let output = extract_solution(&response.output_text);
        if let Err(err) = self.cache.put(&digest, &output).await {
            log::warn!("Failed to store cache entry {digest}: {err}");
        }

        if output.is_empty() {
            log::warn!(
                "Model output was empty, skipping write to {}",
                args.output_file.display()
            );
        } else {
            tokio::fs::write(&args.output_file, &output).await?;
            log::info!("Output written to {}", args.output_file.display());
        }

        Ok(Some(InvocationOutcome {
            output,
            tool_calls: response.tool_calls,
            cached: false,
        }))
    }
}

static SOLUTION_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)<generative-solution>(.*?)</generative-solution>")
        .expect("invalid solution-tag pattern")
});

/// Unwrap a `<generative-solution>` tag when the model used one.
fn extract_solution(output: &str) -> String {
    match SOLUTION_TAG.captures(output).and_then(|captures| captures.get(1)) {
        Some(solution) => solution.as_str().trim().to_string(),
        None => output.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn solution_tags_are_unwrapped() {
        let wrapped = "preamble <generative-solution>\nthe answer\n</generative-solution> rest";
        assert_eq!(extract_solution(wrapped), "the answer");
    }

    #[test]
    fn untagged_output_passes_through() {
        assert_eq!(extract_solution("plain output"), "plain output");
    }
}
