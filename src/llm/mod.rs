//! Reasoning backend module for planloop
//!
//! The `LlmClient` trait is the seam between the plan core and whatever
//! text-completion service backs it; `AnthropicClient` is the shipped
//! implementation.

use std::sync::Arc;

use tracing::debug;

mod anthropic;
pub mod client;
mod error;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use error::LlmError;

use crate::config::LlmConfig;

/// Create a reasoning client based on the provider specified in config
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider.as_str() {
        "anthropic" => {
            debug!("create_client: creating Anthropic client");
            Ok(Arc::new(AnthropicClient::from_config(config)?))
        }
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            Err(LlmError::InvalidResponse(format!(
                "Unknown LLM provider: '{}'. Supported: anthropic",
                other
            )))
        }
    }
}

/// Strip a surrounding ``` or ```json fence from a backend reply, if present.
/// Models wrap JSON in fences despite instructions; consumers parse the body.
pub(crate) fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.trim_start();
    rest.strip_suffix("```").map(str::trim_end).unwrap_or(rest)
}
