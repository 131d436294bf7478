//! LlmClient trait definition

use async_trait::async_trait;

use super::LlmError;

/// Stateless reasoning backend - each call is independent.
///
/// The core abstraction over a text-completion service. One system prompt,
/// one user prompt, one text reply; no conversation state is kept between
/// calls, and no retry policy lives at this layer. Plan generation and
/// reflection both speak through this trait, which keeps them testable
/// against scripted backends.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request and wait for the full reply text
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError>;
}
