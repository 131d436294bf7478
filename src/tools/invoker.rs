//! ToolInvoker trait definition
//!
//! The execution boundary: the plan core decides *what* to call and *when*;
//! the invoker owns *how* (local functions, a tool server, an MCP bridge).

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

/// Errors from a tool invocation. These become Failed step state, never a
/// crash of the executing plan.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {name}")]
    UnknownTool { name: String },

    #[error("Tool invocation failed: {message}")]
    Invocation { message: String },
}

impl ToolError {
    pub fn invocation(message: impl Into<String>) -> Self {
        Self::Invocation {
            message: message.into(),
        }
    }
}

/// Executes named tools on behalf of a plan
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Invoke a tool and wait for its text result.
    ///
    /// `conversation_id` identifies the owning conversation so stateful
    /// backends can scope side effects.
    async fn invoke(
        &self,
        tool_name: &str,
        tool_input: &Value,
        conversation_id: &str,
    ) -> Result<String, ToolError>;
}
