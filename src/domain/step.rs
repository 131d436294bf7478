//! Step domain type
//!
//! A Step is one schedulable unit of work inside a Plan: either a call to a
//! named tool, or a reasoning-only step that needs no external invocation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::generate_id;

/// Reserved tool name marking a step that requires no tool call.
/// Its result is synthesized locally from the step description.
pub const REASONING_TOOL: &str = "reasoning";

/// Step status over its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Not yet started; waiting on dependencies or scheduling
    #[default]
    Pending,
    /// Invocation in flight
    Running,
    /// Finished with a result
    Completed,
    /// Invocation returned an error
    Failed,
    /// Deliberately skipped by an adjustment
    Skipped,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Skipped => write!(f, "skipped"),
        }
    }
}

impl StepStatus {
    /// Terminal statuses: the step will not run again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Skipped)
    }
}

/// One unit of work in a Plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Unique identifier within the plan (e.g., "019430-step-search-the-web")
    pub id: String,

    /// What this step accomplishes
    pub description: String,

    /// Name of the tool to invoke, or [`REASONING_TOOL`]
    pub tool_name: String,

    /// Input payload handed to the tool verbatim
    pub tool_input: serde_json::Value,

    /// IDs of steps that must complete before this one becomes ready
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Current lifecycle status
    #[serde(default)]
    pub status: StepStatus,

    /// Tool output, present once Completed
    pub result: Option<String>,

    /// Failure or skip reason, present when Failed or Skipped
    pub error: Option<String>,

    /// When the step entered Running
    pub started_at: Option<DateTime<Utc>>,

    /// When the step reached a terminal status
    pub completed_at: Option<DateTime<Utc>>,
}

impl Step {
    /// Create a new Step with a generated ID
    pub fn new(
        description: impl Into<String>,
        tool_name: impl Into<String>,
        tool_input: serde_json::Value,
    ) -> Self {
        let description = description.into();
        Self {
            id: generate_id("step", &description),
            description,
            tool_name: tool_name.into(),
            tool_input,
            dependencies: Vec::new(),
            status: StepStatus::Pending,
            result: None,
            error: None,
            started_at: None,
            completed_at: None,
        }
    }

    /// Create a Step with a specific ID (for testing or reconstruction)
    pub fn with_id(
        id: impl Into<String>,
        description: impl Into<String>,
        tool_name: impl Into<String>,
        tool_input: serde_json::Value,
    ) -> Self {
        let mut step = Self::new(description, tool_name, tool_input);
        step.id = id.into();
        step
    }

    /// Create a reasoning-only Step (no tool call)
    pub fn reasoning(description: impl Into<String>) -> Self {
        Self::new(description, REASONING_TOOL, serde_json::Value::Null)
    }

    /// Attach dependency IDs, builder-style
    pub fn with_dependencies(mut self, dependencies: Vec<String>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Whether this step runs without an external tool call
    pub fn is_reasoning_only(&self) -> bool {
        self.tool_name == REASONING_TOOL
    }

    /// Whether the step is in a terminal status
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
