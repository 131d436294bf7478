//! Adjustment domain type
//!
//! An Adjustment is a structured instruction to change a Plan mid-flight,
//! typically produced by reflection. Adjustments are transient values; they
//! are applied by the adjuster and then discarded.

use serde::{Deserialize, Serialize};

use super::step::Step;

/// The kind of change an adjustment requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    /// Replace the target step's tool input
    Modify,
    /// Reset the target step to Pending so it runs again
    Retry,
    /// Mark the target step Skipped and release its dependents
    Skip,
    /// Insert a new step immediately before the target
    AddBefore,
    /// Insert a new step immediately after the target
    AddAfter,
    /// Substitute the target step wholesale
    Replace,
}

impl std::fmt::Display for AdjustmentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Modify => write!(f, "modify"),
            Self::Retry => write!(f, "retry"),
            Self::Skip => write!(f, "skip"),
            Self::AddBefore => write!(f, "add_before"),
            Self::AddAfter => write!(f, "add_after"),
            Self::Replace => write!(f, "replace"),
        }
    }
}

impl AdjustmentKind {
    /// Parse an action string from reflection output. Unknown strings yield
    /// `None` so the caller can drop them instead of failing the whole parse.
    pub fn parse(action: &str) -> Option<Self> {
        match action.trim().to_lowercase().as_str() {
            "modify" => Some(Self::Modify),
            "retry" => Some(Self::Retry),
            "skip" => Some(Self::Skip),
            "add_before" => Some(Self::AddBefore),
            "add_after" => Some(Self::AddAfter),
            "replace" => Some(Self::Replace),
            _ => None,
        }
    }

    /// Kinds that require a full replacement step payload
    pub fn requires_step(&self) -> bool {
        matches!(self, Self::AddBefore | Self::AddAfter | Self::Replace)
    }
}

/// One structured change to a Plan
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Adjustment {
    /// ID of the step this adjustment targets
    pub step_id: String,

    /// What kind of change to make
    pub kind: AdjustmentKind,

    /// Why the change was proposed
    pub reason: String,

    /// Replacement tool input (Modify, Retry)
    pub new_tool_input: Option<serde_json::Value>,

    /// Replacement tool name, carried alongside Replace verdicts
    pub new_tool_name: Option<String>,

    /// Full replacement/insertion step (AddBefore, AddAfter, Replace)
    pub new_step: Option<Step>,
}

impl Adjustment {
    fn base(step_id: impl Into<String>, kind: AdjustmentKind, reason: impl Into<String>) -> Self {
        Self {
            step_id: step_id.into(),
            kind,
            reason: reason.into(),
            new_tool_input: None,
            new_tool_name: None,
            new_step: None,
        }
    }

    /// Modify a step's tool input
    pub fn modify(
        step_id: impl Into<String>,
        new_tool_input: serde_json::Value,
        reason: impl Into<String>,
    ) -> Self {
        let mut adj = Self::base(step_id, AdjustmentKind::Modify, reason);
        adj.new_tool_input = Some(new_tool_input);
        adj
    }

    /// Retry a step, optionally with different input
    pub fn retry(step_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::base(step_id, AdjustmentKind::Retry, reason)
    }

    /// Skip a step
    pub fn skip(step_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::base(step_id, AdjustmentKind::Skip, reason)
    }

    /// Insert a step before the target
    pub fn add_before(step_id: impl Into<String>, step: Step, reason: impl Into<String>) -> Self {
        let mut adj = Self::base(step_id, AdjustmentKind::AddBefore, reason);
        adj.new_step = Some(step);
        adj
    }

    /// Insert a step after the target
    pub fn add_after(step_id: impl Into<String>, step: Step, reason: impl Into<String>) -> Self {
        let mut adj = Self::base(step_id, AdjustmentKind::AddAfter, reason);
        adj.new_step = Some(step);
        adj
    }

    /// Replace the target step
    pub fn replace(step_id: impl Into<String>, step: Step, reason: impl Into<String>) -> Self {
        let mut adj = Self::base(step_id, AdjustmentKind::Replace, reason);
        adj.new_tool_name = Some(step.tool_name.clone());
        adj.new_step = Some(step);
        adj
    }

    /// Attach replacement input, builder-style (used with [`Adjustment::retry`])
    pub fn with_new_input(mut self, input: serde_json::Value) -> Self {
        self.new_tool_input = Some(input);
        self
    }
}
