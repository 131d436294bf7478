//! Event type definitions for plan execution telemetry
//!
//! Events are advisory: consumers may observe them for progress display or
//! logging, but correctness never depends on delivery.

use serde::{Deserialize, Serialize};

use crate::domain::{Assessment, PlanStatus};

/// All events emitted during plan execution and orchestration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlanEvent {
    /// An executor pass over a plan has begun
    PlanExecutionStarted {
        plan_id: String,
        conversation_id: String,
        total_steps: usize,
    },

    /// A step's dependencies are satisfied and it is being launched
    StepReady {
        plan_id: String,
        step_id: String,
        tool_name: String,
    },

    /// A step invocation finished, successfully or not
    StepCompleted {
        plan_id: String,
        step_id: String,
        success: bool,
        summary: String,
        duration_ms: u64,
    },

    /// The executor pass resolved, with the plan's resulting status
    PlanExecutionCompleted {
        plan_id: String,
        status: PlanStatus,
        completed_steps: usize,
        failed_steps: usize,
    },

    /// A reflection pass rendered its verdict
    ReflectionCompleted {
        plan_id: String,
        cycle: u32,
        assessment: Assessment,
    },

    /// Adjustments from a reflection cycle were applied to the plan
    AdjustmentsApplied {
        plan_id: String,
        cycle: u32,
        count: usize,
    },
}

impl PlanEvent {
    /// The plan this event belongs to
    pub fn plan_id(&self) -> &str {
        match self {
            Self::PlanExecutionStarted { plan_id, .. } => plan_id,
            Self::StepReady { plan_id, .. } => plan_id,
            Self::StepCompleted { plan_id, .. } => plan_id,
            Self::PlanExecutionCompleted { plan_id, .. } => plan_id,
            Self::ReflectionCompleted { plan_id, .. } => plan_id,
            Self::AdjustmentsApplied { plan_id, .. } => plan_id,
        }
    }

    /// Event type name for logging and filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::PlanExecutionStarted { .. } => "PlanExecutionStarted",
            Self::StepReady { .. } => "StepReady",
            Self::StepCompleted { .. } => "StepCompleted",
            Self::PlanExecutionCompleted { .. } => "PlanExecutionCompleted",
            Self::ReflectionCompleted { .. } => "ReflectionCompleted",
            Self::AdjustmentsApplied { .. } => "AdjustmentsApplied",
        }
    }
}
