//! Plan domain type
//!
//! A Plan is an ordered, dependency-annotated collection of Steps plus
//! execution state. Plans are values: every state transition returns a new
//! Plan and leaves the receiver untouched, so executors and orchestrators can
//! fold results without sharing mutable state.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::generate_id;
use super::step::{Step, StepStatus};

/// Plan status over its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    /// Generated but not yet started
    #[default]
    Draft,
    /// Executor has started working the steps
    Executing,
    /// Every step finished and none failed
    Completed,
    /// At least one step failed, or reflection declared the plan failed
    Failed,
    /// Stopped by the cancel signal
    Cancelled,
}

impl std::fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Draft => write!(f, "draft"),
            Self::Executing => write!(f, "executing"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl PlanStatus {
    /// Terminal statuses: the plan will not be executed again
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

/// The top-level work unit: a goal broken into dependency-ordered steps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Unique identifier (e.g., "019430-plan-research-rust-adoption")
    pub id: String,

    /// Conversation this plan belongs to, passed through to tool invocations
    pub conversation_id: String,

    /// The original user goal this plan serves
    pub user_query: String,

    /// Steps in insertion order; execution order is governed by dependencies
    #[serde(default)]
    pub steps: Vec<Step>,

    /// Current lifecycle status
    #[serde(default)]
    pub status: PlanStatus,

    /// IDs of completed steps, in completion order
    #[serde(default)]
    pub completed_step_ids: Vec<String>,

    /// IDs of failed steps, in failure order
    #[serde(default)]
    pub failed_step_ids: Vec<String>,

    /// Whether the orchestrator runs reflection cycles for this plan
    #[serde(default)]
    pub reflection_enabled: bool,

    /// Upper bound on reflect/adjust cycles
    #[serde(default)]
    pub max_reflection_cycles: u32,

    /// Top-level failure reason when status is Failed
    pub error: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last transition timestamp
    pub updated_at: DateTime<Utc>,
}

impl Plan {
    /// Create a new Draft plan with a generated ID and no steps
    pub fn new(conversation_id: impl Into<String>, user_query: impl Into<String>) -> Self {
        let user_query = user_query.into();
        let now = Utc::now();
        Self {
            id: generate_id("plan", &user_query),
            conversation_id: conversation_id.into(),
            user_query,
            steps: Vec::new(),
            status: PlanStatus::Draft,
            completed_step_ids: Vec::new(),
            failed_step_ids: Vec::new(),
            reflection_enabled: false,
            max_reflection_cycles: 0,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Attach steps, builder-style (construction only)
    pub fn with_steps(mut self, steps: Vec<Step>) -> Self {
        self.steps = steps;
        self
    }

    /// Configure reflection, builder-style (construction only)
    pub fn with_reflection(mut self, enabled: bool, max_cycles: u32) -> Self {
        self.reflection_enabled = enabled;
        self.max_reflection_cycles = max_cycles;
        self
    }

    // === Structural queries ===

    /// Look up a step by ID
    pub fn step(&self, step_id: &str) -> Option<&Step> {
        self.steps.iter().find(|s| s.id == step_id)
    }

    /// True once every step is in a terminal status
    pub fn is_complete(&self) -> bool {
        self.steps.iter().all(|s| s.is_terminal())
    }

    /// True if any step has failed
    pub fn has_failures(&self) -> bool {
        !self.failed_step_ids.is_empty()
    }

    /// Number of steps still Pending
    pub fn pending_count(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.status == StepStatus::Pending)
            .count()
    }

    /// Pending steps whose every dependency has completed, in insertion order
    pub fn ready_steps(&self) -> Vec<&Step> {
        self.steps
            .iter()
            .filter(|s| {
                s.status == StepStatus::Pending
                    && s.dependencies
                        .iter()
                        .all(|dep| self.completed_step_ids.iter().any(|c| c == dep))
            })
            .collect()
    }

    /// Probe the dependency graph for a cycle.
    ///
    /// Returns the cycle path (first node repeated at the end) when one
    /// exists. Well-formed generation cannot produce cycles, but adjustments
    /// that add steps with arbitrary dependencies can; the executor uses this
    /// to diagnose a stuck plan. Dependencies on IDs not present in the plan
    /// are ignored here; they stall readiness but are not a cycle.
    pub fn dependency_cycle(&self) -> Option<Vec<String>> {
        let graph: HashMap<&str, &Vec<String>> = self
            .steps
            .iter()
            .map(|s| (s.id.as_str(), &s.dependencies))
            .collect();

        fn visit<'a>(
            node: &'a str,
            graph: &HashMap<&'a str, &'a Vec<String>>,
            visited: &mut HashSet<&'a str>,
            in_stack: &mut HashSet<&'a str>,
            path: &mut Vec<&'a str>,
        ) -> Option<Vec<String>> {
            if in_stack.contains(node) {
                let start = path.iter().position(|n| *n == node).unwrap_or(0);
                let mut cycle: Vec<String> = path[start..].iter().map(|n| n.to_string()).collect();
                cycle.push(node.to_string());
                return Some(cycle);
            }
            if visited.contains(node) {
                return None;
            }
            visited.insert(node);
            in_stack.insert(node);
            path.push(node);

            if let Some(deps) = graph.get(node) {
                for dep in deps.iter() {
                    // Dangling dependency IDs are not part of the graph
                    if graph.contains_key(dep.as_str())
                        && let Some(cycle) = visit(dep, graph, visited, in_stack, path)
                    {
                        return Some(cycle);
                    }
                }
            }

            path.pop();
            in_stack.remove(node);
            None
        }

        let mut visited = HashSet::new();
        let mut in_stack = HashSet::new();
        let mut path = Vec::new();

        for step in &self.steps {
            if !visited.contains(step.id.as_str())
                && let Some(cycle) = visit(
                    step.id.as_str(),
                    &graph,
                    &mut visited,
                    &mut in_stack,
                    &mut path,
                )
            {
                return Some(cycle);
            }
        }
        None
    }

    // === Copy-on-write transitions ===
    // Each returns a new Plan; the receiver is never mutated. Unknown step
    // IDs are a silent no-op so callers always get a well-formed Plan back.

    /// New plan with the given status
    pub fn with_status(&self, status: PlanStatus) -> Self {
        let mut next = self.clone();
        next.status = status;
        next.updated_at = Utc::now();
        next
    }

    /// New plan marked Failed with a top-level reason
    pub fn with_failure(&self, reason: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.status = PlanStatus::Failed;
        next.error = Some(reason.into());
        next.updated_at = Utc::now();
        next
    }

    /// New plan with the given step marked Running
    pub fn with_step_running(&self, step_id: &str) -> Self {
        let mut next = self.clone();
        if let Some(step) = next.steps.iter_mut().find(|s| s.id == step_id) {
            step.status = StepStatus::Running;
            step.started_at = Some(Utc::now());
        }
        next.updated_at = Utc::now();
        next
    }

    /// New plan with the given step marked Completed and recorded in
    /// `completed_step_ids`
    pub fn with_step_completed(&self, step_id: &str, result: impl Into<String>) -> Self {
        let mut next = self.clone();
        if let Some(step) = next.steps.iter_mut().find(|s| s.id == step_id) {
            step.status = StepStatus::Completed;
            step.result = Some(result.into());
            step.error = None;
            step.completed_at = Some(Utc::now());
            if !next.completed_step_ids.iter().any(|c| c == step_id) {
                next.completed_step_ids.push(step_id.to_string());
            }
        }
        next.updated_at = Utc::now();
        next
    }

    /// New plan with the given step marked Failed and recorded in
    /// `failed_step_ids`
    pub fn with_step_failed(&self, step_id: &str, error: impl Into<String>) -> Self {
        let mut next = self.clone();
        if let Some(step) = next.steps.iter_mut().find(|s| s.id == step_id) {
            step.status = StepStatus::Failed;
            step.error = Some(error.into());
            step.completed_at = Some(Utc::now());
            if !next.failed_step_ids.iter().any(|f| f == step_id) {
                next.failed_step_ids.push(step_id.to_string());
            }
        }
        next.updated_at = Utc::now();
        next
    }
}
