//! planloop - Plan/Execute/Reflect/Adjust engine for autonomous agents
//!
//! Given a natural-language goal, planloop produces a dependency-ordered plan
//! of tool invocations, executes it with bounded concurrency, periodically
//! asks a reasoning backend to critique progress, and applies structured
//! corrections to the in-flight plan until the goal is met, abandoned, or a
//! cycle budget runs out.
//!
//! # Core Concepts
//!
//! - **Plans Are Values**: every mutation returns a new Plan, so each state
//!   of a run can be inspected, compared, and replayed independently
//! - **Collaborators Are Injected**: the reasoning backend, tool backend and
//!   event sink are constructor parameters, never ambient global state
//! - **Backends May Fail, Plans May Not**: generation and reflection absorb
//!   backend failures through deterministic fallbacks
//! - **Cooperative Cancellation**: the signal stops new work from starting;
//!   in-flight invocations drain naturally
//!
//! # Modules
//!
//! - [`domain`] - Plan, Step, Adjustment, ReflectionOutcome value types
//! - [`planner`] - goal + tool catalog to initial Plan
//! - [`executor`] - sequential and parallel plan execution
//! - [`reflector`] - backend critique of an executed plan
//! - [`adjuster`] - applying structured corrections to a plan
//! - [`orchestrator`] - the execute/reflect/adjust loop
//! - [`engine`] - composition root wiring the pipeline from config
//! - [`llm`] - reasoning backend trait and Anthropic implementation
//! - [`tools`] - tool catalog and the invoker seam
//! - [`events`] - broadcast bus for plan lifecycle telemetry
//! - [`config`] - configuration types and loading

pub mod adjuster;
pub mod cancel;
pub mod config;
pub mod domain;
pub mod engine;
pub mod events;
pub mod executor;
pub mod llm;
pub mod orchestrator;
pub mod planner;
pub mod reflector;
pub mod tools;

// Re-export commonly used types
pub use adjuster::AdjustError;
pub use cancel::CancelSignal;
pub use config::{
    Config, ExecutionStrategy, ExecutorConfig, GeneratorConfig, LlmConfig, ReflectorConfig,
};
pub use domain::{
    Adjustment, AdjustmentKind, Assessment, Plan, PlanStatus, REASONING_TOOL, ReflectionOutcome,
    Step, StepStatus,
};
pub use engine::PlanEngine;
pub use events::{EventBus, EventEmitter, PlanEvent, create_event_bus};
pub use executor::PlanExecutor;
pub use llm::{AnthropicClient, LlmClient, LlmError, create_client};
pub use orchestrator::Orchestrator;
pub use planner::{PREVIOUS_RESULT_PLACEHOLDER, PlanGenerator};
pub use reflector::PlanReflector;
pub use tools::{ToolCatalog, ToolDescriptor, ToolError, ToolInvoker};
