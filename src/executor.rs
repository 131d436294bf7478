//! PlanExecutor - runs a Plan's steps honoring dependencies
//!
//! Two strategies, picked at construction: sequential (one step at a time,
//! first failure halts the run) and parallel (semaphore-bounded concurrency,
//! failures isolated to their dependency subtree). Tool failures become Plan
//! state; the returned `Result` only carries defects such as a panicked
//! step task.

use std::sync::Arc;
use std::time::Instant;

use eyre::{Context, Result};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::cancel::CancelSignal;
use crate::config::{ExecutionStrategy, ExecutorConfig};
use crate::domain::{Plan, PlanStatus, Step, excerpt};
use crate::events::{EventBus, EventEmitter};
use crate::tools::{ToolError, ToolInvoker};

/// Cap on result/error text carried in StepCompleted events
const RESULT_EXCERPT_CHARS: usize = 200;

/// PlanExecutor drives a Plan to a settled state
pub struct PlanExecutor {
    invoker: Arc<dyn ToolInvoker>,
    events: Arc<EventBus>,
    config: ExecutorConfig,
}

impl PlanExecutor {
    /// Create a new executor
    pub fn new(invoker: Arc<dyn ToolInvoker>, events: Arc<EventBus>, config: ExecutorConfig) -> Self {
        Self {
            invoker,
            events,
            config,
        }
    }

    /// Execute the plan until it completes, fails, stalls, or is cancelled.
    ///
    /// Always returns the resulting Plan value; the input is untouched.
    /// Cancellation stops new step launches, while in-flight invocations
    /// drain naturally.
    pub async fn execute(&self, plan: Plan, cancel: &CancelSignal) -> Result<Plan> {
        info!(
            plan_id = %plan.id,
            strategy = %self.config.strategy,
            steps = plan.steps.len(),
            "Executing plan"
        );

        let emitter = self.events.emitter_for(&plan.id);
        emitter.execution_started(&plan.conversation_id, plan.steps.len());

        let plan = plan.with_status(PlanStatus::Executing);

        let plan = match self.config.strategy {
            ExecutionStrategy::Sequential => self.run_sequential(plan, cancel, &emitter).await?,
            ExecutionStrategy::Parallel => self.run_parallel(plan, cancel, &emitter).await?,
        };

        let plan = resolve_status(plan, cancel);

        info!(
            plan_id = %plan.id,
            status = %plan.status,
            completed = plan.completed_step_ids.len(),
            failed = plan.failed_step_ids.len(),
            "Plan execution finished"
        );
        emitter.execution_completed(
            plan.status,
            plan.completed_step_ids.len(),
            plan.failed_step_ids.len(),
        );

        Ok(plan)
    }

    /// One step at a time, in insertion order among ready steps.
    /// The first failed invocation halts the run.
    async fn run_sequential(
        &self,
        mut plan: Plan,
        cancel: &CancelSignal,
        emitter: &EventEmitter,
    ) -> Result<Plan> {
        while !plan.is_complete() && !cancel.is_cancelled() {
            let Some(step) = plan.ready_steps().first().map(|s| (*s).clone()) else {
                warn_if_stuck(&plan);
                break;
            };

            emitter.step_ready(&step.id, &step.tool_name);
            plan = plan.with_step_running(&step.id);

            let started = Instant::now();
            let outcome = invoke_step(self.invoker.as_ref(), &step, &plan.conversation_id).await;
            let duration_ms = started.elapsed().as_millis() as u64;

            match outcome {
                Ok(result) => {
                    emitter.step_completed(
                        &step.id,
                        true,
                        &excerpt(&result, RESULT_EXCERPT_CHARS),
                        duration_ms,
                    );
                    plan = plan.with_step_completed(&step.id, result);
                }
                Err(e) => {
                    let error = e.to_string();
                    warn!(step_id = %step.id, error = %error, "Step failed, halting sequential run");
                    emitter.step_completed(
                        &step.id,
                        false,
                        &excerpt(&error, RESULT_EXCERPT_CHARS),
                        duration_ms,
                    );
                    plan = plan.with_step_failed(&step.id, error);
                    break;
                }
            }
        }

        Ok(plan)
    }

    /// Launch every ready step as its own task, bounded by the admission
    /// gate; fold completions back into the Plan one at a time.
    ///
    /// A failure only strands its own dependents. The loop ends when no
    /// step is ready and nothing is in flight.
    async fn run_parallel(
        &self,
        mut plan: Plan,
        cancel: &CancelSignal,
        emitter: &EventEmitter,
    ) -> Result<Plan> {
        let gate = Arc::new(Semaphore::new(self.config.max_parallel_steps));
        let mut tasks: JoinSet<(String, Result<String, ToolError>, u64)> = JoinSet::new();

        loop {
            if !cancel.is_cancelled() {
                let ready: Vec<Step> = plan.ready_steps().into_iter().cloned().collect();
                for step in ready {
                    emitter.step_ready(&step.id, &step.tool_name);
                    plan = plan.with_step_running(&step.id);

                    let invoker = self.invoker.clone();
                    let gate = gate.clone();
                    let conversation_id = plan.conversation_id.clone();
                    tasks.spawn(async move {
                        let permit = match gate.acquire_owned().await {
                            Ok(permit) => permit,
                            Err(e) => {
                                let err = ToolError::invocation(format!("admission gate closed: {}", e));
                                return (step.id.clone(), Err(err), 0);
                            }
                        };

                        let started = Instant::now();
                        let outcome =
                            invoke_step(invoker.as_ref(), &step, &conversation_id).await;
                        let duration_ms = started.elapsed().as_millis() as u64;
                        drop(permit);

                        (step.id.clone(), outcome, duration_ms)
                    });
                }
            }

            // Nothing launched and nothing in flight: the run is over
            let Some(joined) = tasks.join_next().await else {
                break;
            };
            let (step_id, outcome, duration_ms) =
                joined.context("Parallel step task failed to join")?;

            match outcome {
                Ok(result) => {
                    emitter.step_completed(
                        &step_id,
                        true,
                        &excerpt(&result, RESULT_EXCERPT_CHARS),
                        duration_ms,
                    );
                    plan = plan.with_step_completed(&step_id, result);
                }
                Err(e) => {
                    let error = e.to_string();
                    warn!(step_id = %step_id, error = %error, "Step failed, dependents will not run");
                    emitter.step_completed(
                        &step_id,
                        false,
                        &excerpt(&error, RESULT_EXCERPT_CHARS),
                        duration_ms,
                    );
                    plan = plan.with_step_failed(&step_id, error);
                }
            }
        }

        if !cancel.is_cancelled() {
            warn_if_stuck(&plan);
        }

        Ok(plan)
    }
}

/// Run one step: reasoning-only steps synthesize a local acknowledgement,
/// everything else goes through the invoker.
async fn invoke_step(
    invoker: &dyn ToolInvoker,
    step: &Step,
    conversation_id: &str,
) -> Result<String, ToolError> {
    if step.is_reasoning_only() {
        debug!(step_id = %step.id, "Reasoning-only step, synthesizing result");
        return Ok(format!("Completed reasoning: {}", step.description));
    }

    debug!(step_id = %step.id, tool = %step.tool_name, "Invoking tool");
    invoker
        .invoke(&step.tool_name, &step.tool_input, conversation_id)
        .await
}

/// Post-run status resolution, in precedence order: Cancelled, Failed,
/// Completed, else the plan keeps its Executing status (the stuck case
/// stays non-terminal so it can be inspected and adjusted).
fn resolve_status(plan: Plan, cancel: &CancelSignal) -> Plan {
    if cancel.is_cancelled() {
        return plan.with_status(PlanStatus::Cancelled);
    }

    if let Some(step_id) = plan.failed_step_ids.first() {
        let reason = match plan.step(step_id).and_then(|s| s.error.as_deref()) {
            Some(error) => format!("Step {} failed: {}", step_id, error),
            None => format!("Step {} failed", step_id),
        };
        return plan.with_failure(reason);
    }

    if plan.is_complete() {
        return plan.with_status(PlanStatus::Completed);
    }

    plan
}

/// Diagnose an exit that left pending steps behind without any failure to
/// explain it: either a dependency cycle or dangling dependency ids.
fn warn_if_stuck(plan: &Plan) {
    if plan.pending_count() == 0 || plan.has_failures() {
        return;
    }

    match plan.dependency_cycle() {
        Some(cycle) => {
            warn!(plan_id = %plan.id, cycle = ?cycle, "Plan stuck: dependency cycle")
        }
        None => {
            warn!(plan_id = %plan.id, "Plan stuck: pending steps with unsatisfiable dependencies")
        }
    }
}
