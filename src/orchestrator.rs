//! Orchestrator - the execute/reflect/adjust loop
//!
//! Drives a Plan through executor passes with reflection between them,
//! bounded by the plan's cycle budget and the cancel signal. One loop
//! iteration is one reflection cycle. Reflector and Adjuster problems
//! degrade gracefully; executor errors are defects and propagate.

use std::sync::Arc;

use eyre::Result;
use tracing::{debug, info, warn};

use crate::adjuster;
use crate::cancel::CancelSignal;
use crate::domain::{Assessment, Plan, PlanStatus};
use crate::events::EventBus;
use crate::executor::PlanExecutor;
use crate::reflector::PlanReflector;

/// Orchestrator owns the outer plan lifecycle
pub struct Orchestrator {
    executor: PlanExecutor,
    reflector: PlanReflector,
    events: Arc<EventBus>,
}

impl Orchestrator {
    /// Create a new orchestrator
    pub fn new(executor: PlanExecutor, reflector: PlanReflector, events: Arc<EventBus>) -> Self {
        Self {
            executor,
            reflector,
            events,
        }
    }

    /// Run the plan to a settled state.
    ///
    /// Single-pass when reflection is disabled; otherwise execution and
    /// reflection alternate until the plan resolves, the reflection verdict
    /// is terminal, the cycle budget runs out, or cancellation is requested.
    pub async fn run(&self, plan: Plan, cancel: &CancelSignal) -> Result<Plan> {
        let emitter = self.events.emitter_for(&plan.id);
        info!(
            plan_id = %plan.id,
            reflection = plan.reflection_enabled,
            max_cycles = plan.max_reflection_cycles,
            "Orchestrating plan"
        );

        let mut plan = plan;
        let mut cycle: u32 = 0;

        loop {
            if cancel.is_cancelled() {
                info!(plan_id = %plan.id, "Cancelled before execution");
                return Ok(mark_cancelled(plan));
            }

            // Executor errors are defects, not business outcomes
            plan = self.executor.execute(plan, cancel).await?;

            if cancel.is_cancelled() {
                info!(plan_id = %plan.id, "Cancelled after execution");
                return Ok(mark_cancelled(plan));
            }

            if !plan.reflection_enabled {
                debug!(plan_id = %plan.id, "Reflection disabled, single pass");
                return Ok(plan);
            }

            // A plan that resolved itself needs no reflection
            if plan.status.is_terminal() {
                debug!(plan_id = %plan.id, status = %plan.status, "Plan resolved, stopping");
                return Ok(plan);
            }

            if cycle >= plan.max_reflection_cycles {
                info!(plan_id = %plan.id, cycle, "Reflection cycle budget exhausted");
                return Ok(plan);
            }

            let outcome = self.reflector.reflect(&plan).await;
            emitter.reflection_completed(cycle, outcome.assessment);
            info!(
                plan_id = %plan.id,
                cycle,
                assessment = %outcome.assessment,
                adjustments = outcome.adjustments.len(),
                "Reflection verdict"
            );

            match outcome.assessment {
                Assessment::Complete => {
                    return Ok(plan.with_status(PlanStatus::Completed));
                }
                Assessment::Failed => {
                    return Ok(plan.with_failure(outcome.reasoning));
                }
                _ => {}
            }

            let has_adjustments = !outcome.adjustments.is_empty();
            if has_adjustments {
                match adjuster::apply_all(&plan, &outcome.adjustments) {
                    Ok(adjusted) => {
                        emitter.adjustments_applied(cycle, outcome.adjustments.len());
                        plan = adjusted;
                    }
                    Err(e) => {
                        // A bad reflection proposal must not sink the plan
                        warn!(plan_id = %plan.id, error = %e, "Adjustments rejected, continuing unchanged");
                    }
                }
            }

            cycle += 1;

            match outcome.assessment {
                Assessment::OnTrack if !has_adjustments => {
                    debug!(plan_id = %plan.id, "On track with nothing to change");
                    return Ok(plan);
                }
                Assessment::OffTrack if !has_adjustments => {
                    // Off track with no proposed fix is itself a failure
                    return Ok(plan.with_failure(outcome.reasoning));
                }
                _ => {}
            }
        }
    }
}

/// Idempotent Cancelled transition; the executor may have resolved it already
fn mark_cancelled(plan: Plan) -> Plan {
    if plan.status == PlanStatus::Cancelled {
        plan
    } else {
        plan.with_status(PlanStatus::Cancelled)
    }
}
