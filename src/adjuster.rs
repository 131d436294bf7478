//! Plan adjuster - applies structured corrections to a Plan
//!
//! Every application produces a new Plan value; inputs are never mutated.
//! Target resolution is by step id, and the bookkeeping vectors are kept in
//! line with per-step status on every change.

use chrono::Utc;
use thiserror::Error;
use tracing::debug;

use crate::domain::{Adjustment, AdjustmentKind, Plan, Step, StepStatus};

/// Errors from applying an adjustment
#[derive(Debug, Error, PartialEq)]
pub enum AdjustError {
    #[error("Adjustment targets unknown step: {step_id}")]
    StepNotFound { step_id: String },

    #[error("Adjustment {kind} on step {step_id} requires a new_step payload")]
    MissingStepPayload {
        step_id: String,
        kind: AdjustmentKind,
    },
}

/// Apply one adjustment, returning the adjusted Plan
pub fn apply(plan: &Plan, adjustment: &Adjustment) -> Result<Plan, AdjustError> {
    let Some(target_index) = plan.steps.iter().position(|s| s.id == adjustment.step_id) else {
        return Err(AdjustError::StepNotFound {
            step_id: adjustment.step_id.clone(),
        });
    };

    debug!(step_id = %adjustment.step_id, kind = %adjustment.kind, "Applying adjustment");

    let mut next = plan.clone();

    match adjustment.kind {
        AdjustmentKind::Modify => {
            // Keep the existing input when the adjustment carries none
            if let Some(input) = &adjustment.new_tool_input {
                next.steps[target_index].tool_input = input.clone();
            }
        }
        AdjustmentKind::Retry => {
            let step = &mut next.steps[target_index];
            step.status = StepStatus::Pending;
            step.result = None;
            step.error = None;
            step.started_at = None;
            step.completed_at = None;
            if let Some(input) = &adjustment.new_tool_input {
                step.tool_input = input.clone();
            }
            next.failed_step_ids.retain(|id| id != &adjustment.step_id);
            next.completed_step_ids.retain(|id| id != &adjustment.step_id);
        }
        AdjustmentKind::Skip => {
            let step = &mut next.steps[target_index];
            step.status = StepStatus::Skipped;
            step.error = Some(adjustment.reason.clone());
            step.completed_at = Some(Utc::now());
            next.failed_step_ids.retain(|id| id != &adjustment.step_id);
            // Dependents must not wait on a step that will never complete
            for step in &mut next.steps {
                step.dependencies.retain(|dep| dep != &adjustment.step_id);
            }
        }
        AdjustmentKind::AddBefore => {
            let new_step = require_step(adjustment)?;
            let new_id = new_step.id.clone();
            next.steps.insert(target_index, new_step);
            let target = &mut next.steps[target_index + 1];
            if !target.dependencies.contains(&new_id) {
                target.dependencies.push(new_id);
            }
        }
        AdjustmentKind::AddAfter => {
            let mut new_step = require_step(adjustment)?;
            new_step.dependencies = vec![adjustment.step_id.clone()];
            next.steps.insert(target_index + 1, new_step);
        }
        AdjustmentKind::Replace => {
            // The replacement takes the target's id so dependents stay valid
            let mut new_step = require_step(adjustment)?;
            new_step.id = adjustment.step_id.clone();
            next.steps[target_index] = new_step;
            next.failed_step_ids.retain(|id| id != &adjustment.step_id);
            next.completed_step_ids.retain(|id| id != &adjustment.step_id);
        }
    }

    next.updated_at = Utc::now();
    Ok(next)
}

/// Apply adjustments left to right; each sees the previous result.
/// The first failure aborts the batch.
pub fn apply_all(plan: &Plan, adjustments: &[Adjustment]) -> Result<Plan, AdjustError> {
    debug!(count = adjustments.len(), plan_id = %plan.id, "Applying adjustment batch");
    let mut next = plan.clone();
    for adjustment in adjustments {
        next = apply(&next, adjustment)?;
    }
    Ok(next)
}

fn require_step(adjustment: &Adjustment) -> Result<Step, AdjustError> {
    adjustment
        .new_step
        .clone()
        .ok_or_else(|| AdjustError::MissingStepPayload {
            step_id: adjustment.step_id.clone(),
            kind: adjustment.kind,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// a (completed) -> b (failed) -> c (pending, blocked on b)
    fn adjustable_plan() -> Plan {
        let a = Step::new("fetch", "web_search", json!({"query": "rust"}));
        let b = Step::new("transform", "converter", json!({"format": "md"}))
            .with_dependencies(vec![a.id.clone()]);
        let c = Step::new("publish", "uploader", json!({}))
            .with_dependencies(vec![b.id.clone()]);
        let (a_id, b_id) = (a.id.clone(), b.id.clone());

        Plan::new("conv-1", "fetch, transform, publish")
            .with_steps(vec![a, b, c])
            .with_step_completed(&a_id, "fetched 4 pages")
            .with_step_failed(&b_id, "converter crashed")
    }

    #[test]
    fn test_modify_replaces_input() {
        let plan = adjustable_plan();
        let b_id = plan.steps[1].id.clone();

        let adjusted = apply(
            &plan,
            &Adjustment::modify(&b_id, json!({"format": "html"}), "md unsupported"),
        )
        .unwrap();

        assert_eq!(adjusted.step(&b_id).unwrap().tool_input, json!({"format": "html"}));
        // Status is untouched by modify
        assert_eq!(adjusted.step(&b_id).unwrap().status, StepStatus::Failed);
    }

    #[test]
    fn test_modify_without_input_keeps_existing() {
        let plan = adjustable_plan();
        let b_id = plan.steps[1].id.clone();

        let mut adjustment = Adjustment::modify(&b_id, json!({}), "noop");
        adjustment.new_tool_input = None;
        let adjusted = apply(&plan, &adjustment).unwrap();

        assert_eq!(adjusted.step(&b_id).unwrap().tool_input, json!({"format": "md"}));
    }

    #[test]
    fn test_retry_resets_failed_step() {
        let plan = adjustable_plan();
        let b_id = plan.steps[1].id.clone();

        let adjusted = apply(
            &plan,
            &Adjustment::retry(&b_id, "transient crash").with_new_input(json!({"format": "txt"})),
        )
        .unwrap();

        let step = adjusted.step(&b_id).unwrap();
        assert_eq!(step.status, StepStatus::Pending);
        assert!(step.result.is_none());
        assert!(step.error.is_none());
        assert!(step.started_at.is_none());
        assert!(step.completed_at.is_none());
        assert_eq!(step.tool_input, json!({"format": "txt"}));
        assert!(!adjusted.failed_step_ids.contains(&b_id));
    }

    #[test]
    fn test_retry_completed_step_clears_completion_bookkeeping() {
        let plan = adjustable_plan();
        let a_id = plan.steps[0].id.clone();

        let adjusted = apply(&plan, &Adjustment::retry(&a_id, "stale data")).unwrap();

        assert_eq!(adjusted.step(&a_id).unwrap().status, StepStatus::Pending);
        assert!(!adjusted.completed_step_ids.contains(&a_id));
        // And it is ready again
        assert!(adjusted.ready_steps().iter().any(|s| s.id == a_id));
    }

    #[test]
    fn test_skip_releases_dependents() {
        let plan = adjustable_plan();
        let b_id = plan.steps[1].id.clone();
        let c_id = plan.steps[2].id.clone();

        let adjusted = apply(&plan, &Adjustment::skip(&b_id, "not needed after all")).unwrap();

        let skipped = adjusted.step(&b_id).unwrap();
        assert_eq!(skipped.status, StepStatus::Skipped);
        assert_eq!(skipped.error.as_deref(), Some("not needed after all"));
        assert!(!adjusted.failed_step_ids.contains(&b_id));

        // c no longer waits on b and becomes ready immediately
        assert!(adjusted.step(&c_id).unwrap().dependencies.is_empty());
        assert!(adjusted.ready_steps().iter().any(|s| s.id == c_id));
    }

    #[test]
    fn test_add_before_gates_the_target() {
        let plan = adjustable_plan();
        let b_id = plan.steps[1].id.clone();
        let new_step = Step::new("validate input", "reasoning", serde_json::Value::Null);
        let new_id = new_step.id.clone();

        let adjusted = apply(
            &plan,
            &Adjustment::add_before(&b_id, new_step, "validate before converting"),
        )
        .unwrap();

        assert_eq!(adjusted.steps.len(), 4);
        // Inserted directly before the target
        assert_eq!(adjusted.steps[1].id, new_id);
        assert_eq!(adjusted.steps[2].id, b_id);
        assert!(adjusted.steps[2].dependencies.contains(&new_id));
    }

    #[test]
    fn test_add_before_does_not_duplicate_existing_dependency() {
        let plan = adjustable_plan();
        let b_id = plan.steps[1].id.clone();
        let new_step = Step::with_id("pinned-id", "check", "reasoning", serde_json::Value::Null);

        // Target already depends on the incoming id
        let mut plan = plan;
        if let Some(b) = plan.steps.iter_mut().find(|s| s.id == b_id) {
            b.dependencies.push("pinned-id".to_string());
        }

        let adjusted =
            apply(&plan, &Adjustment::add_before(&b_id, new_step, "gate")).unwrap();

        let dep_count = adjusted
            .step(&b_id)
            .unwrap()
            .dependencies
            .iter()
            .filter(|d| d.as_str() == "pinned-id")
            .count();
        assert_eq!(dep_count, 1);
    }

    #[test]
    fn test_add_after_depends_only_on_target() {
        let plan = adjustable_plan();
        let a_id = plan.steps[0].id.clone();
        let new_step = Step::new("cross-check", "reasoning", serde_json::Value::Null)
            .with_dependencies(vec!["unrelated".to_string()]);
        let new_id = new_step.id.clone();

        let adjusted = apply(
            &plan,
            &Adjustment::add_after(&a_id, new_step, "verify fetch output"),
        )
        .unwrap();

        assert_eq!(adjusted.steps[1].id, new_id);
        // Declared dependencies are replaced with exactly the target
        assert_eq!(adjusted.steps[1].dependencies, vec![a_id]);
    }

    #[test]
    fn test_replace_keeps_target_id() {
        let plan = adjustable_plan();
        let b_id = plan.steps[1].id.clone();
        let c_id = plan.steps[2].id.clone();
        let replacement = Step::new("transform with pandoc", "pandoc", json!({"to": "md"}));

        let adjusted = apply(
            &plan,
            &Adjustment::replace(&b_id, replacement, "use a tool that works"),
        )
        .unwrap();

        let replaced = adjusted.step(&b_id).unwrap();
        assert_eq!(replaced.tool_name, "pandoc");
        assert_eq!(replaced.status, StepStatus::Pending);
        assert!(!adjusted.failed_step_ids.contains(&b_id));
        // Dependents still reference the same id
        assert!(adjusted.step(&c_id).unwrap().dependencies.contains(&b_id));
    }

    #[test]
    fn test_unknown_target_errors_and_leaves_plan_untouched() {
        let plan = adjustable_plan();

        let err = apply(&plan, &Adjustment::retry("ghost-step", "nope")).unwrap_err();

        assert_eq!(
            err,
            AdjustError::StepNotFound {
                step_id: "ghost-step".to_string()
            }
        );
        assert_eq!(plan.steps.len(), 3);
        assert_eq!(plan.failed_step_ids.len(), 1);
    }

    #[test]
    fn test_missing_payload_errors() {
        let plan = adjustable_plan();
        let b_id = plan.steps[1].id.clone();

        let mut adjustment = Adjustment::skip(&b_id, "placeholder");
        adjustment.kind = AdjustmentKind::Replace;

        let err = apply(&plan, &adjustment).unwrap_err();
        assert!(matches!(err, AdjustError::MissingStepPayload { kind: AdjustmentKind::Replace, .. }));
        assert!(err.to_string().contains("replace"));
    }

    #[test]
    fn test_apply_is_copy_on_write() {
        let plan = adjustable_plan();
        let b_id = plan.steps[1].id.clone();

        let _adjusted = apply(&plan, &Adjustment::skip(&b_id, "skip it")).unwrap();

        // The input plan still shows the failed step
        assert_eq!(plan.step(&b_id).unwrap().status, StepStatus::Failed);
        assert_eq!(plan.failed_step_ids, vec![b_id]);
    }

    #[test]
    fn test_apply_all_folds_left_to_right() {
        let plan = adjustable_plan();
        let b_id = plan.steps[1].id.clone();
        let c_id = plan.steps[2].id.clone();

        let adjustments = vec![
            Adjustment::skip(&b_id, "converter is broken"),
            Adjustment::modify(&c_id, json!({"visibility": "draft"}), "publish as draft"),
        ];

        let adjusted = apply_all(&plan, &adjustments).unwrap();

        assert_eq!(adjusted.step(&b_id).unwrap().status, StepStatus::Skipped);
        assert_eq!(
            adjusted.step(&c_id).unwrap().tool_input,
            json!({"visibility": "draft"})
        );
    }

    #[test]
    fn test_apply_all_aborts_on_first_error() {
        let plan = adjustable_plan();
        let b_id = plan.steps[1].id.clone();

        let adjustments = vec![
            Adjustment::retry("ghost-step", "bad target"),
            Adjustment::skip(&b_id, "never reached"),
        ];

        let err = apply_all(&plan, &adjustments).unwrap_err();
        assert!(matches!(err, AdjustError::StepNotFound { .. }));
    }

    #[test]
    fn test_error_display() {
        let err = AdjustError::StepNotFound {
            step_id: "step-9".to_string(),
        };
        assert_eq!(err.to_string(), "Adjustment targets unknown step: step-9");
    }
}
