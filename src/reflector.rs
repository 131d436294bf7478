//! PlanReflector - backend critique of an executed Plan
//!
//! Summarizes the plan's progress into a prompt, asks the reasoning backend
//! for an assessment plus structured adjustments, and parses the reply
//! leniently: unknown actions and malformed entries are dropped, never
//! propagated. Any backend or parse failure falls back to a rule-based
//! verdict derived from plan state, so `reflect` never errors.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::ReflectorConfig;
use crate::domain::{
    Adjustment, AdjustmentKind, Assessment, Plan, PlanStatus, ReflectionOutcome, Step, excerpt,
};
use crate::llm::{LlmClient, LlmError, strip_code_fences};

/// LLM output schema for one proposed adjustment
#[derive(Debug, Clone, Deserialize)]
struct RawAdjustment {
    step_id: Option<String>,
    action: Option<String>,
    #[serde(default)]
    reason: Option<String>,
    new_tool_input: Option<serde_json::Value>,
    new_tool_name: Option<String>,
    new_step: Option<RawNewStep>,
}

/// LLM output schema for an inserted/replacement step
#[derive(Debug, Clone, Deserialize)]
struct RawNewStep {
    description: String,
    tool: String,
    #[serde(default)]
    input: serde_json::Value,
    /// Existing step ids the new step depends on
    #[serde(default)]
    depends_on: Vec<String>,
}

/// Full reflection output from the LLM
#[derive(Debug, Clone, Deserialize)]
struct RawReflection {
    overall_assessment: Option<String>,
    reasoning: Option<String>,
    #[serde(default)]
    adjustments: Vec<RawAdjustment>,
    suggested_next_steps: Option<Vec<String>>,
    confidence: Option<f64>,
    final_summary: Option<String>,
    error_type: Option<String>,
}

/// PlanReflector renders a verdict over an executed Plan
pub struct PlanReflector {
    llm: Arc<dyn LlmClient>,
    config: ReflectorConfig,
}

impl PlanReflector {
    /// Create a new reflector
    pub fn new(llm: Arc<dyn LlmClient>, config: ReflectorConfig) -> Self {
        Self { llm, config }
    }

    /// Assess the plan's trajectory and propose corrections.
    ///
    /// Never fails: backend errors and unparseable replies route to a
    /// conservative rule-based outcome computed from plan state alone.
    pub async fn reflect(&self, plan: &Plan) -> ReflectionOutcome {
        let user_prompt = self.build_user_prompt(plan);
        debug!(plan_id = %plan.id, prompt_len = user_prompt.len(), "Requesting reflection");

        match self.request_outcome(&user_prompt).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(plan_id = %plan.id, "Reflection unavailable ({}), using rule-based outcome", e);
                rule_based_outcome(plan)
            }
        }
    }

    async fn request_outcome(&self, user_prompt: &str) -> Result<ReflectionOutcome, LlmError> {
        let response = self.llm.complete(REFLECTION_SYSTEM_PROMPT, user_prompt).await?;
        let raw: RawReflection = serde_json::from_str(strip_code_fences(&response))?;
        Ok(convert_reflection(raw))
    }

    /// One line per step: id, status, tool, description, and a bounded
    /// result or error excerpt.
    fn build_user_prompt(&self, plan: &Plan) -> String {
        let mut prompt = format!(
            "Goal: {}\n\nProgress: {} of {} steps completed, {} failed.\n\nSteps:\n",
            plan.user_query,
            plan.completed_step_ids.len(),
            plan.steps.len(),
            plan.failed_step_ids.len(),
        );

        for step in &plan.steps {
            let detail = match (&step.result, &step.error) {
                (Some(result), _) => {
                    format!(" -> {}", excerpt(result, self.config.max_excerpt_chars))
                }
                (None, Some(error)) => {
                    format!(" -> error: {}", excerpt(error, self.config.max_excerpt_chars))
                }
                (None, None) => String::new(),
            };
            prompt.push_str(&format!(
                "- [{}] {} ({}): {}{}\n",
                step.id, step.status, step.tool_name, step.description, detail
            ));
        }

        prompt
    }
}

/// Convert the raw reply into a ReflectionOutcome, dropping entries that
/// cannot be interpreted.
fn convert_reflection(raw: RawReflection) -> ReflectionOutcome {
    let assessment = raw
        .overall_assessment
        .as_deref()
        .and_then(Assessment::parse);

    let Some(assessment) = assessment else {
        if let Some(value) = raw.overall_assessment {
            warn!(value = %value, "Unknown overall_assessment, defaulting to on_track");
        }
        return ReflectionOutcome::on_track(
            raw.reasoning
                .unwrap_or_else(|| "No assessment provided".to_string()),
        );
    };

    let adjustments: Vec<Adjustment> = raw
        .adjustments
        .into_iter()
        .filter_map(convert_adjustment)
        .collect();

    ReflectionOutcome {
        assessment,
        reasoning: raw.reasoning.unwrap_or_default(),
        adjustments,
        suggested_next_steps: raw.suggested_next_steps,
        confidence: raw.confidence,
        final_summary: raw.final_summary,
        error_type: raw.error_type,
    }
}

/// Interpret one raw adjustment; `None` means it is dropped
fn convert_adjustment(raw: RawAdjustment) -> Option<Adjustment> {
    let Some(action) = raw.action else {
        warn!("Dropping adjustment without an action");
        return None;
    };
    let Some(kind) = AdjustmentKind::parse(&action) else {
        warn!(action = %action, "Dropping adjustment with unknown action");
        return None;
    };
    let Some(step_id) = raw.step_id else {
        warn!(kind = %kind, "Dropping adjustment without a step_id");
        return None;
    };

    // New steps get fresh ids; the backend never dictates id format
    let new_step = raw
        .new_step
        .map(|s| Step::new(s.description, s.tool, s.input).with_dependencies(s.depends_on));

    Some(Adjustment {
        step_id,
        kind,
        reason: raw.reason.unwrap_or_default(),
        new_tool_input: raw.new_tool_input,
        new_tool_name: raw.new_tool_name,
        new_step,
    })
}

/// Conservative verdict from plan state alone, used whenever the backend
/// cannot be consulted.
fn rule_based_outcome(plan: &Plan) -> ReflectionOutcome {
    match plan.status {
        PlanStatus::Completed => ReflectionOutcome::complete(
            "All steps completed",
            format!(
                "Completed {} of {} steps",
                plan.completed_step_ids.len(),
                plan.steps.len()
            ),
        ),
        PlanStatus::Failed => ReflectionOutcome::failed(
            plan.error
                .clone()
                .unwrap_or_else(|| "Plan execution failed".to_string()),
            "execution_failure",
        ),
        _ if plan.has_failures() => {
            ReflectionOutcome::needs_adjustment("Failed steps present", Vec::new())
        }
        _ => ReflectionOutcome::on_track("No issues detected"),
    }
}

/// System prompt for reflection
const REFLECTION_SYSTEM_PROMPT: &str = r#"You are reviewing the execution of a step-by-step plan against its goal.

Assess the trajectory and, when something is wrong, propose concrete corrections to individual steps.

Respond with JSON only, in this shape:
{
  "overall_assessment": "on_track | needs_adjustment | off_track | complete | failed",
  "reasoning": "Why you reached this assessment",
  "adjustments": [
    {
      "step_id": "id of the step to change",
      "action": "modify | retry | skip | add_before | add_after | replace",
      "reason": "Why this change helps",
      "new_tool_input": { "arg": "value" },
      "new_tool_name": "tool name, for replace",
      "new_step": {
        "description": "what the inserted step does",
        "tool": "tool name or reasoning",
        "input": { "arg": "value" },
        "depends_on": ["existing step ids"]
      }
    }
  ],
  "suggested_next_steps": ["free-form follow-ups, if any"],
  "confidence": 0.8,
  "final_summary": "set only when assessment is complete",
  "error_type": "set only when assessment is failed"
}

Rules:
- Use "complete" only when the goal itself is achieved.
- Use "failed" only when no adjustment could still achieve the goal.
- "new_step" is required for add_before, add_after and replace.
- Omit "adjustments" entirely when nothing needs to change.
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::MockLlmClient;
    use serde_json::json;

    fn reflector_with(responses: Vec<String>) -> PlanReflector {
        PlanReflector::new(
            Arc::new(MockLlmClient::new(responses)),
            ReflectorConfig::default(),
        )
    }

    fn executed_plan() -> Plan {
        let a = Step::new("search", "web_search", json!({"query": "x"}));
        let b = Step::new("summarize", "reasoning", serde_json::Value::Null);
        let plan = Plan::new("conv-1", "find and summarize x").with_steps(vec![a.clone(), b]);
        plan.with_step_completed(&a.id, "3 results found")
    }

    #[tokio::test]
    async fn test_reflect_parses_assessment_and_adjustments() {
        let target_id = executed_plan().steps[0].id.clone();
        let response = format!(
            r#"```json
{{
  "overall_assessment": "needs_adjustment",
  "reasoning": "the query was too broad",
  "adjustments": [
    {{"step_id": "{}", "action": "retry", "reason": "narrow it", "new_tool_input": {{"query": "x 2024"}}}}
  ],
  "confidence": 0.7
}}
```"#,
            target_id
        );
        let reflector = reflector_with(vec![response]);

        let outcome = reflector.reflect(&executed_plan()).await;

        assert_eq!(outcome.assessment, Assessment::NeedsAdjustment);
        assert_eq!(outcome.adjustments.len(), 1);
        assert_eq!(outcome.adjustments[0].kind, AdjustmentKind::Retry);
        assert_eq!(outcome.adjustments[0].step_id, target_id);
        assert_eq!(outcome.confidence, Some(0.7));
    }

    #[tokio::test]
    async fn test_unknown_action_is_dropped_not_fatal() {
        let response = r#"{
  "overall_assessment": "needs_adjustment",
  "reasoning": "mixed bag",
  "adjustments": [
    {"step_id": "step-1", "action": "rollback", "reason": "unsupported"},
    {"step_id": "step-1", "action": "skip", "reason": "fine"}
  ]
}"#;
        let reflector = reflector_with(vec![response.to_string()]);

        let outcome = reflector.reflect(&executed_plan()).await;

        assert_eq!(outcome.adjustments.len(), 1);
        assert_eq!(outcome.adjustments[0].kind, AdjustmentKind::Skip);
    }

    #[tokio::test]
    async fn test_adjustment_without_step_id_is_dropped() {
        let response = r#"{
  "overall_assessment": "needs_adjustment",
  "reasoning": "incomplete proposal",
  "adjustments": [{"action": "retry", "reason": "no target given"}]
}"#;
        let reflector = reflector_with(vec![response.to_string()]);

        let outcome = reflector.reflect(&executed_plan()).await;

        assert!(outcome.adjustments.is_empty());
    }

    #[tokio::test]
    async fn test_missing_assessment_defaults_to_on_track() {
        let response = r#"{"reasoning": "not sure what to say"}"#;
        let reflector = reflector_with(vec![response.to_string()]);

        let outcome = reflector.reflect(&executed_plan()).await;

        assert_eq!(outcome.assessment, Assessment::OnTrack);
        assert!(outcome.adjustments.is_empty());
    }

    #[tokio::test]
    async fn test_new_step_payload_gets_generated_id() {
        let response = r#"{
  "overall_assessment": "needs_adjustment",
  "reasoning": "needs a verification pass",
  "adjustments": [
    {
      "step_id": "step-1",
      "action": "add_after",
      "reason": "verify results",
      "new_step": {"description": "Verify findings", "tool": "reasoning", "input": null}
    }
  ]
}"#;
        let reflector = reflector_with(vec![response.to_string()]);

        let outcome = reflector.reflect(&executed_plan()).await;

        let step = outcome.adjustments[0].new_step.as_ref().unwrap();
        assert!(step.id.contains("-step-"));
        assert!(step.is_reasoning_only());
    }

    #[tokio::test]
    async fn test_backend_failure_on_completed_plan_reports_complete() {
        let reflector = PlanReflector::new(
            Arc::new(MockLlmClient::failing()),
            ReflectorConfig::default(),
        );
        let plan = executed_plan().with_status(PlanStatus::Completed);

        let outcome = reflector.reflect(&plan).await;

        assert_eq!(outcome.assessment, Assessment::Complete);
        assert!(outcome.final_summary.is_some());
    }

    #[tokio::test]
    async fn test_backend_failure_on_failed_plan_carries_plan_error() {
        let reflector = PlanReflector::new(
            Arc::new(MockLlmClient::failing()),
            ReflectorConfig::default(),
        );
        let plan = executed_plan().with_failure("Step step-1 failed: boom");

        let outcome = reflector.reflect(&plan).await;

        assert_eq!(outcome.assessment, Assessment::Failed);
        assert!(outcome.reasoning.contains("boom"));
        assert_eq!(outcome.error_type.as_deref(), Some("execution_failure"));
    }

    #[tokio::test]
    async fn test_backend_failure_with_failed_steps_needs_adjustment() {
        let reflector = PlanReflector::new(
            Arc::new(MockLlmClient::failing()),
            ReflectorConfig::default(),
        );
        let plan = executed_plan();
        let failed_id = plan.steps[1].id.clone();
        let plan = plan.with_step_failed(&failed_id, "tool exploded");

        let outcome = reflector.reflect(&plan).await;

        assert_eq!(outcome.assessment, Assessment::NeedsAdjustment);
        assert!(outcome.adjustments.is_empty());
    }

    #[tokio::test]
    async fn test_backend_failure_on_healthy_plan_is_on_track() {
        let reflector = PlanReflector::new(
            Arc::new(MockLlmClient::failing()),
            ReflectorConfig::default(),
        );

        let outcome = reflector.reflect(&executed_plan()).await;

        assert_eq!(outcome.assessment, Assessment::OnTrack);
        assert!(!outcome.is_terminal());
    }

    #[test]
    fn test_prompt_includes_step_lines_and_excerpts() {
        let reflector = PlanReflector::new(
            Arc::new(MockLlmClient::new(vec![])),
            ReflectorConfig { max_excerpt_chars: 10 },
        );
        let plan = executed_plan();

        let prompt = reflector.build_user_prompt(&plan);

        assert!(prompt.contains("find and summarize x"));
        assert!(prompt.contains("1 of 2 steps completed"));
        assert!(prompt.contains(&plan.steps[0].id));
        // The 15-char result is cut at 10 chars, trailing space trimmed
        assert!(prompt.contains("3 results..."));
        assert!(!prompt.contains("3 results found"));
    }
}
