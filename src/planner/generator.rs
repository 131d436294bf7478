//! PlanGenerator - LLM-driven decomposition of a goal into tool steps
//!
//! Builds a system prompt from the tool catalog, asks the reasoning backend
//! for a step list, and converts the reply into a Plan. Dependency indices
//! from the backend are remapped to generated step ids through a table built
//! incrementally, so self and forward references never resolve and the
//! resulting graph is acyclic by construction.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::GeneratorConfig;
use crate::domain::{Plan, REASONING_TOOL, Step};
use crate::llm::{LlmClient, LlmError, strip_code_fences};
use crate::tools::ToolCatalog;

use super::fallback::fallback_steps;

/// Placeholder a step input may carry to reference the previous step's
/// output. Advertised to the backend and passed through to tools verbatim;
/// substitution is the tool server's concern, not this core's.
pub const PREVIOUS_RESULT_PLACEHOLDER: &str = "$previous_result";

/// LLM output schema for one step
#[derive(Debug, Clone, Deserialize)]
struct RawStep {
    /// What the step does
    description: String,
    /// Catalog tool name, or "reasoning"
    tool: String,
    /// Input payload for the tool
    #[serde(default)]
    input: serde_json::Value,
    /// 0-based indices of earlier steps this one depends on
    #[serde(default)]
    depends_on: Vec<usize>,
}

/// Full plan output from the LLM
#[derive(Debug, Clone, Deserialize)]
struct RawPlan {
    steps: Vec<RawStep>,
}

/// PlanGenerator turns a user goal into an initial Plan
pub struct PlanGenerator {
    llm: Arc<dyn LlmClient>,
    catalog: ToolCatalog,
    config: GeneratorConfig,
}

impl PlanGenerator {
    /// Create a new generator
    pub fn new(llm: Arc<dyn LlmClient>, catalog: ToolCatalog, config: GeneratorConfig) -> Self {
        Self { llm, catalog, config }
    }

    /// Generate a Plan for a user query
    ///
    /// Never fails: any backend error or unusable reply routes to the
    /// keyword fallback, so the caller always receives a runnable Plan.
    /// Degraded plan quality, never plan absence.
    pub async fn generate(
        &self,
        conversation_id: &str,
        query: &str,
        context: Option<&str>,
        reflection_enabled: bool,
        max_reflection_cycles: u32,
    ) -> Plan {
        let steps = match self.request_steps(query, context).await {
            Ok(steps) if !steps.is_empty() => steps,
            Ok(_) => {
                warn!("Backend plan had no usable steps, using fallback");
                fallback_steps(query, &self.catalog)
            }
            Err(e) => {
                warn!("Plan generation failed ({}), using fallback", e);
                fallback_steps(query, &self.catalog)
            }
        };

        debug!(step_count = steps.len(), "Generated plan");

        Plan::new(conversation_id, query)
            .with_steps(steps)
            .with_reflection(reflection_enabled, max_reflection_cycles)
    }

    /// Ask the backend for a step list and convert it to domain Steps
    async fn request_steps(
        &self,
        query: &str,
        context: Option<&str>,
    ) -> Result<Vec<Step>, LlmError> {
        let system_prompt = self.build_system_prompt();
        let user_prompt = build_user_prompt(query, context);

        debug!(prompt_len = user_prompt.len(), "Requesting plan from backend");
        let response = self.llm.complete(&system_prompt, &user_prompt).await?;

        let raw = parse_plan_response(&response)?;
        Ok(self.build_steps(raw))
    }

    /// Build the system prompt with the available tools appended
    fn build_system_prompt(&self) -> String {
        let mut prompt = String::from(PLAN_SYSTEM_PROMPT);

        prompt.push_str("\n\n## Available Tools\n");
        for tool in self.catalog.iter() {
            prompt.push_str(&format!("- {}: {}\n", tool.name, tool.description));
        }

        prompt.push_str(&format!(
            "\nBreak the goal into at most {} steps.\n",
            self.config.max_steps
        ));

        prompt
    }

    /// Convert raw steps into domain Steps, remapping dependency indices
    ///
    /// The index → id table is filled as steps are accepted, so a
    /// `depends_on` entry pointing at the step itself, at a later step, or
    /// at a dropped step simply never resolves.
    fn build_steps(&self, raw: RawPlan) -> Vec<Step> {
        let mut steps: Vec<Step> = Vec::new();
        let mut index_to_id: HashMap<usize, String> = HashMap::new();

        for (idx, raw_step) in raw.steps.into_iter().enumerate() {
            if raw_step.tool != REASONING_TOOL && !self.catalog.contains(&raw_step.tool) {
                warn!(tool = %raw_step.tool, "Dropping step with unknown tool");
                continue;
            }

            let dependencies: Vec<String> = raw_step
                .depends_on
                .iter()
                .filter_map(|dep_idx| index_to_id.get(dep_idx).cloned())
                .collect();

            let step = Step::new(raw_step.description, raw_step.tool, raw_step.input)
                .with_dependencies(dependencies);
            index_to_id.insert(idx, step.id.clone());
            steps.push(step);
        }

        steps
    }
}

/// Build the user prompt from the query and optional conversation context
fn build_user_prompt(query: &str, context: Option<&str>) -> String {
    match context {
        Some(context) if !context.is_empty() => {
            format!("Goal: {}\n\nRelevant context:\n{}", query, context)
        }
        _ => format!("Goal: {}", query),
    }
}

/// Parse the backend reply into a RawPlan, tolerating a fenced code block
/// wrapper and a bare step array in place of the `{"steps": [...]}` object.
fn parse_plan_response(response: &str) -> Result<RawPlan, LlmError> {
    let body = strip_code_fences(response);

    if let Ok(plan) = serde_json::from_str::<RawPlan>(body) {
        return Ok(plan);
    }

    let steps: Vec<RawStep> = serde_json::from_str(body)?;
    Ok(RawPlan { steps })
}

/// System prompt for plan generation; the tool list and step limit are
/// appended per request.
const PLAN_SYSTEM_PROMPT: &str = r#"You are a planning assistant that decomposes a user's goal into a sequence of tool invocations.

Rules:
- Use only the tools listed under "Available Tools", by exact name.
- Use the tool name "reasoning" for steps that need thought but no tool call.
- If a step needs the output of the previous step, put the placeholder "$previous_result" in its input where that output should go.
- Express dependencies in "depends_on" as 0-based indices of EARLIER steps in your list. A step may only depend on steps that appear before it.
- Keep steps small and independently checkable.

Respond with JSON only, in this shape:
{
  "steps": [
    {
      "description": "What this step does",
      "tool": "tool_name",
      "input": { "arg": "value" },
      "depends_on": [0]
    }
  ]
}
"#;
