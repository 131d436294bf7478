//! PlanEngine - composition root
//!
//! Wires the generator, executor, reflector and orchestrator from a Config
//! plus injected collaborators. Everything is constructor-injected; there
//! are no global registries and no state kept between calls.

use std::sync::Arc;

use eyre::Result;

use crate::cancel::CancelSignal;
use crate::config::Config;
use crate::domain::Plan;
use crate::events::EventBus;
use crate::executor::PlanExecutor;
use crate::llm::LlmClient;
use crate::orchestrator::Orchestrator;
use crate::planner::PlanGenerator;
use crate::reflector::PlanReflector;
use crate::tools::{ToolCatalog, ToolInvoker};

/// The assembled plan pipeline: generate, then orchestrate
pub struct PlanEngine {
    generator: PlanGenerator,
    orchestrator: Orchestrator,
    events: Arc<EventBus>,
}

impl PlanEngine {
    /// Assemble an engine from config and collaborators
    pub fn new(
        llm: Arc<dyn LlmClient>,
        invoker: Arc<dyn ToolInvoker>,
        catalog: ToolCatalog,
        events: Arc<EventBus>,
        config: Config,
    ) -> Self {
        let generator = PlanGenerator::new(llm.clone(), catalog, config.generator);
        let executor = PlanExecutor::new(invoker, events.clone(), config.executor);
        let reflector = PlanReflector::new(llm, config.reflector);
        let orchestrator = Orchestrator::new(executor, reflector, events.clone());

        Self {
            generator,
            orchestrator,
            events,
        }
    }

    /// Produce an initial Plan for a goal. Never fails; see `PlanGenerator`.
    pub async fn generate_plan(
        &self,
        conversation_id: &str,
        query: &str,
        context: Option<&str>,
        reflection_enabled: bool,
        max_reflection_cycles: u32,
    ) -> Plan {
        self.generator
            .generate(
                conversation_id,
                query,
                context,
                reflection_enabled,
                max_reflection_cycles,
            )
            .await
    }

    /// Run the full execute/reflect/adjust loop on a plan
    pub async fn run(&self, plan: Plan, cancel: &CancelSignal) -> Result<Plan> {
        self.orchestrator.run(plan, cancel).await
    }

    /// The bus lifecycle events are published on
    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }
}
