//! Event bus - pub/sub for plan lifecycle events
//!
//! Built on tokio broadcast channels. Components emit, consumers (progress
//! displays, loggers) subscribe. Emission is fire-and-forget: no subscribers
//! means the event is dropped, and a full channel drops the oldest events.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::debug;

use super::types::PlanEvent;
use crate::domain::{Assessment, PlanStatus};

/// Default channel capacity (events). Plan runs emit a handful of lifecycle
/// events per step, so this comfortably buffers even large parallel plans.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Central event bus for plan execution telemetry
pub struct EventBus {
    tx: broadcast::Sender<PlanEvent>,
}

impl EventBus {
    /// Create a new event bus with the given capacity
    pub fn new(capacity: usize) -> Self {
        debug!(capacity, "EventBus::new: creating event bus");
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Create a new event bus with default capacity
    pub fn with_default_capacity() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Emit an event to all subscribers
    ///
    /// Fire-and-forget: delivery failures never affect plan execution.
    pub fn emit(&self, event: PlanEvent) {
        debug!(
            event_type = event.event_type(),
            plan_id = event.plan_id(),
            "EventBus::emit"
        );
        // Ignore send errors (no subscribers is OK)
        let _ = self.tx.send(event);
    }

    /// Subscribe to events emitted after this call
    pub fn subscribe(&self) -> broadcast::Receiver<PlanEvent> {
        debug!("EventBus::subscribe: new subscriber");
        self.tx.subscribe()
    }

    /// Create an emitter handle bound to one plan
    pub fn emitter_for(&self, plan_id: impl Into<String>) -> EventEmitter {
        let plan_id = plan_id.into();
        debug!(%plan_id, "EventBus::emitter_for: creating emitter");
        EventEmitter {
            tx: self.tx.clone(),
            plan_id,
        }
    }

    /// Number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}

/// Handle for components to emit events without owning the bus
///
/// Cheap to clone; every event it emits carries the bound plan ID.
#[derive(Clone)]
pub struct EventEmitter {
    tx: broadcast::Sender<PlanEvent>,
    plan_id: String,
}

impl EventEmitter {
    /// The plan ID this emitter is bound to
    pub fn plan_id(&self) -> &str {
        &self.plan_id
    }

    /// Emit a raw event
    pub fn emit(&self, event: PlanEvent) {
        debug!(event_type = event.event_type(), "EventEmitter::emit");
        let _ = self.tx.send(event);
    }

    // === Convenience methods ===

    /// An executor pass has begun
    pub fn execution_started(&self, conversation_id: &str, total_steps: usize) {
        self.emit(PlanEvent::PlanExecutionStarted {
            plan_id: self.plan_id.clone(),
            conversation_id: conversation_id.to_string(),
            total_steps,
        });
    }

    /// A step became ready and is being launched
    pub fn step_ready(&self, step_id: &str, tool_name: &str) {
        self.emit(PlanEvent::StepReady {
            plan_id: self.plan_id.clone(),
            step_id: step_id.to_string(),
            tool_name: tool_name.to_string(),
        });
    }

    /// A step invocation finished
    pub fn step_completed(&self, step_id: &str, success: bool, summary: &str, duration_ms: u64) {
        self.emit(PlanEvent::StepCompleted {
            plan_id: self.plan_id.clone(),
            step_id: step_id.to_string(),
            success,
            summary: summary.to_string(),
            duration_ms,
        });
    }

    /// The executor pass resolved
    pub fn execution_completed(
        &self,
        status: PlanStatus,
        completed_steps: usize,
        failed_steps: usize,
    ) {
        self.emit(PlanEvent::PlanExecutionCompleted {
            plan_id: self.plan_id.clone(),
            status,
            completed_steps,
            failed_steps,
        });
    }

    /// A reflection pass rendered its verdict
    pub fn reflection_completed(&self, cycle: u32, assessment: Assessment) {
        self.emit(PlanEvent::ReflectionCompleted {
            plan_id: self.plan_id.clone(),
            cycle,
            assessment,
        });
    }

    /// Adjustments were applied to the plan
    pub fn adjustments_applied(&self, cycle: u32, count: usize) {
        self.emit(PlanEvent::AdjustmentsApplied {
            plan_id: self.plan_id.clone(),
            cycle,
            count,
        });
    }
}

/// Create an event bus wrapped in an Arc for shared ownership
pub fn create_event_bus() -> Arc<EventBus> {
    Arc::new(EventBus::with_default_capacity())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    #[test]
    fn test_event_bus_creation() {
        let bus = EventBus::new(100);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_event_bus_subscribe() {
        let bus = EventBus::new(100);
        let _rx1 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        let _rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_bus_emit_receive() {
        let bus = EventBus::new(100);
        let mut rx = bus.subscribe();

        bus.emit(PlanEvent::StepReady {
            plan_id: "plan-123".to_string(),
            step_id: "step-1".to_string(),
            tool_name: "web_search".to_string(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.plan_id(), "plan-123");
        assert_eq!(event.event_type(), "StepReady");
    }

    #[tokio::test]
    async fn test_event_bus_no_subscribers() {
        let bus = EventBus::new(100);
        // Must not panic with no subscribers
        bus.emit(PlanEvent::StepReady {
            plan_id: "plan-123".to_string(),
            step_id: "step-1".to_string(),
            tool_name: "web_search".to_string(),
        });
    }

    #[tokio::test]
    async fn test_event_emitter_convenience_methods() {
        let bus = EventBus::new(100);
        let mut rx = bus.subscribe();
        let emitter = bus.emitter_for("plan-789");

        emitter.execution_started("conv-1", 4);
        emitter.step_ready("step-1", "web_search");
        emitter.step_completed("step-1", true, "3 results", 120);
        emitter.reflection_completed(1, Assessment::OnTrack);
        emitter.adjustments_applied(1, 2);
        emitter.execution_completed(PlanStatus::Completed, 4, 0);

        for _ in 0..6 {
            let event = rx.recv().await.unwrap();
            assert_eq!(event.plan_id(), "plan-789");
        }
        assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_multiple_subscribers() {
        let bus = EventBus::new(100);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.emit(PlanEvent::StepReady {
            plan_id: "plan-1".to_string(),
            step_id: "s".to_string(),
            tool_name: "t".to_string(),
        });

        assert_eq!(rx1.recv().await.unwrap().plan_id(), "plan-1");
        assert_eq!(rx2.recv().await.unwrap().plan_id(), "plan-1");
    }
}
