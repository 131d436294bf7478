//! Event system for planloop
//!
//! A broadcast bus carrying plan lifecycle events. Delivery is best-effort
//! and advisory; nothing in the execution path depends on a subscriber
//! being present.

mod bus;
mod types;

pub use bus::{DEFAULT_CHANNEL_CAPACITY, EventBus, EventEmitter, create_event_bus};
pub use types::PlanEvent;
