//! Domain types for planloop
//!
//! Core value types: Plan, Step, Adjustment, ReflectionOutcome.
//!
//! Everything here is a plain value. Plans transition copy-on-write (each
//! mutating operation returns a new Plan), so the rest of the crate can fold
//! execution results without locks or shared mutable state.

mod adjustment;
mod id;
mod plan;
mod reflection;
mod step;

pub use adjustment::{Adjustment, AdjustmentKind};
pub use id::generate_id;
pub use plan::{Plan, PlanStatus};
pub use reflection::{Assessment, ReflectionOutcome};
pub use step::{REASONING_TOOL, Step, StepStatus};

/// Bounded excerpt of free text, cut at a char boundary with an ellipsis.
/// Used wherever step results feed prompts or event payloads.
pub(crate) fn excerpt(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars).collect();
    format!("{}...", cut.trim_end())
}
