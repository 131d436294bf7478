//! Planner module - turning a user goal into an executable Plan
//!
//! The PlanGenerator asks the reasoning backend to break a goal into
//! dependency-ordered tool steps. When the backend is unreachable or its
//! reply is unusable, a deterministic keyword fallback produces a minimal
//! single-step plan instead, so plan generation never fails outright.

mod fallback;
mod generator;

pub use generator::{PREVIOUS_RESULT_PLACEHOLDER, PlanGenerator};
