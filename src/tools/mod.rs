//! Tool system for planloop
//!
//! Plans reference tools by name only. The catalog carries the names and
//! descriptions the generator may plan against; the invoker is the injected
//! backend that actually runs them. Tool implementations never live in this
//! crate.

mod catalog;
mod invoker;

pub use catalog::{ToolCatalog, ToolDescriptor};
pub use invoker::{ToolError, ToolInvoker};

#[cfg(test)]
pub use invoker::mock;
