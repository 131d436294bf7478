//! Tool catalog - the set of tools a plan may call
//!
//! The catalog only knows names and descriptions; actual execution lives
//! behind the `ToolInvoker` seam. Entries keep registration order so prompt
//! enumeration is stable across runs.

use serde::{Deserialize, Serialize};

/// Name and description of one available tool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Ordered registry of the tools available to generated plans
#[derive(Debug, Clone, Default)]
pub struct ToolCatalog {
    tools: Vec<ToolDescriptor>,
}

impl ToolCatalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool; a duplicate name replaces the earlier entry in place
    pub fn register(&mut self, name: impl Into<String>, description: impl Into<String>) {
        let descriptor = ToolDescriptor::new(name, description);
        if let Some(existing) = self.tools.iter_mut().find(|t| t.name == descriptor.name) {
            *existing = descriptor;
        } else {
            self.tools.push(descriptor);
        }
    }

    /// Builder-style registration
    pub fn with_tool(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.register(name, description);
        self
    }

    /// Check whether a tool name is known
    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    /// Iterate descriptors in registration order
    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Best match for a search-style capability: prefer a tool whose name
    /// mentions search, else one whose description does.
    pub fn find_search_capable(&self) -> Option<&ToolDescriptor> {
        self.tools
            .iter()
            .find(|t| t.name.to_lowercase().contains("search"))
            .or_else(|| {
                self.tools
                    .iter()
                    .find(|t| t.description.to_lowercase().contains("search"))
            })
    }
}

impl FromIterator<ToolDescriptor> for ToolCatalog {
    fn from_iter<I: IntoIterator<Item = ToolDescriptor>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for t in iter {
            catalog.register(t.name, t.description);
        }
        catalog
    }
}
