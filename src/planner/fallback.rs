//! Deterministic fallback steps for when the reasoning backend is unusable

use serde_json::json;
use tracing::debug;

use crate::domain::Step;
use crate::tools::ToolCatalog;

/// Build a minimal single-step plan from query keywords
///
/// Used whenever the backend call fails or its reply parses to nothing
/// usable. The result is always at least one step.
pub(super) fn fallback_steps(query: &str, catalog: &ToolCatalog) -> Vec<Step> {
    let lowered = query.to_lowercase();

    if ["search", "find", "retrieve"].iter().any(|kw| lowered.contains(kw)) {
        if let Some(tool) = catalog.find_search_capable() {
            debug!(tool = %tool.name, "Fallback plan: single search step");
            return vec![Step::new(
                format!("Search for: {}", query),
                &tool.name,
                json!({ "query": query }),
            )];
        }
        // No search-capable tool registered, reason about it instead
        return vec![Step::reasoning(format!("Reason about: {}", query))];
    }

    if lowered.contains("summarize") || lowered.contains("brief") {
        return vec![Step::reasoning(format!("Summarize: {}", query))];
    }

    vec![Step::reasoning(format!("Analyze the request: {}", query))]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::REASONING_TOOL;

    fn catalog_with_search() -> ToolCatalog {
        ToolCatalog::new()
            .with_tool("calculator", "Evaluate arithmetic")
            .with_tool("web_search", "Search the web for pages")
    }

    #[test]
    fn test_search_query_uses_search_tool() {
        let steps = fallback_steps("find the latest rust release", &catalog_with_search());
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].tool_name, "web_search");
        assert_eq!(steps[0].tool_input["query"], "find the latest rust release");
    }

    #[test]
    fn test_search_query_without_search_tool_reasons() {
        let catalog = ToolCatalog::new().with_tool("calculator", "Evaluate arithmetic");
        let steps = fallback_steps("search for prime numbers", &catalog);
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].tool_name, REASONING_TOOL);
    }

    #[test]
    fn test_summarize_query_reasons() {
        let steps = fallback_steps("summarize the meeting notes", &catalog_with_search());
        assert_eq!(steps.len(), 1);
        assert!(steps[0].is_reasoning_only());
        assert!(steps[0].description.contains("Summarize"));
    }

    #[test]
    fn test_generic_query_gets_analysis_step() {
        let steps = fallback_steps("help me plan a garden", &catalog_with_search());
        assert_eq!(steps.len(), 1);
        assert!(steps[0].is_reasoning_only());
        assert!(steps[0].description.contains("Analyze"));
    }
}
