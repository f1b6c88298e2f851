use crate::error::ToolError;
use crate::tools::first_string_arg;
use crate::traits::{SearchProvider, Tool, ToolCapability, ToolResult};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

pub struct WebSearchTool {
    search: Arc<dyn SearchProvider>,
}

impl WebSearchTool {
    pub fn new(search: Arc<dyn SearchProvider>) -> Self {
        Self { search }
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web for current information. Returns result titles and snippets as text."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query"
                }
            },
            "required": ["query"]
        })
    }

    fn capability(&self) -> ToolCapability {
        ToolCapability::Search
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let Some(query) = first_string_arg(&args, &["query", "q", "input"]) else {
            return Ok(ToolResult::error(
                ToolError::InvalidArguments("missing 'query'".to_string()).to_string(),
            ));
        };

        tracing::debug!(provider = self.search.name(), %query, "web search");
        Ok(ToolResult::success(self.search.search(&query).await))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::CannedSearch;

    #[tokio::test]
    async fn delegates_to_provider() {
        let search = Arc::new(CannedSearch::new("Paris: Hotel Lutetia"));
        let tool = WebSearchTool::new(search.clone());

        let result = tool.execute(json!({"query": "hotels in paris"})).await.unwrap();

        assert!(result.success);
        assert_eq!(result.output, "Paris: Hotel Lutetia");
        assert_eq!(search.queries(), vec!["hotels in paris".to_string()]);
    }

    #[tokio::test]
    async fn missing_query_is_an_error_result() {
        let tool = WebSearchTool::new(Arc::new(CannedSearch::new("unused")));
        let result = tool.execute(json!({})).await.unwrap();

        assert!(!result.success);
        assert_eq!(
            result.observation(),
            "Error: Invalid arguments: missing 'query'"
        );
    }
}
