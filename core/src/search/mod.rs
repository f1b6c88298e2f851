pub mod tavily;

pub use tavily::TavilySearch;

use crate::config::SearchConfig;
use crate::providers::resolve_api_key_with_fallback;
use crate::traits::SearchProvider;
use async_trait::async_trait;
use std::sync::Arc;

/// Stands in when no search backend is configured.
pub struct UnavailableSearch {
    reason: String,
}

impl UnavailableSearch {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SearchProvider for UnavailableSearch {
    fn name(&self) -> &str {
        "unavailable"
    }

    async fn search(&self, query: &str) -> String {
        format!("Search unavailable for '{}': {}", query, self.reason)
    }
}

pub fn create_search(config: &SearchConfig) -> Arc<dyn SearchProvider> {
    match config.provider.to_lowercase().as_str() {
        "tavily" => {
            let api_key = resolve_api_key_with_fallback(
                &["TAVILY_API_KEY", "TASKWEAVE_TAVILY_API_KEY"],
                &config.api_key,
            )
            .unwrap_or_default();

            if api_key.is_empty() {
                tracing::warn!("no Tavily API key found, web search disabled");
                return Arc::new(UnavailableSearch::new("no Tavily API key configured"));
            }

            Arc::new(
                TavilySearch::with_timeout(
                    api_key,
                    std::time::Duration::from_secs(config.timeout_secs.max(1)),
                )
                .with_max_results(config.max_results),
            )
        }
        "none" | "" => Arc::new(UnavailableSearch::new("search is disabled in config")),
        other => {
            tracing::warn!(provider = other, "unknown search provider, web search disabled");
            Arc::new(UnavailableSearch::new(format!(
                "unknown search provider '{}'",
                other
            )))
        }
    }
}
