use crate::traits::SearchProvider;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

const TAVILY_URL: &str = "https://api.tavily.com/search";

#[derive(Debug, Deserialize)]
struct TavilyResponse {
    #[serde(default)]
    results: Vec<TavilyResult>,
}

#[derive(Debug, Deserialize)]
struct TavilyResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    url: String,
}

pub struct TavilySearch {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    max_results: usize,
}

impl TavilySearch {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_timeout(api_key, std::time::Duration::from_secs(15))
    }

    pub fn with_timeout(api_key: impl Into<String>, timeout: std::time::Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            client,
            api_key: api_key.into(),
            base_url: TAVILY_URL.to_string(),
            max_results: 5,
        }
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results.max(1);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn query(&self, query: &str) -> anyhow::Result<String> {
        let response = self
            .client
            .post(&self.base_url)
            .json(&json!({
                "api_key": self.api_key,
                "query": query,
                "max_results": self.max_results,
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("Tavily API error ({}): {}", status, error_text));
        }

        let body: TavilyResponse = response.json().await?;
        Ok(format_results(&body.results, self.max_results))
    }
}

fn format_results(results: &[TavilyResult], max_results: usize) -> String {
    results
        .iter()
        .take(max_results)
        .map(|r| {
            if r.url.is_empty() {
                format!("{}: {}", r.title, r.content)
            } else {
                format!("{}: {}\nURL: {}", r.title, r.content, r.url)
            }
        })
        .collect::<Vec<_>>()
        .join("\n---\n")
}

#[async_trait]
impl SearchProvider for TavilySearch {
    fn name(&self) -> &str {
        "tavily"
    }

    async fn search(&self, query: &str) -> String {
        match self.query(query).await {
            Ok(text) if text.trim().is_empty() => format!("No results found for '{}'.", query),
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "tavily search failed");
                format!("Search failed: {}", e)
            }
        }
    }
}
