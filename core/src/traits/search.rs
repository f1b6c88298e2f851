use async_trait::async_trait;

/// Best-effort text search.
///
/// Implementations never fail: problems come back as an explicit failure
/// string (or an empty one), since the agent treats whatever is returned as
/// an observation.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn search(&self, query: &str) -> String;
}
