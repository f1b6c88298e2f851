use crate::config::Config;
use crate::providers::{OllamaProvider, OpenAIProvider};
use crate::traits::Provider;
use anyhow::{Result, anyhow};
use std::sync::Arc;

pub const DEFAULT_PROVIDER: &str = "ollama";

pub fn create_provider(config: &Config) -> Result<Arc<dyn Provider>> {
    let provider_name = config.provider.as_deref().unwrap_or(DEFAULT_PROVIDER);

    match provider_name.to_lowercase().as_str() {
        "ollama" => {
            let mut provider = OllamaProvider::with_timeout(config.call_timeout());
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Arc::new(provider))
        }
        "openai" => {
            let api_key = resolve_api_key_with_fallback(
                &["OPENAI_API_KEY", "TASKWEAVE_OPENAI_API_KEY"],
                &config.api_key,
            )?;
            let mut provider = OpenAIProvider::new(api_key);
            if let Some(base_url) = &config.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Arc::new(provider))
        }
        _ => Err(anyhow!(
            "Unknown provider: {}. Available: ollama, openai",
            provider_name
        )),
    }
}

/// First set environment variable wins, then the configured key.
pub fn resolve_api_key_with_fallback(env_vars: &[&str], config_key: &str) -> Result<String> {
    env_vars
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|key| !key.trim().is_empty())
        .or_else(|| (!config_key.is_empty()).then(|| config_key.to_string()))
        .ok_or_else(|| anyhow!("No API key found (set one of {})", env_vars.join(", ")))
}
