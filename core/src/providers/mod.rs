pub mod factory;
pub mod ollama;
pub mod openai;

pub use factory::{create_provider, resolve_api_key_with_fallback};
pub use ollama::OllamaProvider;
pub use openai::OpenAIProvider;
