use crate::config::BackendConfig;
use std::sync::Arc;

pub mod offline;
pub mod ollama;
pub mod types;

pub use offline::OfflineBackend;
pub use ollama::OllamaBackend;
pub use types::{BackendError, ModelBackend};

pub fn ollama_backend(name: &str, config: &BackendConfig) -> Arc<dyn ModelBackend> {
    Arc::new(OllamaBackend::new(name, config))
}

pub(crate) fn compose_prompt(prompt: &str, system_prompt: &str) -> String {
    if system_prompt.trim().is_empty() {
        prompt.to_string()
    } else {
        format!("{system_prompt}\n\n{prompt}")
    }
}
