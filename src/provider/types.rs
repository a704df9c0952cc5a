#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("model backend `{backend}` is unavailable at {base_url}")]
    Unavailable { backend: String, base_url: String },
    #[error("model backend `{backend}` request failed: {reason}")]
    Request { backend: String, reason: String },
    #[error("model backend `{backend}` returned an unreadable response: {reason}")]
    Response { backend: String, reason: String },
}

/// Text generation service handed to agents by the factory.
pub trait ModelBackend: Send + Sync {
    fn name(&self) -> &str;

    fn generate(&self, prompt: &str, system_prompt: &str) -> Result<String, BackendError>;

    fn is_available(&self) -> bool;
}
