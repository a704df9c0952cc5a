use super::{compose_prompt, BackendError, ModelBackend};

/// Deterministic backend that answers without any network access.
#[derive(Debug, Clone)]
pub struct OfflineBackend {
    name: String,
}

impl OfflineBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl ModelBackend for OfflineBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, prompt: &str, system_prompt: &str) -> Result<String, BackendError> {
        let composed = compose_prompt(prompt, system_prompt);
        let first_line = composed.lines().next().unwrap_or_default();
        Ok(format!("[{}] {first_line}", self.name))
    }

    fn is_available(&self) -> bool {
        true
    }
}
