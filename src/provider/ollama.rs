use super::{compose_prompt, BackendError, ModelBackend};
use crate::config::BackendConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const AVAILABILITY_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Ollama-compatible HTTP backend. Every request is bounded by the configured
/// timeout; the executor never waits on a backend past that bound.
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    name: String,
    model: String,
    base_url: String,
    agent: ureq::Agent,
}

impl OllamaBackend {
    pub fn new(name: impl Into<String>, config: &BackendConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build();
        Self {
            name: name.into(),
            model: config.model.clone(),
            base_url: config.base_url.clone(),
            agent,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl ModelBackend for OllamaBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate(&self, prompt: &str, system_prompt: &str) -> Result<String, BackendError> {
        if !self.is_available() {
            return Err(BackendError::Unavailable {
                backend: self.name.clone(),
                base_url: self.base_url.clone(),
            });
        }

        let body = GenerateRequest {
            model: &self.model,
            prompt: compose_prompt(prompt, system_prompt),
            stream: false,
        };
        let response = self
            .agent
            .post(&self.endpoint("api/generate"))
            .send_json(&body)
            .map_err(|e| BackendError::Request {
                backend: self.name.clone(),
                reason: e.to_string(),
            })?;

        response
            .into_json::<GenerateResponse>()
            .map(|parsed| parsed.response)
            .map_err(|e| BackendError::Response {
                backend: self.name.clone(),
                reason: e.to_string(),
            })
    }

    fn is_available(&self) -> bool {
        self.agent
            .get(&self.endpoint("api/tags"))
            .timeout(AVAILABILITY_TIMEOUT)
            .call()
            .map(|response| response.status() == 200)
            .unwrap_or(false)
    }
}
