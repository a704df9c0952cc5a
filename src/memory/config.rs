use serde::{Deserialize, Serialize};

fn default_min_confidence() -> f64 {
    0.7
}

fn default_project_agent_min_confidence() -> f64 {
    0.9
}

fn default_session_id() -> String {
    "default_session".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryConfig {
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    #[serde(default = "default_project_agent_min_confidence")]
    pub project_agent_min_confidence: f64,
    #[serde(default = "default_session_id")]
    pub session_id: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            project_agent_min_confidence: default_project_agent_min_confidence(),
            session_id: default_session_id(),
        }
    }
}

impl MemoryConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.min_confidence) {
            return Err("memory.min_confidence must be in range 0.0..=1.0".to_string());
        }
        if !(0.0..=1.0).contains(&self.project_agent_min_confidence) {
            return Err(
                "memory.project_agent_min_confidence must be in range 0.0..=1.0".to_string(),
            );
        }
        if self.project_agent_min_confidence < self.min_confidence {
            return Err(
                "memory.project_agent_min_confidence must be >= memory.min_confidence"
                    .to_string(),
            );
        }
        if self.session_id.trim().is_empty() {
            return Err("memory.session_id must be non-empty".to_string());
        }
        Ok(())
    }
}
