pub mod agent_core;
pub mod compiler_agent;
pub mod executor_agent;
pub mod factory;
pub mod prompt_agent;
pub mod registry;

pub use agent_core::AgentCore;
pub use compiler_agent::CompilerAgent;
pub use executor_agent::ExecutorAgent;
pub use factory::{route_for, AgentFactory, BackendRoute, CODE_GENERATION_AGENT_TYPES};
pub use prompt_agent::PromptAgent;
pub use registry::{AgentConstructor, AgentInit, AgentParams, AgentRegistry, RegistryError};

use crate::memory::MemoryError;
use crate::orchestration::context::ExecutionContext;
use crate::provider::BackendError;
use crate::shared::ids::{AgentId, AgentType};
use serde::Serialize;
use serde_json::{Map, Value};

/// Keys an agent adds to (or overwrites in) the run context.
pub type AgentOutput = Map<String, Value>;

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("agent `{agent_id}` could not be constructed: {reason}")]
    Construction { agent_id: String, reason: String },
    #[error("agent `{agent_id}` failed: {reason}")]
    Execution { agent_id: String, reason: String },
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Memory(#[from] MemoryError),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMetrics {
    pub executions: u64,
    pub successes: u64,
    pub failures: u64,
    pub success_rate: f64,
}

impl AgentMetrics {
    pub fn from_counts(executions: u64, successes: u64, failures: u64) -> Self {
        let success_rate = if executions == 0 {
            0.0
        } else {
            successes as f64 / executions as f64
        };
        Self {
            executions,
            successes,
            failures,
            success_rate,
        }
    }
}

/// Contract every concrete agent satisfies.
pub trait Agent: Send {
    fn agent_id(&self) -> &AgentId;

    fn agent_type(&self) -> &AgentType;

    /// Runs one task against a private copy of the run context.
    fn execute(&mut self, task: &str, context: ExecutionContext) -> Result<AgentOutput, AgentError>;

    fn capabilities(&self) -> &[String];

    fn metrics(&self) -> AgentMetrics;
}
