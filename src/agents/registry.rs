use super::{Agent, AgentError, CompilerAgent, ExecutorAgent, PromptAgent};
use crate::memory::MemoryManager;
use crate::provider::ModelBackend;
use crate::shared::ids::{AgentId, AgentType};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("agent type `{agent_type}` is already registered")]
    DuplicateType { agent_type: String },
    #[error("unknown agent type `{agent_type}`")]
    UnknownType { agent_type: String },
    #[error("invalid agent type `{agent_type}`: {reason}")]
    InvalidType { agent_type: String, reason: String },
}

/// Caller-supplied construction parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentParams {
    pub agent_id: Option<AgentId>,
    pub agent_type: Option<AgentType>,
    pub capabilities: Vec<String>,
}

impl AgentParams {
    pub fn for_agent(agent_id: AgentId) -> Self {
        Self {
            agent_id: Some(agent_id),
            ..Self::default()
        }
    }

    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities = capabilities.into_iter().map(Into::into).collect();
        self
    }
}

/// Everything a constructor receives, with identity already resolved.
pub struct AgentInit {
    pub agent_id: AgentId,
    pub agent_type: AgentType,
    pub capabilities: Vec<String>,
    pub backend: Arc<dyn ModelBackend>,
    pub memory: Arc<MemoryManager>,
}

pub type AgentConstructor = fn(AgentInit) -> Result<Box<dyn Agent>, AgentError>;

/// Type tag to constructor table. Built up front, then shared read-only.
#[derive(Clone, Default)]
pub struct AgentRegistry {
    constructors: BTreeMap<AgentType, AgentConstructor>,
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("types", &self.constructors.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with every agent type the compiled workflow uses.
    pub fn with_builtin_agents() -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        let builtins: [(&str, AgentConstructor); 10] = [
            ("scaffolder", PromptAgent::construct),
            ("file_planner", PromptAgent::construct),
            ("planner", PromptAgent::construct),
            ("coder", PromptAgent::construct),
            ("validator", PromptAgent::construct),
            ("security", PromptAgent::construct),
            ("optimizer", PromptAgent::construct),
            ("doc_writer", PromptAgent::construct),
            ("executor", ExecutorAgent::construct),
            ("workflow_compiler", CompilerAgent::construct),
        ];
        for (tag, constructor) in builtins {
            let agent_type =
                AgentType::parse(tag).map_err(|reason| RegistryError::InvalidType {
                    agent_type: tag.to_string(),
                    reason,
                })?;
            registry.register(agent_type, constructor)?;
        }
        Ok(registry)
    }

    pub fn register(
        &mut self,
        agent_type: AgentType,
        constructor: AgentConstructor,
    ) -> Result<(), RegistryError> {
        if self.constructors.contains_key(&agent_type) {
            return Err(RegistryError::DuplicateType {
                agent_type: agent_type.to_string(),
            });
        }
        self.constructors.insert(agent_type, constructor);
        Ok(())
    }

    pub fn resolve(&self, agent_type: &str) -> Result<AgentConstructor, RegistryError> {
        self.constructors
            .get(agent_type)
            .copied()
            .ok_or_else(|| RegistryError::UnknownType {
                agent_type: agent_type.to_string(),
            })
    }

    pub fn contains(&self, agent_type: &str) -> bool {
        self.constructors.contains_key(agent_type)
    }

    pub fn list_types(&self) -> Vec<AgentType> {
        self.constructors.keys().cloned().collect()
    }
}
