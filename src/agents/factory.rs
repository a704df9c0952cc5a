use super::registry::{AgentInit, AgentParams, AgentRegistry};
use super::{Agent, AgentError};
use crate::memory::MemoryManager;
use crate::provider::ModelBackend;
use crate::shared::ids::{AgentId, AgentType};
use std::sync::Arc;

/// Agent types whose work is code or content generation.
pub const CODE_GENERATION_AGENT_TYPES: &[&str] = &[
    "code_generator",
    "coder",
    "doc_writer",
    "nlp",
    "project_scaffold",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendRoute {
    CodeGeneration,
    Reasoning,
}

pub fn route_for(agent_type: &str) -> BackendRoute {
    if CODE_GENERATION_AGENT_TYPES.contains(&agent_type) {
        BackendRoute::CodeGeneration
    } else {
        BackendRoute::Reasoning
    }
}

/// Builds agents from registry constructors and hands each one its backend
/// and the shared memory manager.
#[derive(Clone)]
pub struct AgentFactory {
    registry: Arc<AgentRegistry>,
    memory: Arc<MemoryManager>,
    local_backend: Arc<dyn ModelBackend>,
    code_backend: Arc<dyn ModelBackend>,
}

impl std::fmt::Debug for AgentFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentFactory")
            .field("registry", &self.registry)
            .field("local_backend", &self.local_backend.name())
            .field("code_backend", &self.code_backend.name())
            .finish_non_exhaustive()
    }
}

impl AgentFactory {
    /// Both routes start on `local_backend`.
    pub fn new(
        registry: Arc<AgentRegistry>,
        memory: Arc<MemoryManager>,
        local_backend: Arc<dyn ModelBackend>,
    ) -> Self {
        Self {
            registry,
            memory,
            code_backend: local_backend.clone(),
            local_backend,
        }
    }

    pub fn with_code_backend(mut self, backend: Arc<dyn ModelBackend>) -> Self {
        self.code_backend = backend;
        self
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn memory(&self) -> &Arc<MemoryManager> {
        &self.memory
    }

    pub fn backend_for(&self, agent_type: &str) -> Arc<dyn ModelBackend> {
        match route_for(agent_type) {
            BackendRoute::CodeGeneration => self.code_backend.clone(),
            BackendRoute::Reasoning => self.local_backend.clone(),
        }
    }

    /// Resolves `type_tag`, fills in missing identity from the tag, and runs
    /// the constructor. Constructor failures reach the caller unchanged.
    pub fn create_agent(
        &self,
        type_tag: &str,
        params: AgentParams,
    ) -> Result<Box<dyn Agent>, AgentError> {
        let constructor = self.registry.resolve(type_tag)?;
        let tag = AgentType::parse(type_tag).map_err(|reason| AgentError::Construction {
            agent_id: type_tag.to_string(),
            reason,
        })?;

        let agent_type = params.agent_type.unwrap_or_else(|| tag.clone());
        let agent_id = match params.agent_id {
            Some(agent_id) => agent_id,
            None => AgentId::parse(tag.as_str()).map_err(|reason| AgentError::Construction {
                agent_id: type_tag.to_string(),
                reason,
            })?,
        };

        constructor(AgentInit {
            agent_id,
            agent_type,
            capabilities: params.capabilities,
            backend: self.backend_for(tag.as_str()),
            memory: self.memory.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_generation_types_route_to_code_backend() {
        assert_eq!(route_for("coder"), BackendRoute::CodeGeneration);
        assert_eq!(route_for("doc_writer"), BackendRoute::CodeGeneration);
        assert_eq!(route_for("planner"), BackendRoute::Reasoning);
        assert_eq!(route_for("scaffolder"), BackendRoute::Reasoning);
    }
}
