use super::registry::AgentInit;
use super::{AgentError, AgentMetrics, AgentOutput};
use crate::memory::{
    agent_source, AgentMemory, Interaction, MemoryManager, MemoryScope, MemoryUpdateProposal,
};
use crate::orchestration::context::ExecutionContext;
use crate::provider::ModelBackend;
use crate::shared::ids::{AgentId, AgentType};
use serde_json::{json, Value};
use std::sync::Arc;

const INTERACTION_JUSTIFICATION: &str = "agent execution log";

/// State shared by every built-in agent: identity, backend, counters and the
/// agent's interaction history.
pub struct AgentCore {
    agent_id: AgentId,
    agent_type: AgentType,
    capabilities: Vec<String>,
    backend: Arc<dyn ModelBackend>,
    memory: Arc<MemoryManager>,
    history: AgentMemory,
    executions: u64,
    successes: u64,
    failures: u64,
}

impl AgentCore {
    pub fn new(init: AgentInit) -> Self {
        let history = init.memory.load_memory(init.agent_id.as_str());
        Self {
            agent_id: init.agent_id,
            agent_type: init.agent_type,
            capabilities: init.capabilities,
            backend: init.backend,
            memory: init.memory,
            history,
            executions: 0,
            successes: 0,
            failures: 0,
        }
    }

    pub fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    pub fn agent_type(&self) -> &AgentType {
        &self.agent_type
    }

    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    pub fn backend(&self) -> &dyn ModelBackend {
        self.backend.as_ref()
    }

    pub fn history(&self) -> &AgentMemory {
        &self.history
    }

    pub fn metrics(&self) -> AgentMetrics {
        AgentMetrics::from_counts(self.executions, self.successes, self.failures)
    }

    pub fn execution_error(&self, reason: impl Into<String>) -> AgentError {
        AgentError::Execution {
            agent_id: self.agent_id.to_string(),
            reason: reason.into(),
        }
    }

    /// Runs `body` and records the outcome: counters, the legacy history
    /// entry, and an `interaction_<agent>_<n>` proposal in session scope.
    /// `n` counts the agent's whole history, not just this instance.
    pub fn run<F>(
        &mut self,
        task: &str,
        context: ExecutionContext,
        body: F,
    ) -> Result<AgentOutput, AgentError>
    where
        F: FnOnce(&AgentCore, &str, &ExecutionContext) -> Result<AgentOutput, AgentError>,
    {
        let outcome = body(self, task, &context).map_err(|err| match err {
            AgentError::Execution { .. } => err,
            other => self.execution_error(other.to_string()),
        });

        self.executions += 1;
        let (result, success) = match &outcome {
            Ok(output) => {
                self.successes += 1;
                (Value::Object(output.clone()), true)
            }
            Err(err) => {
                self.failures += 1;
                (Value::String(err.to_string()), false)
            }
        };

        let interaction = Interaction {
            task: task.to_string(),
            result,
            success,
        };
        let proposal = MemoryUpdateProposal::new(
            format!(
                "interaction_{}_{}",
                self.agent_id,
                self.history.interactions().len() + 1
            ),
            json!({
                "task": interaction.task,
                "result": interaction.result,
                "success": interaction.success,
            }),
            1.0,
            INTERACTION_JUSTIFICATION,
            agent_source(self.agent_id.as_str()),
        )
        .with_scope(MemoryScope::Session);
        self.history.record(interaction);

        let recorded = self
            .memory
            .save_memory(&self.history)
            .and_then(|_| self.memory.propose(proposal));

        match outcome {
            Ok(output) => {
                recorded?;
                Ok(output)
            }
            // The execution failure wins over a bookkeeping failure.
            Err(err) => Err(err),
        }
    }

    /// Submits a proposal sourced from this agent; returns whether the
    /// policy accepted it.
    pub fn propose_memory_update(
        &self,
        key: &str,
        value: Value,
        confidence: f64,
        justification: &str,
        scope: Option<MemoryScope>,
    ) -> Result<bool, AgentError> {
        let mut proposal = MemoryUpdateProposal::new(
            key,
            value,
            confidence,
            justification,
            agent_source(self.agent_id.as_str()),
        );
        if let Some(scope) = scope {
            proposal = proposal.with_scope(scope);
        }
        Ok(self.memory.propose(proposal)?)
    }
}
