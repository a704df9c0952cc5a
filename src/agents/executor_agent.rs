use super::registry::AgentInit;
use super::{Agent, AgentCore, AgentError, AgentMetrics, AgentOutput};
use crate::orchestration::context::ExecutionContext;
use crate::shared::ids::{AgentId, AgentType};
use serde_json::json;

/// Deterministic agent that carries out one already-planned step. It refuses
/// to run while the context still holds the raw plan.
pub struct ExecutorAgent {
    core: AgentCore,
}

impl ExecutorAgent {
    pub fn new(init: AgentInit) -> Self {
        Self {
            core: AgentCore::new(init),
        }
    }

    pub fn construct(init: AgentInit) -> Result<Box<dyn Agent>, AgentError> {
        Ok(Box::new(Self::new(init)))
    }
}

fn perform_step(step: &str, dry_run: bool) -> String {
    if dry_run {
        format!("[DRY RUN] {step} simulated")
    } else {
        format!("{step} executed successfully")
    }
}

impl Agent for ExecutorAgent {
    fn agent_id(&self) -> &AgentId {
        self.core.agent_id()
    }

    fn agent_type(&self) -> &AgentType {
        self.core.agent_type()
    }

    fn execute(&mut self, task: &str, context: ExecutionContext) -> Result<AgentOutput, AgentError> {
        self.core.run(task, context, |core, task, context| {
            if context.has_raw_plan() {
                return Err(core.execution_error(
                    "received a plan; planning must finish before execution",
                ));
            }

            let dry_run = context.dry_run();
            let mut output = AgentOutput::new();
            output.insert(
                "executed".to_string(),
                json!([{ "step": task, "result": perform_step(task, dry_run), "dry_run": dry_run }]),
            );
            output.insert("skipped".to_string(), json!([]));
            output.insert("errors".to_string(), json!([]));
            output.insert("dry_run".to_string(), json!(dry_run));
            output.insert("status".to_string(), json!("success"));
            Ok(output)
        })
    }

    fn capabilities(&self) -> &[String] {
        self.core.capabilities()
    }

    fn metrics(&self) -> AgentMetrics {
        self.core.metrics()
    }
}
