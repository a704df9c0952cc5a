use super::registry::AgentInit;
use super::{Agent, AgentCore, AgentError, AgentMetrics, AgentOutput};
use crate::orchestration::compiler::WorkflowCompiler;
use crate::orchestration::context::ExecutionContext;
use crate::shared::ids::{AgentId, AgentType};
use serde_json::json;

/// Agent wrapper around the workflow compiler, so a plan can be compiled as
/// a step of another workflow.
pub struct CompilerAgent {
    core: AgentCore,
    compiler: WorkflowCompiler,
}

impl CompilerAgent {
    pub fn new(init: AgentInit) -> Self {
        Self {
            core: AgentCore::new(init),
            compiler: WorkflowCompiler::new(),
        }
    }

    pub fn construct(init: AgentInit) -> Result<Box<dyn Agent>, AgentError> {
        Ok(Box::new(Self::new(init)))
    }
}

impl Agent for CompilerAgent {
    fn agent_id(&self) -> &AgentId {
        self.core.agent_id()
    }

    fn agent_type(&self) -> &AgentType {
        self.core.agent_type()
    }

    fn execute(&mut self, task: &str, context: ExecutionContext) -> Result<AgentOutput, AgentError> {
        let compiler = self.compiler;
        self.core.run(task, context, |core, _, context| {
            let workflow = compiler
                .compile_context(context)
                .map_err(|err| core.execution_error(err.to_string()))?;
            let steps = serde_json::to_value(workflow.steps())
                .map_err(|err| core.execution_error(err.to_string()))?;

            let mut output = AgentOutput::new();
            output.insert("workflow_name".to_string(), json!(workflow.name()));
            output.insert("step_count".to_string(), json!(workflow.steps().len()));
            output.insert("steps".to_string(), steps);
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
