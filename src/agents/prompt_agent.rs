use super::registry::AgentInit;
use super::{Agent, AgentCore, AgentError, AgentMetrics, AgentOutput};
use crate::orchestration::context::{keys, ExecutionContext};
use crate::shared::ids::{AgentId, AgentType};
use serde_json::Value;

/// Backend-driven agent used for every planning, generation and review role.
/// The role comes from the agent type; in dry-run mode the backend is never
/// called.
pub struct PromptAgent {
    core: AgentCore,
}

impl PromptAgent {
    pub fn new(init: AgentInit) -> Self {
        Self {
            core: AgentCore::new(init),
        }
    }

    pub fn construct(init: AgentInit) -> Result<Box<dyn Agent>, AgentError> {
        Ok(Box::new(Self::new(init)))
    }
}

pub fn output_key(task: &str) -> String {
    format!("{task}_output")
}

pub fn system_prompt(agent_type: &str) -> &'static str {
    match agent_type {
        "scaffolder" => "You lay out the directory structure for a new bot project.",
        "file_planner" => "You list the files a bot project needs and what each one holds.",
        "planner" => "You break one part of a bot design into concrete, ordered decisions.",
        "coder" | "code_generator" => "You write complete, runnable source files for a bot project.",
        "validator" => "You review generated code for errors and report every problem found.",
        "security" => "You audit generated code for secrets, injection and unsafe calls.",
        "optimizer" => "You suggest changes that make a bot workflow faster or simpler.",
        "doc_writer" => "You write concise documentation for a generated bot project.",
        _ => "You complete one step of a bot creation workflow.",
    }
}

/// Task line followed by every context entry except the raw plan.
pub fn render_prompt(task: &str, context: &ExecutionContext) -> String {
    let mut prompt = format!("Task: {task}\n");
    let entries = context
        .as_map()
        .iter()
        .filter(|(key, _)| key.as_str() != keys::PLAN)
        .collect::<Vec<_>>();
    if !entries.is_empty() {
        prompt.push_str("\nContext:\n");
        for (key, value) in entries {
            let rendered = match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            prompt.push_str(&format!("- {key}: {rendered}\n"));
        }
    }
    prompt
}

impl Agent for PromptAgent {
    fn agent_id(&self) -> &AgentId {
        self.core.agent_id()
    }

    fn agent_type(&self) -> &AgentType {
        self.core.agent_type()
    }

    fn execute(&mut self, task: &str, context: ExecutionContext) -> Result<AgentOutput, AgentError> {
        self.core.run(task, context, |core, task, context| {
            let text = if context.dry_run() {
                format!("[DRY RUN] {task} simulated by {}", core.agent_id())
            } else {
                core.backend().generate(
                    &render_prompt(task, context),
                    system_prompt(core.agent_type().as_str()),
                )?
            };

            let mut output = AgentOutput::new();
            output.insert(output_key(task), Value::String(text));
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
