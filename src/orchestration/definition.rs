use crate::orchestration::error::OrchestratorError;
use crate::shared::ids::AgentType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    Abort,
    Continue,
}

impl FailurePolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            FailurePolicy::Abort => "abort",
            FailurePolicy::Continue => "continue",
        }
    }
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One compiled step. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepDefinition {
    order: u32,
    step: String,
    agent_type: AgentType,
    retry_budget: u32,
    on_failure: FailurePolicy,
}

impl StepDefinition {
    pub fn new(
        order: u32,
        step: impl Into<String>,
        agent_type: AgentType,
        retry_budget: u32,
        on_failure: FailurePolicy,
    ) -> Result<Self, String> {
        let step = step.into();
        if step.trim().is_empty() {
            return Err("step name must be non-empty".to_string());
        }
        if retry_budget == 0 {
            return Err(format!("step `{step}` must allow at least one attempt"));
        }
        Ok(Self {
            order,
            step,
            agent_type,
            retry_budget,
            on_failure,
        })
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn step(&self) -> &str {
        &self.step
    }

    pub fn agent_type(&self) -> &AgentType {
        &self.agent_type
    }

    pub fn retry_budget(&self) -> u32 {
        self.retry_budget
    }

    pub fn on_failure(&self) -> FailurePolicy {
        self.on_failure
    }
}

/// Named, ordered list of steps. Orders run 1..=n with no gaps and step
/// names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowDefinition {
    name: String,
    steps: Vec<StepDefinition>,
}

impl WorkflowDefinition {
    pub fn new(name: impl Into<String>, steps: Vec<StepDefinition>) -> Result<Self, OrchestratorError> {
        let name = name.into();
        let invalid = |reason: String| OrchestratorError::InvalidWorkflow {
            workflow: name.clone(),
            reason,
        };
        if name.trim().is_empty() {
            return Err(invalid("workflow name must be non-empty".to_string()));
        }

        let mut seen = BTreeSet::new();
        for (index, step) in steps.iter().enumerate() {
            let expected = index as u32 + 1;
            if step.order != expected {
                return Err(invalid(format!(
                    "step `{}` has order {} but expected {expected}",
                    step.step, step.order
                )));
            }
            if !seen.insert(step.step.as_str()) {
                return Err(invalid(format!("duplicate step `{}`", step.step)));
            }
        }

        Ok(Self { name, steps })
    }

    /// Builds a workflow from `(step, agent_type, retry_budget, on_failure)`
    /// rows, numbering them in the given order.
    pub fn sequential<I, S>(name: impl Into<String>, rows: I) -> Result<Self, OrchestratorError>
    where
        I: IntoIterator<Item = (S, AgentType, u32, FailurePolicy)>,
        S: Into<String>,
    {
        let name = name.into();
        let mut steps = Vec::new();
        for (index, (step, agent_type, retry_budget, on_failure)) in rows.into_iter().enumerate() {
            let step = StepDefinition::new(
                index as u32 + 1,
                step,
                agent_type,
                retry_budget,
                on_failure,
            )
            .map_err(|reason| OrchestratorError::InvalidWorkflow {
                workflow: name.clone(),
                reason,
            })?;
            steps.push(step);
        }
        Self::new(name, steps)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn step(&self, name: &str) -> Option<&StepDefinition> {
        self.steps.iter().find(|step| step.step == name)
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|step| step.step.as_str()).collect()
    }
}
