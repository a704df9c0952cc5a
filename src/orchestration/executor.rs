use crate::agents::{AgentError, AgentFactory, AgentOutput, AgentParams};
use crate::orchestration::compiler::GENERIC_EXECUTOR_AGENT;
use crate::orchestration::context::{keys, ExecutionContext};
use crate::orchestration::definition::{FailurePolicy, StepDefinition, WorkflowDefinition};
use crate::orchestration::error::OrchestratorError;
use crate::orchestration::run_store::{AttemptStatus, RunStatus, WorkflowRunStore};
use crate::shared::ids::{AgentId, AgentType};
use crate::shared::logging::now_rfc3339;
use serde::Serialize;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepState {
    Pending,
    Attempting,
    FailedRetryable,
    Succeeded,
    FailedTerminal,
}

impl StepState {
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (StepState::Pending, StepState::Attempting)
                | (StepState::Attempting, StepState::Succeeded)
                | (StepState::Attempting, StepState::FailedRetryable)
                | (StepState::Attempting, StepState::FailedTerminal)
                | (StepState::FailedRetryable, StepState::Attempting)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, StepState::Succeeded | StepState::FailedTerminal)
    }
}

impl std::fmt::Display for StepState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepState::Pending => write!(f, "pending"),
            StepState::Attempting => write!(f, "attempting"),
            StepState::FailedRetryable => write!(f, "failed_retryable"),
            StepState::Succeeded => write!(f, "succeeded"),
            StepState::FailedTerminal => write!(f, "failed_terminal"),
        }
    }
}

impl From<AttemptStatus> for StepState {
    fn from(value: AttemptStatus) -> Self {
        match value {
            AttemptStatus::Succeeded => StepState::Succeeded,
            AttemptStatus::FailedRetryable => StepState::FailedRetryable,
            AttemptStatus::FailedTerminal => StepState::FailedTerminal,
        }
    }
}

/// One attempt of one step.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionLogEntry {
    pub step: String,
    pub agent_type: AgentType,
    pub attempt_number: u32,
    pub status: AttemptStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AgentOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepOutcome {
    pub step: String,
    pub agent_type: AgentType,
    pub state: StepState,
    pub attempts: u32,
}

impl StepOutcome {
    fn pending(step: &StepDefinition) -> Self {
        Self {
            step: step.step().to_string(),
            agent_type: step.agent_type().clone(),
            state: StepState::Pending,
            attempts: 0,
        }
    }

    fn advance(&mut self, next: StepState) -> Result<(), OrchestratorError> {
        if !self.state.can_transition_to(next) {
            return Err(OrchestratorError::InvalidStepTransition {
                step: self.step.clone(),
                from: self.state,
                to: next,
            });
        }
        if next == StepState::Attempting {
            self.attempts += 1;
        }
        self.state = next;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionReport {
    pub run_id: i64,
    pub workflow_name: String,
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_step: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub log: Vec<ExecutionLogEntry>,
    pub steps: Vec<StepOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_context: Option<ExecutionContext>,
}

impl ExecutionReport {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Succeeded
    }

    pub fn attempts_for<'a>(&'a self, step: &'a str) -> impl Iterator<Item = &'a ExecutionLogEntry> {
        self.log.iter().filter(move |entry| entry.step == step)
    }

    pub fn outcome(&self, step: &str) -> Option<&StepOutcome> {
        self.steps.iter().find(|outcome| outcome.step == step)
    }
}

/// Runs a compiled workflow step by step: one fresh agent per attempt, each
/// attempt against its own context snapshot, retries up to the step budget.
#[derive(Debug, Clone)]
pub struct WorkflowExecutor {
    factory: AgentFactory,
    run_store: WorkflowRunStore,
}

impl WorkflowExecutor {
    pub fn new(factory: AgentFactory, run_store: WorkflowRunStore) -> Self {
        Self { factory, run_store }
    }

    pub fn run_store(&self) -> &WorkflowRunStore {
        &self.run_store
    }

    /// A step failure ends the run and is reported, not returned as `Err`.
    /// `Err` means the run itself could not be recorded.
    pub fn execute(
        &self,
        workflow: &WorkflowDefinition,
        initial_context: ExecutionContext,
    ) -> Result<ExecutionReport, OrchestratorError> {
        let run_id = self.run_store.create_run(workflow.name())?;
        self.run_store.append_engine_log(
            run_id,
            format!(
                "workflow={} decision=start steps={}",
                workflow.name(),
                workflow.steps().len()
            ),
        )?;

        let mut context = initial_context;
        let mut log = Vec::new();
        let mut outcomes = workflow
            .steps()
            .iter()
            .map(StepOutcome::pending)
            .collect::<Vec<_>>();

        for (index, step) in workflow.steps().iter().enumerate() {
            let outcome = &mut outcomes[index];
            let mut last_error = None;

            while outcome.state != StepState::Succeeded && outcome.attempts < step.retry_budget() {
                outcome.advance(StepState::Attempting)?;
                let attempt = outcome.attempts;

                match self.attempt(step, attempt_context(step, &context)) {
                    Ok(output) => {
                        self.run_store.save_step(
                            run_id,
                            step.step(),
                            step.agent_type().as_str(),
                            AttemptStatus::Succeeded,
                            &Value::Object(output.clone()).to_string(),
                        )?;
                        self.run_store.append_engine_log(
                            run_id,
                            format!(
                                "step={} agent_type={} attempt={attempt} status=succeeded",
                                step.step(),
                                step.agent_type()
                            ),
                        )?;
                        context.merge(output.clone());
                        log.push(log_entry(step, attempt, AttemptStatus::Succeeded, Some(output), None));
                        outcome.advance(StepState::Succeeded)?;
                    }
                    Err(err) => {
                        let status = if attempt < step.retry_budget() {
                            AttemptStatus::FailedRetryable
                        } else {
                            AttemptStatus::FailedTerminal
                        };
                        let reason = err.to_string();
                        self.run_store.save_step(
                            run_id,
                            step.step(),
                            step.agent_type().as_str(),
                            status,
                            &reason,
                        )?;
                        self.run_store.append_engine_log(
                            run_id,
                            format!(
                                "step={} agent_type={} attempt={attempt} status={status} error={reason:?}",
                                step.step(),
                                step.agent_type()
                            ),
                        )?;
                        log.push(log_entry(step, attempt, status, None, Some(reason.clone())));
                        outcome.advance(StepState::from(status))?;
                        last_error = Some(reason);
                    }
                }
            }

            if outcome.state == StepState::FailedTerminal {
                // Both policies halt the run; they differ only in what is logged.
                let decision = match step.on_failure() {
                    FailurePolicy::Abort => "abort",
                    FailurePolicy::Continue => "halt_on_continue",
                };
                self.run_store.append_engine_log(
                    run_id,
                    format!(
                        "workflow={} decision={decision} failed_step={} on_failure={}",
                        workflow.name(),
                        step.step(),
                        step.on_failure()
                    ),
                )?;
                self.run_store.update_run_status(run_id, RunStatus::Failed)?;
                return Ok(ExecutionReport {
                    run_id,
                    workflow_name: workflow.name().to_string(),
                    status: RunStatus::Failed,
                    failed_step: Some(step.step().to_string()),
                    error: last_error,
                    log,
                    steps: outcomes,
                    final_context: None,
                });
            }
        }

        self.run_store.update_run_status(run_id, RunStatus::Succeeded)?;
        self.run_store.append_engine_log(
            run_id,
            format!("workflow={} decision=complete", workflow.name()),
        )?;
        Ok(ExecutionReport {
            run_id,
            workflow_name: workflow.name().to_string(),
            status: RunStatus::Succeeded,
            failed_step: None,
            error: None,
            log,
            steps: outcomes,
            final_context: Some(context),
        })
    }

    fn attempt(&self, step: &StepDefinition, snapshot: ExecutionContext) -> Result<AgentOutput, AgentError> {
        let agent_id = AgentId::for_step(step.agent_type(), step.step()).map_err(|reason| {
            AgentError::Construction {
                agent_id: format!("{}_{}", step.agent_type(), step.step()),
                reason,
            }
        })?;
        let params = AgentParams::for_agent(agent_id).with_capabilities([step.step()]);
        let mut agent = self
            .factory
            .create_agent(step.agent_type().as_str(), params)?;
        agent.execute(step.step(), snapshot)
    }
}

/// Private copy of the live context for one attempt. The generic executor
/// never sees the raw plan.
fn attempt_context(step: &StepDefinition, context: &ExecutionContext) -> ExecutionContext {
    if step.agent_type() == GENERIC_EXECUTOR_AGENT && context.has_raw_plan() {
        context.without(keys::PLAN)
    } else {
        context.clone()
    }
}

fn log_entry(
    step: &StepDefinition,
    attempt: u32,
    status: AttemptStatus,
    result: Option<AgentOutput>,
    error: Option<String>,
) -> ExecutionLogEntry {
    ExecutionLogEntry {
        step: step.step().to_string(),
        agent_type: step.agent_type().clone(),
        attempt_number: attempt,
        status,
        result,
        error,
        timestamp: now_rfc3339(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_state_allows_retry_cycle_only_from_retryable() {
        assert!(StepState::Pending.can_transition_to(StepState::Attempting));
        assert!(StepState::FailedRetryable.can_transition_to(StepState::Attempting));
        assert!(!StepState::FailedTerminal.can_transition_to(StepState::Attempting));
        assert!(!StepState::Succeeded.can_transition_to(StepState::Attempting));
        assert!(!StepState::Pending.can_transition_to(StepState::Succeeded));
    }

    #[test]
    fn generic_executor_snapshot_drops_plan() {
        let context = ExecutionContext::new()
            .with_plan(["define_database"])
            .with_route("wf");
        let executor_step = StepDefinition::new(
            1,
            "define_database",
            AgentType::parse(GENERIC_EXECUTOR_AGENT).expect("type"),
            1,
            FailurePolicy::Abort,
        )
        .expect("step");
        let planner_step = StepDefinition::new(
            1,
            "define_agents",
            AgentType::parse("planner").expect("type"),
            1,
            FailurePolicy::Abort,
        )
        .expect("step");

        assert!(!attempt_context(&executor_step, &context).contains_key(keys::PLAN));
        assert!(attempt_context(&planner_step, &context).contains_key(keys::PLAN));
        assert!(context.contains_key(keys::PLAN));
    }
}
