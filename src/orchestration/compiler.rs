use crate::orchestration::context::ExecutionContext;
use crate::orchestration::definition::{FailurePolicy, WorkflowDefinition};
use crate::orchestration::error::OrchestratorError;
use crate::shared::ids::{validate_identifier_value, AgentType};
use std::collections::BTreeSet;

pub const DEFAULT_RETRY_BUDGET: u32 = 1;

/// Agent type that takes over plan steps with no dedicated agent. It must
/// never see the raw plan.
pub const GENERIC_EXECUTOR_AGENT: &str = "executor";

const BOOTSTRAP_STEPS: [(&str, &str); 2] = [
    ("scaffold_project", "scaffolder"),
    ("plan_files", "file_planner"),
];

const PLAN_CATEGORY_PREFIXES: [&str; 4] = ["define_", "configure_", "design_", "implement_"];

const PLAN_STEP_AGENTS: [(&str, &str); 4] = [
    ("define_agents", "planner"),
    ("configure_agents", "planner"),
    ("design_api", "planner"),
    ("implement_api", "planner"),
];

const TRAILING_STEPS: [(&str, &str, FailurePolicy); 5] = [
    ("generate_all_files", "coder", FailurePolicy::Abort),
    ("validate_code", "validator", FailurePolicy::Abort),
    ("security_scan", "security", FailurePolicy::Abort),
    ("optimize_workflow", "optimizer", FailurePolicy::Continue),
    ("deployment", "executor", FailurePolicy::Abort),
];

/// Agent type serving a plan entry, or `None` when the entry falls outside
/// every recognized category and is dropped from the workflow.
pub fn plan_step_agent(step: &str) -> Option<&'static str> {
    if let Some((_, agent)) = PLAN_STEP_AGENTS.iter().find(|(name, _)| *name == step) {
        return Some(*agent);
    }
    PLAN_CATEGORY_PREFIXES
        .iter()
        .any(|prefix| step.starts_with(prefix) && step.len() > prefix.len())
        .then_some(GENERIC_EXECUTOR_AGENT)
}

/// Turns an abstract plan into the fixed-shape bot creation workflow:
/// bootstrap steps, recognized plan steps, then the build/verify/deploy tail.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkflowCompiler;

impl WorkflowCompiler {
    pub fn new() -> Self {
        Self
    }

    pub fn compile(
        &self,
        plan: &[String],
        context: &ExecutionContext,
    ) -> Result<WorkflowDefinition, OrchestratorError> {
        if plan.is_empty() {
            return Err(OrchestratorError::EmptyPlan);
        }
        let route = context.route().ok_or(OrchestratorError::MissingRoute)?;
        if let Some(validation) = context.validation() {
            if !validation.valid {
                return Err(OrchestratorError::ValidationFailed {
                    reason: validation
                        .reason
                        .unwrap_or_else(|| "no reason given".to_string()),
                });
            }
        }

        let mut rows = Vec::new();
        for (step, agent) in BOOTSTRAP_STEPS {
            rows.push((step.to_string(), agent, FailurePolicy::Abort));
        }

        let mut emitted = BTreeSet::new();
        for step in plan {
            let step = step.trim();
            let Some(agent) = plan_step_agent(step) else {
                continue;
            };
            if reserved_step(step) || !emitted.insert(step.to_string()) {
                continue;
            }
            validate_identifier_value("step name", step).map_err(|reason| {
                OrchestratorError::InvalidWorkflow {
                    workflow: route.to_string(),
                    reason: format!("plan step `{step}`: {reason}"),
                }
            })?;
            rows.push((step.to_string(), agent, FailurePolicy::Abort));
        }

        for (step, agent, on_failure) in TRAILING_STEPS {
            rows.push((step.to_string(), agent, on_failure));
        }

        let rows = rows
            .into_iter()
            .map(|(step, agent, on_failure)| -> Result<_, OrchestratorError> {
                let agent_type = AgentType::parse(agent).map_err(|reason| {
                    OrchestratorError::InvalidWorkflow {
                        workflow: route.to_string(),
                        reason,
                    }
                })?;
                Ok((step, agent_type, DEFAULT_RETRY_BUDGET, on_failure))
            })
            .collect::<Result<Vec<_>, _>>()?;

        WorkflowDefinition::sequential(route, rows)
    }

    /// Compiles the plan carried by the context itself.
    pub fn compile_context(
        &self,
        context: &ExecutionContext,
    ) -> Result<WorkflowDefinition, OrchestratorError> {
        let plan = context.plan().unwrap_or_default();
        self.compile(&plan, context)
    }
}

fn reserved_step(step: &str) -> bool {
    BOOTSTRAP_STEPS.iter().any(|(name, _)| *name == step)
        || TRAILING_STEPS.iter().any(|(name, _, _)| *name == step)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_step_agent_maps_known_steps_to_planner() {
        assert_eq!(plan_step_agent("define_agents"), Some("planner"));
        assert_eq!(plan_step_agent("implement_api"), Some("planner"));
    }

    #[test]
    fn plan_step_agent_falls_back_to_executor_inside_categories() {
        assert_eq!(plan_step_agent("define_database"), Some(GENERIC_EXECUTOR_AGENT));
        assert_eq!(plan_step_agent("configure_cache"), Some(GENERIC_EXECUTOR_AGENT));
    }

    #[test]
    fn plan_step_agent_skips_unrecognized_entries() {
        assert_eq!(plan_step_agent("write_poem"), None);
        assert_eq!(plan_step_agent("define_"), None);
    }

    #[test]
    fn duplicate_plan_entries_are_emitted_once() {
        let context = ExecutionContext::new().with_route("wf");
        let plan = vec!["define_agents".to_string(), "define_agents".to_string()];

        let workflow = WorkflowCompiler::new().compile(&plan, &context).expect("compile");

        let names = workflow.step_names();
        assert_eq!(names.iter().filter(|name| **name == "define_agents").count(), 1);
        assert_eq!(names.len(), 8);
    }

    #[test]
    fn plan_step_with_unusable_name_fails_compilation() {
        let context = ExecutionContext::new().with_route("wf");

        let err = WorkflowCompiler::new()
            .compile(&["define_my bot".to_string()], &context)
            .expect_err("step name with a space");

        match err {
            OrchestratorError::InvalidWorkflow { workflow, reason } => {
                assert_eq!(workflow, "wf");
                assert!(reason.contains("define_my bot"), "reason: {reason}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn validation_without_reason_still_fails() {
        let context = ExecutionContext::new()
            .with_route("wf")
            .with_validation(crate::orchestration::context::PlanValidation {
                valid: false,
                reason: None,
            });

        let err = WorkflowCompiler::new()
            .compile(&["define_agents".to_string()], &context)
            .expect_err("invalid plan");
        assert!(matches!(err, OrchestratorError::ValidationFailed { .. }));
    }
}
