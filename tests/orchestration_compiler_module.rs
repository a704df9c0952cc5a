use botsmith::orchestration::{
    ExecutionContext, FailurePolicy, OrchestratorError, PlanValidation, WorkflowCompiler,
};

fn plan(steps: &[&str]) -> Vec<String> {
    steps.iter().map(|step| step.to_string()).collect()
}

#[test]
fn orchestration_compiler_module_compiles_fixed_workflow_shape() {
    let context = ExecutionContext::new().with_route("bot_creation_workflow");

    let workflow = WorkflowCompiler::new()
        .compile(&plan(&["define_agents"]), &context)
        .expect("compile");

    assert_eq!(workflow.name(), "bot_creation_workflow");
    let rows = workflow
        .steps()
        .iter()
        .map(|step| {
            (
                step.order(),
                step.step(),
                step.agent_type().as_str(),
                step.on_failure(),
            )
        })
        .collect::<Vec<_>>();
    assert_eq!(
        rows,
        vec![
            (1, "scaffold_project", "scaffolder", FailurePolicy::Abort),
            (2, "plan_files", "file_planner", FailurePolicy::Abort),
            (3, "define_agents", "planner", FailurePolicy::Abort),
            (4, "generate_all_files", "coder", FailurePolicy::Abort),
            (5, "validate_code", "validator", FailurePolicy::Abort),
            (6, "security_scan", "security", FailurePolicy::Abort),
            (7, "optimize_workflow", "optimizer", FailurePolicy::Continue),
            (8, "deployment", "executor", FailurePolicy::Abort),
        ]
    );
    assert!(workflow.steps().iter().all(|step| step.retry_budget() == 1));
}

#[test]
fn orchestration_compiler_module_emits_plan_steps_in_plan_order() {
    let context = ExecutionContext::new().with_route("bot_creation_workflow");

    let workflow = WorkflowCompiler::new()
        .compile(
            &plan(&["design_api", "summarize_notes", "define_database", "define_agents"]),
            &context,
        )
        .expect("compile");

    let names = workflow.step_names();
    assert_eq!(
        &names[2..5],
        &["design_api", "define_database", "define_agents"]
    );
    assert!(!names.contains(&"summarize_notes"));
    assert_eq!(
        workflow
            .step("define_database")
            .map(|step| step.agent_type().as_str()),
        Some("executor")
    );
    let orders = workflow.steps().iter().map(|step| step.order()).collect::<Vec<_>>();
    assert_eq!(orders, (1..=names.len() as u32).collect::<Vec<_>>());
}

#[test]
fn orchestration_compiler_module_rejects_empty_plan() {
    let context = ExecutionContext::new().with_route("bot_creation_workflow");
    let err = WorkflowCompiler::new()
        .compile(&[], &context)
        .expect_err("empty plan");
    assert!(matches!(err, OrchestratorError::EmptyPlan));
}

#[test]
fn orchestration_compiler_module_rejects_missing_route() {
    let err = WorkflowCompiler::new()
        .compile(&plan(&["define_agents"]), &ExecutionContext::new())
        .expect_err("missing route");
    assert!(matches!(err, OrchestratorError::MissingRoute));
}

#[test]
fn orchestration_compiler_module_rejects_failed_validation() {
    let context = ExecutionContext::new()
        .with_route("bot_creation_workflow")
        .with_validation(PlanValidation {
            valid: false,
            reason: Some("plan has no deployment target".to_string()),
        });

    let err = WorkflowCompiler::new()
        .compile(&plan(&["define_agents"]), &context)
        .expect_err("invalid");
    assert!(err.to_string().contains("plan has no deployment target"));
}

#[test]
fn orchestration_compiler_module_accepts_passing_validation() {
    let context = ExecutionContext::new()
        .with_route("bot_creation_workflow")
        .with_validation(PlanValidation {
            valid: true,
            reason: None,
        })
        .with_plan(["configure_agents"]);

    let workflow = WorkflowCompiler::new()
        .compile_context(&context)
        .expect("compile");
    assert_eq!(workflow.steps().len(), 8);
    assert_eq!(workflow.steps()[2].step(), "configure_agents");
}

#[test]
fn orchestration_compiler_module_two_definition_steps_give_nine_step_workflow() {
    let context = ExecutionContext::new()
        .with_route("bot_creation_workflow")
        .with_validation(PlanValidation {
            valid: true,
            reason: None,
        });

    let workflow = WorkflowCompiler::new()
        .compile(&plan(&["define_agents", "configure_agents"]), &context)
        .expect("compile");

    assert_eq!(
        workflow.step_names(),
        vec![
            "scaffold_project",
            "plan_files",
            "define_agents",
            "configure_agents",
            "generate_all_files",
            "validate_code",
            "security_scan",
            "optimize_workflow",
            "deployment",
        ]
    );
    assert_eq!(workflow.steps()[2].agent_type().as_str(), "planner");
    assert_eq!(workflow.steps()[3].agent_type().as_str(), "planner");
}
