use botsmith::orchestration::{AttemptStatus, OrchestratorError, RunStatus, WorkflowRunStore};
use tempfile::tempdir;

#[test]
fn run_store_module_creates_runs_in_running_state() {
    let temp = tempdir().expect("tempdir");
    let store = WorkflowRunStore::open(temp.path()).expect("open");

    let first = store.create_run("bot_creation_workflow").expect("first run");
    let second = store.create_run("bot_creation_workflow").expect("second run");
    assert_ne!(first, second);

    let run = store.load_run(first).expect("load run");
    assert_eq!(run.workflow_name, "bot_creation_workflow");
    assert_eq!(run.status, RunStatus::Running);
    assert!(store.db_path().ends_with("botsmith.db"));
}

#[test]
fn run_store_module_keeps_step_attempts_in_insertion_order() {
    let temp = tempdir().expect("tempdir");
    let store = WorkflowRunStore::open(temp.path()).expect("open");
    let run_id = store.create_run("wf").expect("create run");

    store
        .save_step(run_id, "plan_files", "file_planner", AttemptStatus::FailedRetryable, "timeout")
        .expect("attempt 1");
    store
        .save_step(run_id, "plan_files", "file_planner", AttemptStatus::Succeeded, "{\"files\":[]}")
        .expect("attempt 2");

    let steps = store.list_steps(run_id).expect("list steps");
    let rows = steps
        .iter()
        .map(|step| (step.step_name.as_str(), step.status, step.output.as_str()))
        .collect::<Vec<_>>();
    assert_eq!(
        rows,
        vec![
            ("plan_files", AttemptStatus::FailedRetryable, "timeout"),
            ("plan_files", AttemptStatus::Succeeded, "{\"files\":[]}"),
        ]
    );
}

#[test]
fn run_store_module_updates_status_and_survives_reopen() {
    let temp = tempdir().expect("tempdir");
    let run_id = {
        let store = WorkflowRunStore::open(temp.path()).expect("open");
        let run_id = store.create_run("wf").expect("create run");
        store
            .update_run_status(run_id, RunStatus::Failed)
            .expect("update status");
        run_id
    };

    let reopened = WorkflowRunStore::open(temp.path()).expect("reopen");
    assert_eq!(
        reopened.load_run(run_id).expect("load").status,
        RunStatus::Failed
    );
}

#[test]
fn run_store_module_unknown_run_ids_are_errors() {
    let temp = tempdir().expect("tempdir");
    let store = WorkflowRunStore::open(temp.path()).expect("open");

    assert!(matches!(
        store.load_run(99),
        Err(OrchestratorError::UnknownRunId { run_id: 99 })
    ));
    assert!(matches!(
        store.update_run_status(99, RunStatus::Succeeded),
        Err(OrchestratorError::UnknownRunId { run_id: 99 })
    ));
    assert!(store.list_steps(99).expect("list").is_empty());
}
