use crate::agents::AgentError;
use crate::orchestration::executor::StepState;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("cannot compile workflow: plan is empty")]
    EmptyPlan,
    #[error("cannot compile workflow: context has no `route`")]
    MissingRoute,
    #[error("cannot compile workflow: plan validation failed: {reason}")]
    ValidationFailed { reason: String },
    #[error("invalid workflow definition `{workflow}`: {reason}")]
    InvalidWorkflow { workflow: String, reason: String },
    #[error("step `{step}` state transition `{from}` -> `{to}` is invalid")]
    InvalidStepTransition {
        step: String,
        from: StepState,
        to: StepState,
    },
    #[error("workflow run `{run_id}` not found")]
    UnknownRunId { run_id: i64 },
    #[error("run store record is corrupt: {0}")]
    CorruptRecord(String),
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error("failed to open run store {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("run store query failed: {0}")]
    Sql(#[from] rusqlite::Error),
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
