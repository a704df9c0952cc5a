pub mod compiler;
pub mod context;
pub mod definition;
pub mod error;
pub mod executor;
pub mod run_store;

pub use compiler::{plan_step_agent, WorkflowCompiler, DEFAULT_RETRY_BUDGET, GENERIC_EXECUTOR_AGENT};
pub use context::{keys, ExecutionContext, PlanValidation};
pub use definition::{FailurePolicy, StepDefinition, WorkflowDefinition};
pub use error::OrchestratorError;
pub use executor::{ExecutionLogEntry, ExecutionReport, StepOutcome, StepState, WorkflowExecutor};
pub use run_store::{AttemptStatus, RunStatus, StepRecord, WorkflowRunRecord, WorkflowRunStore};
