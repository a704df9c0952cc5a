use crate::config::database_path;
use crate::orchestration::error::OrchestratorError;
use crate::shared::logging::{append_orchestrator_log_line, now_rfc3339, orchestrator_log_path};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Running,
    Succeeded,
    Failed,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Running => "running",
            RunStatus::Succeeded => "succeeded",
            RunStatus::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "running" => Ok(RunStatus::Running),
            "succeeded" => Ok(RunStatus::Succeeded),
            "failed" => Ok(RunStatus::Failed),
            other => Err(format!("unknown run status `{other}`")),
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, RunStatus::Succeeded | RunStatus::Failed)
    }
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single step attempt as persisted and logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Succeeded,
    FailedRetryable,
    FailedTerminal,
}

impl AttemptStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptStatus::Succeeded => "succeeded",
            AttemptStatus::FailedRetryable => "failed_retryable",
            AttemptStatus::FailedTerminal => "failed_terminal",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, String> {
        match raw {
            "succeeded" => Ok(AttemptStatus::Succeeded),
            "failed_retryable" => Ok(AttemptStatus::FailedRetryable),
            "failed_terminal" => Ok(AttemptStatus::FailedTerminal),
            other => Err(format!("unknown attempt status `{other}`")),
        }
    }
}

impl std::fmt::Display for AttemptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRunRecord {
    pub run_id: i64,
    pub workflow_name: String,
    pub status: RunStatus,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub id: i64,
    pub run_id: i64,
    pub step_name: String,
    pub agent_type: String,
    pub status: AttemptStatus,
    pub output: String,
    pub created_at: String,
}

/// Durable record of workflow runs and every step attempt they made.
#[derive(Debug, Clone)]
pub struct WorkflowRunStore {
    state_root: PathBuf,
    db_path: PathBuf,
}

impl WorkflowRunStore {
    /// Opens (and if needed creates) the run tables under `state_root`.
    pub fn open(state_root: &Path) -> Result<Self, OrchestratorError> {
        fs::create_dir_all(state_root).map_err(|source| io_error(state_root, source))?;
        let store = Self {
            state_root: state_root.to_path_buf(),
            db_path: database_path(state_root),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    pub fn state_root(&self) -> &Path {
        &self.state_root
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    fn ensure_schema(&self) -> Result<(), OrchestratorError> {
        let connection = self.connect()?;
        connection.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS workflow_runs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                workflow_name TEXT NOT NULL,
                status TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS workflow_steps (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                run_id INTEGER NOT NULL REFERENCES workflow_runs(id),
                step_name TEXT NOT NULL,
                agent_type TEXT NOT NULL,
                status TEXT NOT NULL,
                output TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_workflow_steps_run ON workflow_steps(run_id, id);
            ",
        )?;
        Ok(())
    }

    pub fn create_run(&self, workflow_name: &str) -> Result<i64, OrchestratorError> {
        let connection = self.connect()?;
        let now = now_rfc3339();
        connection.execute(
            "INSERT INTO workflow_runs (workflow_name, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
            params![workflow_name, RunStatus::Running.as_str(), now],
        )?;
        Ok(connection.last_insert_rowid())
    }

    pub fn save_step(
        &self,
        run_id: i64,
        step_name: &str,
        agent_type: &str,
        status: AttemptStatus,
        output: &str,
    ) -> Result<(), OrchestratorError> {
        let mut connection = self.connect()?;
        let tx = connection.transaction()?;
        let known: Option<i64> = tx
            .query_row(
                "SELECT id FROM workflow_runs WHERE id = ?1",
                params![run_id],
                |row| row.get(0),
            )
            .optional()?;
        if known.is_none() {
            return Err(OrchestratorError::UnknownRunId { run_id });
        }
        let now = now_rfc3339();
        tx.execute(
            "INSERT INTO workflow_steps (run_id, step_name, agent_type, status, output, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![run_id, step_name, agent_type, status.as_str(), output, now],
        )?;
        tx.execute(
            "UPDATE workflow_runs SET updated_at = ?2 WHERE id = ?1",
            params![run_id, now],
        )?;
        tx.commit()?;
        Ok(())
    }

    pub fn update_run_status(&self, run_id: i64, status: RunStatus) -> Result<(), OrchestratorError> {
        let connection = self.connect()?;
        let changed = connection.execute(
            "UPDATE workflow_runs SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![run_id, status.as_str(), now_rfc3339()],
        )?;
        if changed == 0 {
            return Err(OrchestratorError::UnknownRunId { run_id });
        }
        Ok(())
    }

    pub fn load_run(&self, run_id: i64) -> Result<WorkflowRunRecord, OrchestratorError> {
        let connection = self.connect()?;
        let row = connection
            .query_row(
                "SELECT id, workflow_name, status, created_at, updated_at
                 FROM workflow_runs WHERE id = ?1",
                params![run_id],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;
        let Some((run_id, workflow_name, status, created_at, updated_at)) = row else {
            return Err(OrchestratorError::UnknownRunId { run_id });
        };
        Ok(WorkflowRunRecord {
            run_id,
            workflow_name,
            status: RunStatus::parse(&status).map_err(OrchestratorError::CorruptRecord)?,
            created_at,
            updated_at,
        })
    }

    /// Step attempts of one run in the order they were recorded.
    pub fn list_steps(&self, run_id: i64) -> Result<Vec<StepRecord>, OrchestratorError> {
        let connection = self.connect()?;
        let mut statement = connection.prepare(
            "SELECT id, run_id, step_name, agent_type, status, output, created_at
             FROM workflow_steps WHERE run_id = ?1 ORDER BY id ASC",
        )?;
        let rows = statement.query_map(params![run_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
                row.get::<_, String>(6)?,
            ))
        })?;

        let mut steps = Vec::new();
        for row in rows {
            let (id, run_id, step_name, agent_type, status, output, created_at) = row?;
            steps.push(StepRecord {
                id,
                run_id,
                step_name,
                agent_type,
                status: AttemptStatus::parse(&status).map_err(OrchestratorError::CorruptRecord)?,
                output,
                created_at,
            });
        }
        Ok(steps)
    }

    pub fn append_engine_log(
        &self,
        run_id: i64,
        message: impl AsRef<str>,
    ) -> Result<(), OrchestratorError> {
        let line = format!("ts={} run_id={run_id} {}", now_rfc3339(), message.as_ref());
        append_orchestrator_log_line(&self.state_root, &line)
            .map_err(|source| io_error(orchestrator_log_path(&self.state_root).as_path(), source))
    }

    fn connect(&self) -> Result<Connection, OrchestratorError> {
        let connection =
            Connection::open(&self.db_path).map_err(|source| OrchestratorError::Open {
                path: self.db_path.display().to_string(),
                source,
            })?;
        connection.busy_timeout(Duration::from_secs(5))?;
        connection.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Ok(connection)
    }
}

fn io_error(path: &Path, source: std::io::Error) -> OrchestratorError {
    OrchestratorError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn run_status_parse_rejects_unknown_values() {
        assert_eq!(RunStatus::parse("failed"), Ok(RunStatus::Failed));
        assert!(RunStatus::parse("canceled").is_err());
        assert!(RunStatus::Succeeded.is_terminal());
        assert!(!RunStatus::Running.is_terminal());
    }

    #[test]
    fn engine_log_lines_carry_run_id() {
        let dir = tempdir().expect("tempdir");
        let store = WorkflowRunStore::open(dir.path()).expect("open");

        store
            .append_engine_log(7, "decision=start steps=3")
            .expect("log");

        let raw = fs::read_to_string(orchestrator_log_path(dir.path())).expect("read log");
        assert!(raw.contains("run_id=7 decision=start steps=3"));
    }

    #[test]
    fn save_step_rejects_unknown_run() {
        let dir = tempdir().expect("tempdir");
        let store = WorkflowRunStore::open(dir.path()).expect("open");

        let err = store
            .save_step(42, "plan_files", "file_planner", AttemptStatus::Succeeded, "{}")
            .expect_err("unknown run");
        assert!(matches!(err, OrchestratorError::UnknownRunId { run_id: 42 }));
    }
}
