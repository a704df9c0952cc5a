use serde_json::{Map, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

pub fn orchestrator_log_path(state_root: &Path) -> PathBuf {
    state_root.join("logs/orchestrator.log")
}

pub fn memory_event_log_path(state_root: &Path) -> PathBuf {
    state_root.join("logs/memory_events.jsonl")
}

pub fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

pub fn append_log_line(path: &Path, line: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(file, "{line}")
}

pub fn append_orchestrator_log_line(state_root: &Path, line: &str) -> std::io::Result<()> {
    append_log_line(&orchestrator_log_path(state_root), line)
}

/// Appends one JSON object per line; `timestamp` and `event` always lead.
pub fn append_json_event(path: &Path, event: &str, fields: &[(&str, Value)]) -> std::io::Result<()> {
    let mut payload = Map::new();
    payload.insert("timestamp".to_string(), Value::String(now_rfc3339()));
    payload.insert("event".to_string(), Value::String(event.to_string()));
    for (key, value) in fields {
        payload.insert((*key).to_string(), value.clone());
    }

    let line = serde_json::to_string(&payload)
        .map_err(|source| std::io::Error::other(source.to_string()))?;
    append_log_line(path, &line)
}
