use crate::agents::{AgentFactory, AgentRegistry};
use crate::config::{load_global_settings, load_settings, Settings};
use crate::memory::{MemoryManager, MemoryScope};
use crate::orchestration::{
    ExecutionContext, WorkflowCompiler, WorkflowDefinition, WorkflowExecutor, WorkflowRunStore,
};
use crate::provider::{ollama_backend, ModelBackend, OfflineBackend};
use crate::shared::logging::memory_event_log_path;
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliVerb {
    Compile,
    Run,
    Runs,
    Memory,
    Help,
    Unknown,
}

pub fn parse_cli_verb(input: &str) -> CliVerb {
    match input {
        "compile" => CliVerb::Compile,
        "run" => CliVerb::Run,
        "runs" => CliVerb::Runs,
        "memory" => CliVerb::Memory,
        "help" | "--help" | "-h" => CliVerb::Help,
        _ => CliVerb::Unknown,
    }
}

pub fn help_text() -> String {
    [
        "usage: botsmith [--config <path>] [--state-root <path>] <command> ...",
        "",
        "commands:",
        "  compile <route> <plan-step>...        print the compiled workflow",
        "  run <route> <plan-step>... [--live]   compile and execute (dry run unless --live)",
        "  runs show <run-id>                    print a stored run and its step attempts",
        "  memory get <scope> <key>              print a stored memory value",
    ]
    .join("\n")
}

/// Global options accepted anywhere on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct GlobalOptions {
    config: Option<PathBuf>,
    state_root: Option<PathBuf>,
    live: bool,
}

fn split_options(args: Vec<String>) -> Result<(GlobalOptions, Vec<String>), String> {
    let mut options = GlobalOptions::default();
    let mut rest = Vec::new();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--config" => {
                let value = args.next().ok_or("`--config` requires a path")?;
                options.config = Some(PathBuf::from(value));
            }
            "--state-root" => {
                let value = args.next().ok_or("`--state-root` requires a path")?;
                options.state_root = Some(PathBuf::from(value));
            }
            "--live" => options.live = true,
            _ => rest.push(arg),
        }
    }
    Ok((options, rest))
}

pub fn run_cli(args: Vec<String>) -> Result<String, String> {
    let (options, args) = split_options(args)?;
    if args.is_empty() {
        return Ok(help_text());
    }

    match parse_cli_verb(args[0].as_str()) {
        CliVerb::Compile => cmd_compile(&args[1..]),
        CliVerb::Run => cmd_run(&options, &args[1..]),
        CliVerb::Runs => cmd_runs(&options, &args[1..]),
        CliVerb::Memory => cmd_memory(&options, &args[1..]),
        CliVerb::Help => Ok(help_text()),
        CliVerb::Unknown => Err(format!("unknown command `{}`", args[0])),
    }
}

fn load_cli_settings(options: &GlobalOptions) -> Result<(Settings, PathBuf), String> {
    let mut settings = match &options.config {
        Some(path) => load_settings(path),
        None => load_global_settings(),
    }
    .map_err(|e| e.to_string())?;
    if let Some(state_root) = &options.state_root {
        settings.state_root = Some(state_root.clone());
    }
    let state_root = settings.resolve_state_root().map_err(|e| e.to_string())?;
    Ok((settings, state_root))
}

fn compile_args(args: &[String], usage: &str) -> Result<WorkflowDefinition, String> {
    if args.len() < 2 {
        return Err(usage.to_string());
    }
    let context = ExecutionContext::new()
        .with_route(args[0].clone())
        .with_plan(args[1..].iter().cloned());
    WorkflowCompiler::new()
        .compile_context(&context)
        .map_err(|e| e.to_string())
}

fn to_pretty_json(value: &impl Serialize) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|e| format!("failed to encode output: {e}"))
}

fn cmd_compile(args: &[String]) -> Result<String, String> {
    let workflow = compile_args(args, "usage: compile <route> <plan-step>...")?;
    to_pretty_json(&workflow)
}

fn cmd_run(options: &GlobalOptions, args: &[String]) -> Result<String, String> {
    let workflow = compile_args(args, "usage: run <route> <plan-step>... [--live]")?;
    let (settings, state_root) = load_cli_settings(options)?;

    let memory = Arc::new(open_memory(&settings, &state_root)?);
    let (local, code): (Arc<dyn ModelBackend>, Arc<dyn ModelBackend>) = if options.live {
        (
            ollama_backend("local", &settings.backends.local),
            ollama_backend("code", settings.backends.code_or_local()),
        )
    } else {
        (
            Arc::new(OfflineBackend::new("local")),
            Arc::new(OfflineBackend::new("code")),
        )
    };
    let registry = AgentRegistry::with_builtin_agents().map_err(|e| e.to_string())?;
    let factory = AgentFactory::new(Arc::new(registry), memory, local).with_code_backend(code);
    let run_store = WorkflowRunStore::open(&state_root).map_err(|e| e.to_string())?;

    let context = ExecutionContext::new()
        .with_route(workflow.name().to_string())
        .with_plan(args[1..].iter().cloned())
        .with_dry_run(!options.live);
    let report = WorkflowExecutor::new(factory, run_store)
        .execute(&workflow, context)
        .map_err(|e| e.to_string())?;
    to_pretty_json(&report)
}

fn cmd_runs(options: &GlobalOptions, args: &[String]) -> Result<String, String> {
    if args.len() != 2 || args[0] != "show" {
        return Err("usage: runs show <run-id>".to_string());
    }
    let run_id = args[1]
        .parse::<i64>()
        .map_err(|_| format!("invalid run id `{}`", args[1]))?;
    let (_, state_root) = load_cli_settings(options)?;
    let store = WorkflowRunStore::open(&state_root).map_err(|e| e.to_string())?;
    let run = store.load_run(run_id).map_err(|e| e.to_string())?;
    let steps = store.list_steps(run_id).map_err(|e| e.to_string())?;
    to_pretty_json(&json!({ "run": run, "steps": steps }))
}

fn cmd_memory(options: &GlobalOptions, args: &[String]) -> Result<String, String> {
    if args.len() != 3 || args[0] != "get" {
        return Err("usage: memory get <scope> <key>".to_string());
    }
    let scope = MemoryScope::parse(&args[1]).map_err(|e| e.to_string())?;
    let (settings, state_root) = load_cli_settings(options)?;
    let memory = open_memory(&settings, &state_root)?;
    let entry = memory
        .entry(scope, &args[2])
        .ok_or_else(|| format!("no `{}` memory for key `{}`", scope, args[2]))?;
    to_pretty_json(&entry)
}

fn open_memory(settings: &Settings, state_root: &std::path::Path) -> Result<MemoryManager, String> {
    let db_path = crate::config::database_path(state_root);
    MemoryManager::open(&db_path, memory_event_log_path(state_root), &settings.memory)
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|arg| arg.to_string()).collect()
    }

    #[test]
    fn options_are_accepted_anywhere() {
        let (options, rest) = split_options(args(&[
            "run",
            "--state-root",
            "/tmp/state",
            "wf",
            "define_agents",
            "--live",
        ]))
        .expect("split");

        assert_eq!(options.state_root, Some(PathBuf::from("/tmp/state")));
        assert!(options.live);
        assert_eq!(rest, args(&["run", "wf", "define_agents"]));
    }

    #[test]
    fn missing_option_value_is_an_error() {
        let err = split_options(args(&["--config"])).expect_err("missing path");
        assert!(err.contains("--config"));
    }
}
