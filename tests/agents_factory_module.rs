use botsmith::agents::{
    Agent, AgentError, AgentFactory, AgentInit, AgentMetrics, AgentOutput, AgentParams,
    AgentRegistry,
};
use botsmith::memory::{MemoryConfig, MemoryManager, MemoryScope};
use botsmith::orchestration::ExecutionContext;
use botsmith::provider::{BackendError, ModelBackend};
use botsmith::shared::ids::{AgentId, AgentType};
use serde_json::json;
use std::sync::Arc;
use tempfile::tempdir;

struct NamedBackend(&'static str);

impl ModelBackend for NamedBackend {
    fn name(&self) -> &str {
        self.0
    }

    fn generate(&self, _prompt: &str, _system_prompt: &str) -> Result<String, BackendError> {
        Ok(format!("from {}", self.0))
    }

    fn is_available(&self) -> bool {
        true
    }
}

/// Reports which backend it was handed through its output.
struct BackendProbe {
    agent_id: AgentId,
    agent_type: AgentType,
    capabilities: Vec<String>,
    backend: Arc<dyn ModelBackend>,
}

impl Agent for BackendProbe {
    fn agent_id(&self) -> &AgentId {
        &self.agent_id
    }

    fn agent_type(&self) -> &AgentType {
        &self.agent_type
    }

    fn execute(&mut self, _task: &str, _context: ExecutionContext) -> Result<AgentOutput, AgentError> {
        let mut output = AgentOutput::new();
        output.insert("backend".to_string(), json!(self.backend.name()));
        Ok(output)
    }

    fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    fn metrics(&self) -> AgentMetrics {
        AgentMetrics::default()
    }
}

fn construct_probe(init: AgentInit) -> Result<Box<dyn Agent>, AgentError> {
    Ok(Box::new(BackendProbe {
        agent_id: init.agent_id,
        agent_type: init.agent_type,
        capabilities: init.capabilities,
        backend: init.backend,
    }))
}

fn construct_broken(init: AgentInit) -> Result<Box<dyn Agent>, AgentError> {
    Err(AgentError::Construction {
        agent_id: init.agent_id.to_string(),
        reason: "model weights missing".to_string(),
    })
}

fn agent_type(raw: &str) -> AgentType {
    AgentType::parse(raw).expect("agent type")
}

fn factory(registry: AgentRegistry, dir: &std::path::Path) -> AgentFactory {
    let memory = Arc::new(MemoryManager::in_memory(
        dir.join("events.jsonl"),
        &MemoryConfig::default(),
    ));
    AgentFactory::new(Arc::new(registry), memory, Arc::new(NamedBackend("local")))
        .with_code_backend(Arc::new(NamedBackend("code")))
}

#[test]
fn agents_factory_module_routes_code_generation_types_to_code_backend() {
    let dir = tempdir().expect("tempdir");
    let mut registry = AgentRegistry::new();
    registry
        .register(agent_type("coder"), construct_probe)
        .expect("coder");
    registry
        .register(agent_type("planner"), construct_probe)
        .expect("planner");
    let factory = factory(registry, dir.path());

    let mut coder = factory
        .create_agent("coder", AgentParams::default())
        .expect("coder agent");
    let mut planner = factory
        .create_agent("planner", AgentParams::default())
        .expect("planner agent");

    let coder_output = coder
        .execute("generate_all_files", ExecutionContext::new())
        .expect("coder run");
    let planner_output = planner
        .execute("define_agents", ExecutionContext::new())
        .expect("planner run");
    assert_eq!(coder_output["backend"], "code");
    assert_eq!(planner_output["backend"], "local");
}

#[test]
fn agents_factory_module_defaults_identity_from_type_tag() {
    let dir = tempdir().expect("tempdir");
    let mut registry = AgentRegistry::new();
    registry
        .register(agent_type("planner"), construct_probe)
        .expect("planner");
    let factory = factory(registry, dir.path());

    let agent = factory
        .create_agent("planner", AgentParams::default())
        .expect("agent");
    assert_eq!(agent.agent_type().as_str(), "planner");
    assert_eq!(agent.agent_id().as_str(), "planner");

    let params = AgentParams {
        agent_id: Some(AgentId::parse("planner_define_agents").expect("id")),
        agent_type: Some(agent_type("logic")),
        capabilities: vec!["define_agents".to_string()],
    };
    let agent = factory.create_agent("planner", params).expect("agent");
    assert_eq!(agent.agent_type().as_str(), "logic");
    assert_eq!(agent.agent_id().as_str(), "planner_define_agents");
    assert_eq!(agent.capabilities(), ["define_agents".to_string()]);
}

#[test]
fn agents_factory_module_unknown_type_and_constructor_failures_propagate() {
    let dir = tempdir().expect("tempdir");
    let mut registry = AgentRegistry::new();
    registry
        .register(agent_type("nlp"), construct_broken)
        .expect("nlp");
    let factory = factory(registry, dir.path());

    let err = factory
        .create_agent("unknown", AgentParams::default())
        .err()
        .expect("unknown type");
    assert!(matches!(err, AgentError::Registry(_)));

    let err = factory
        .create_agent("nlp", AgentParams::default())
        .err()
        .expect("constructor failure");
    assert!(err.to_string().contains("model weights missing"));
}

#[test]
fn agents_factory_module_builtin_prompt_agent_records_interaction() {
    let dir = tempdir().expect("tempdir");
    let factory = factory(
        AgentRegistry::with_builtin_agents().expect("builtin agents"),
        dir.path(),
    );

    let mut agent = factory
        .create_agent(
            "coder",
            AgentParams::for_agent(AgentId::parse("coder_generate_all_files").expect("id")),
        )
        .expect("coder");
    let output = agent
        .execute("generate_all_files", ExecutionContext::new().with_dry_run(false))
        .expect("run");

    assert_eq!(output["generate_all_files_output"], "from code");
    assert_eq!(agent.metrics().successes, 1);
    let interaction = factory
        .memory()
        .read(MemoryScope::Session, "interaction_coder_generate_all_files_1")
        .expect("interaction recorded");
    assert_eq!(interaction["success"], true);
}

#[test]
fn agents_factory_module_builtin_executor_refuses_raw_plan() {
    let dir = tempdir().expect("tempdir");
    let factory = factory(
        AgentRegistry::with_builtin_agents().expect("builtin agents"),
        dir.path(),
    );
    let mut executor = factory
        .create_agent("executor", AgentParams::default())
        .expect("executor");

    let err = executor
        .execute(
            "deployment",
            ExecutionContext::new().with_plan(["define_agents"]),
        )
        .expect_err("plan present");
    assert!(matches!(err, AgentError::Execution { .. }));

    let output = executor
        .execute("deployment", ExecutionContext::new())
        .expect("no plan");
    assert_eq!(output["status"], "success");
    assert_eq!(output["dry_run"], true);
    assert_eq!(executor.metrics().failures, 1);
}
