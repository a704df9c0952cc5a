use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Keys with a fixed meaning across steps.
pub mod keys {
    /// Ordered list of abstract plan step names (`[String]`).
    pub const PLAN: &str = "plan";
    /// Workflow name the plan compiles into (`String`).
    pub const ROUTE: &str = "route";
    /// Result of an upstream plan check (`{valid: bool, reason?: String}`).
    pub const VALIDATION: &str = "validation";
    /// When true (the default), agents simulate side effects (`bool`).
    pub const DRY_RUN: &str = "dry_run";
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanValidation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Shared key/value state threaded through one workflow run. Keys are only
/// ever added or overwritten, never removed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionContext {
    values: Map<String, Value>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(values: Map<String, Value>) -> Self {
        Self { values }
    }

    pub fn with_plan<I, S>(mut self, plan: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let plan = plan
            .into_iter()
            .map(|step| Value::String(step.into()))
            .collect::<Vec<_>>();
        self.insert(keys::PLAN, Value::Array(plan));
        self
    }

    pub fn with_route(mut self, route: impl Into<String>) -> Self {
        self.insert(keys::ROUTE, Value::String(route.into()));
        self
    }

    pub fn with_validation(mut self, validation: PlanValidation) -> Self {
        let value = serde_json::to_value(&validation).unwrap_or(Value::Null);
        self.insert(keys::VALIDATION, value);
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.insert(keys::DRY_RUN, Value::Bool(dry_run));
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Inserts or overwrites `key`, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(key.into(), value)
    }

    /// Last writer wins for every key in `result`.
    pub fn merge(&mut self, result: Map<String, Value>) {
        for (key, value) in result {
            self.values.insert(key, value);
        }
    }

    /// Copy of this context without `key`; the original is untouched.
    pub fn without(&self, key: &str) -> Self {
        let mut copy = self.clone();
        copy.values.remove(key);
        copy
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.values
    }

    /// The plan, when the `plan` key holds a list of strings.
    pub fn plan(&self) -> Option<Vec<String>> {
        let items = self.values.get(keys::PLAN)?.as_array()?;
        items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect()
    }

    /// True whenever a `plan` key is present, whatever shape its value has.
    pub fn has_raw_plan(&self) -> bool {
        self.values.contains_key(keys::PLAN)
    }

    pub fn route(&self) -> Option<&str> {
        self.values
            .get(keys::ROUTE)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|route| !route.is_empty())
    }

    pub fn validation(&self) -> Option<PlanValidation> {
        let value = self.values.get(keys::VALIDATION)?;
        serde_json::from_value(value.clone()).ok()
    }

    pub fn dry_run(&self) -> bool {
        self.values
            .get(keys::DRY_RUN)
            .and_then(Value::as_bool)
            .unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merge_overwrites_existing_keys_and_keeps_the_rest() {
        let mut context = ExecutionContext::new().with_route("bot_creation_workflow");
        context.insert("status", json!("pending"));

        let mut result = Map::new();
        result.insert("status".to_string(), json!("success"));
        result.insert("files".to_string(), json!(["main.py"]));
        context.merge(result);

        assert_eq!(context.get("status"), Some(&json!("success")));
        assert_eq!(context.get("files"), Some(&json!(["main.py"])));
        assert_eq!(context.route(), Some("bot_creation_workflow"));
        assert_eq!(context.len(), 3);
    }

    #[test]
    fn without_leaves_source_context_intact() {
        let context = ExecutionContext::new().with_plan(["define_agents"]);
        let stripped = context.without(keys::PLAN);

        assert!(!stripped.contains_key(keys::PLAN));
        assert!(context.has_raw_plan());
    }

    #[test]
    fn typed_accessors_ignore_malformed_values() {
        let mut context = ExecutionContext::new();
        context.insert(keys::PLAN, json!(["define_agents", 3]));
        context.insert(keys::ROUTE, json!("   "));
        context.insert(keys::VALIDATION, json!("yes"));

        assert_eq!(context.plan(), None);
        assert!(context.has_raw_plan());
        assert_eq!(context.route(), None);
        assert_eq!(context.validation(), None);
        assert!(context.dry_run());
    }

    #[test]
    fn raw_plan_is_detected_for_any_value_shape() {
        let mut context = ExecutionContext::new();
        assert!(!context.has_raw_plan());

        context.insert(keys::PLAN, json!("re-run everything"));
        assert!(context.has_raw_plan());

        context.insert(keys::PLAN, json!({ "steps": ["define_agents"] }));
        assert!(context.has_raw_plan());
        assert_eq!(context.plan(), None);
    }

    #[test]
    fn validation_round_trips_through_context() {
        let context = ExecutionContext::new().with_validation(PlanValidation {
            valid: false,
            reason: Some("missing deployment".to_string()),
        });

        let validation = context.validation().expect("validation");
        assert!(!validation.valid);
        assert_eq!(validation.reason.as_deref(), Some("missing deployment"));
    }
}
