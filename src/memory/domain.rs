use crate::shared::logging::now_rfc3339;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Prefix that marks a proposal source as an automated agent.
pub const AGENT_SOURCE_PREFIX: &str = "agent:";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MemoryDomainError {
    #[error("confidence must be in range 0.0..=1.0; got {value}")]
    ConfidenceOutOfRange { value: f64 },
    #[error("required field `{field}` must be non-empty")]
    MissingField { field: &'static str },
    #[error("unknown memory scope `{0}`")]
    UnknownScope(String),
}

pub fn validate_confidence(value: f64) -> Result<(), MemoryDomainError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(MemoryDomainError::ConfidenceOutOfRange { value });
    }
    Ok(())
}

pub fn agent_source(agent_id: &str) -> String {
    format!("{AGENT_SOURCE_PREFIX}{agent_id}")
}

pub fn is_agent_source(source: &str) -> bool {
    source.starts_with(AGENT_SOURCE_PREFIX)
}

/// Ordered by increasing durability and decreasing write trust.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryScope {
    Execution,
    Session,
    User,
    Project,
}

impl MemoryScope {
    pub const ALL: [MemoryScope; 4] = [
        MemoryScope::Execution,
        MemoryScope::Session,
        MemoryScope::User,
        MemoryScope::Project,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Execution => "execution",
            Self::Session => "session",
            Self::User => "user",
            Self::Project => "project",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, MemoryDomainError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "execution" => Ok(Self::Execution),
            "session" => Ok(Self::Session),
            "user" => Ok(Self::User),
            "project" => Ok(Self::Project),
            other => Err(MemoryDomainError::UnknownScope(other.to_string())),
        }
    }

    pub fn is_persistent(self) -> bool {
        matches!(self, Self::User | Self::Project)
    }
}

impl std::fmt::Display for MemoryScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryUpdateProposal {
    pub key: String,
    pub value: Value,
    pub confidence: f64,
    pub justification: String,
    #[serde(default)]
    pub suggested_scope: Option<MemoryScope>,
    pub source: String,
    pub proposed_at: String,
}

impl MemoryUpdateProposal {
    pub fn new(
        key: impl Into<String>,
        value: Value,
        confidence: f64,
        justification: impl Into<String>,
        source: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value,
            confidence,
            justification: justification.into(),
            suggested_scope: None,
            source: source.into(),
            proposed_at: now_rfc3339(),
        }
    }

    pub fn with_scope(mut self, scope: MemoryScope) -> Self {
        self.suggested_scope = Some(scope);
        self
    }

    pub fn is_agent_originated(&self) -> bool {
        is_agent_source(&self.source)
    }

    pub fn validate(&self) -> Result<(), MemoryDomainError> {
        if self.key.trim().is_empty() {
            return Err(MemoryDomainError::MissingField { field: "key" });
        }
        if self.source.trim().is_empty() {
            return Err(MemoryDomainError::MissingField { field: "source" });
        }
        validate_confidence(self.confidence)
    }
}

/// Write metadata carried alongside a value into a scoped store.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryMeta {
    pub source: String,
    pub confidence: f64,
    pub justification: Option<String>,
}

impl EntryMeta {
    pub fn system() -> Self {
        Self {
            source: "system".to_string(),
            confidence: 1.0,
            justification: None,
        }
    }
}

impl From<&MemoryUpdateProposal> for EntryMeta {
    fn from(proposal: &MemoryUpdateProposal) -> Self {
        Self {
            source: proposal.source.clone(),
            confidence: proposal.confidence,
            justification: Some(proposal.justification.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryEntry {
    pub value: Value,
    pub version: u32,
    pub updated_at: String,
    pub source: String,
    pub confidence: f64,
    #[serde(default)]
    pub justification: Option<String>,
}

impl MemoryEntry {
    /// Builds the entry that replaces `previous`; only the version survives the overwrite.
    pub fn superseding(previous: Option<&MemoryEntry>, value: Value, meta: EntryMeta) -> Self {
        Self {
            value,
            version: previous.map_or(1, |entry| entry.version.saturating_add(1)),
            updated_at: now_rfc3339(),
            source: meta.source,
            confidence: meta.confidence,
            justification: meta.justification,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub task: String,
    pub result: Value,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentMemory {
    agent_id: String,
    #[serde(default)]
    interactions: Vec<Interaction>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl AgentMemory {
    pub fn new(agent_id: impl Into<String>) -> Self {
        Self {
            agent_id: agent_id.into(),
            interactions: Vec::new(),
            metadata: Map::new(),
        }
    }

    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    /// Interactions are append-only.
    pub fn record(&mut self, interaction: Interaction) {
        self.interactions.push(interaction);
    }
}
