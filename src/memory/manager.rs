use super::config::MemoryConfig;
use super::domain::{
    AgentMemory, EntryMeta, MemoryDomainError, MemoryEntry, MemoryScope, MemoryUpdateProposal,
};
use super::logging::append_proposal_event;
use super::policy::{MemoryPolicy, PolicyDecision};
use super::repository::{MemoryRepository, MemoryRepositoryError};
use super::store::{EphemeralStore, PersistentStore, ScopedStore};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, thiserror::Error)]
pub enum MemoryError {
    #[error(transparent)]
    Repository(#[from] MemoryRepositoryError),
    #[error(transparent)]
    Domain(#[from] MemoryDomainError),
    #[error("failed to append memory event to {path}: {source}")]
    EventLog {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no store is registered for scope `{0}`")]
    MissingStore(MemoryScope),
}

type StoreTable = BTreeMap<MemoryScope, Box<dyn ScopedStore>>;

/// Routes accepted proposals to their scoped store and answers scoped reads.
///
/// The store table sits behind one lock so concurrent runs sharing a manager
/// serialize their writes.
pub struct MemoryManager {
    policy: MemoryPolicy,
    session_id: String,
    event_log: PathBuf,
    stores: Mutex<StoreTable>,
}

impl std::fmt::Debug for MemoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryManager")
            .field("policy", &self.policy)
            .field("session_id", &self.session_id)
            .field("event_log", &self.event_log)
            .finish_non_exhaustive()
    }
}

impl MemoryManager {
    /// User and project scopes persist to sqlite at `db_path`.
    pub fn open(
        db_path: &Path,
        event_log: impl Into<PathBuf>,
        config: &MemoryConfig,
    ) -> Result<Self, MemoryError> {
        let repository = MemoryRepository::open(db_path)?;
        let mut stores: StoreTable = BTreeMap::new();
        stores.insert(
            MemoryScope::Execution,
            Box::new(EphemeralStore::new(MemoryScope::Execution)),
        );
        stores.insert(
            MemoryScope::Session,
            Box::new(EphemeralStore::new(MemoryScope::Session)),
        );
        stores.insert(
            MemoryScope::User,
            Box::new(PersistentStore::open(MemoryScope::User, repository.clone())?),
        );
        stores.insert(
            MemoryScope::Project,
            Box::new(PersistentStore::open(MemoryScope::Project, repository)?),
        );
        Ok(Self::with_stores(stores, event_log, config))
    }

    /// Every scope held in process; nothing outlives the manager.
    pub fn in_memory(event_log: impl Into<PathBuf>, config: &MemoryConfig) -> Self {
        let stores = MemoryScope::ALL
            .into_iter()
            .map(|scope| {
                (
                    scope,
                    Box::new(EphemeralStore::new(scope)) as Box<dyn ScopedStore>,
                )
            })
            .collect();
        Self::with_stores(stores, event_log, config)
    }

    fn with_stores(
        stores: StoreTable,
        event_log: impl Into<PathBuf>,
        config: &MemoryConfig,
    ) -> Self {
        Self {
            policy: MemoryPolicy::from_config(config),
            session_id: config.session_id.clone(),
            event_log: event_log.into(),
            stores: Mutex::new(stores),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn event_log_path(&self) -> &Path {
        &self.event_log
    }

    /// Evaluates one proposal and writes it when accepted. The event line is
    /// appended for every evaluation, accepted or not.
    pub fn propose(&self, proposal: MemoryUpdateProposal) -> Result<bool, MemoryError> {
        let decision = self.policy.evaluate(&proposal);
        let written = match decision {
            PolicyDecision::Accept { scope } => self.write_accepted(scope, &proposal),
            PolicyDecision::Reject { .. } => Ok(()),
        };

        append_proposal_event(&self.event_log, &self.session_id, &proposal, decision).map_err(
            |source| MemoryError::EventLog {
                path: self.event_log.display().to_string(),
                source,
            },
        )?;
        written?;
        Ok(decision.is_accepted())
    }

    fn write_accepted(
        &self,
        scope: MemoryScope,
        proposal: &MemoryUpdateProposal,
    ) -> Result<(), MemoryError> {
        let mut stores = self.lock_stores();
        let store = stores
            .get_mut(&scope)
            .ok_or(MemoryError::MissingStore(scope))?;
        store.write(&proposal.key, proposal.value.clone(), EntryMeta::from(proposal))?;
        Ok(())
    }

    pub fn read(&self, scope: MemoryScope, key: &str) -> Option<Value> {
        self.lock_stores()
            .get(&scope)
            .and_then(|store| store.read(key))
    }

    pub fn entry(&self, scope: MemoryScope, key: &str) -> Option<MemoryEntry> {
        self.lock_stores()
            .get(&scope)
            .and_then(|store| store.entry(key).cloned())
    }

    pub fn delete(&self, scope: MemoryScope, key: &str) -> Result<bool, MemoryError> {
        let mut stores = self.lock_stores();
        let store = stores
            .get_mut(&scope)
            .ok_or(MemoryError::MissingStore(scope))?;
        Ok(store.delete(key)?)
    }

    pub fn snapshot(&self, scope: MemoryScope) -> BTreeMap<String, MemoryEntry> {
        self.lock_stores()
            .get(&scope)
            .map(|store| store.snapshot())
            .unwrap_or_default()
    }

    /// Legacy path: stores an agent's interaction history in the session scope.
    pub fn save_memory(&self, memory: &AgentMemory) -> Result<bool, MemoryError> {
        let value = json!({
            "interactions": memory.interactions(),
            "metadata": memory.metadata,
        });
        let mut stores = self.lock_stores();
        let store = stores
            .get_mut(&MemoryScope::Session)
            .ok_or(MemoryError::MissingStore(MemoryScope::Session))?;
        Ok(store.write(&history_key(memory.agent_id()), value, EntryMeta::system())?)
    }

    /// Legacy path: rebuilds an agent's history from the session scope; an
    /// agent with no history gets an empty one.
    pub fn load_memory(&self, agent_id: &str) -> AgentMemory {
        let mut memory = AgentMemory::new(agent_id);
        let Some(stored) = self.read(MemoryScope::Session, &history_key(agent_id)) else {
            return memory;
        };
        if let Some(interactions) = stored.get("interactions").cloned() {
            if let Ok(interactions) = serde_json::from_value::<Vec<_>>(interactions) {
                for interaction in interactions {
                    memory.record(interaction);
                }
            }
        }
        if let Some(Value::Object(metadata)) = stored.get("metadata") {
            memory.metadata = metadata.clone();
        }
        memory
    }

    fn lock_stores(&self) -> MutexGuard<'_, StoreTable> {
        self.stores.lock().unwrap_or_else(|err| err.into_inner())
    }
}

pub fn history_key(agent_id: &str) -> String {
    format!("history_{agent_id}")
}
