pub mod config;
pub mod domain;
mod logging;
pub mod manager;
pub mod policy;
pub mod repository;
pub mod store;

pub use config::MemoryConfig;
pub use domain::{
    agent_source, is_agent_source, validate_confidence, AgentMemory, EntryMeta, Interaction,
    MemoryDomainError, MemoryEntry, MemoryScope, MemoryUpdateProposal, AGENT_SOURCE_PREFIX,
};
pub use manager::{history_key, MemoryError, MemoryManager};
pub use policy::{MemoryPolicy, PolicyDecision, RejectReason};
pub use repository::{MemoryRepository, MemoryRepositoryError};
pub use store::{EphemeralStore, PersistentStore, ScopedStore};
