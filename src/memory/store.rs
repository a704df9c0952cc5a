use super::domain::{EntryMeta, MemoryEntry, MemoryScope};
use super::repository::{MemoryRepository, MemoryRepositoryError};
use serde_json::Value;
use std::collections::BTreeMap;

/// One scope's key/value store. Writes overwrite; no history is kept.
pub trait ScopedStore: Send {
    fn scope(&self) -> MemoryScope;

    fn entry(&self, key: &str) -> Option<&MemoryEntry>;

    fn read(&self, key: &str) -> Option<Value> {
        self.entry(key).map(|entry| entry.value.clone())
    }

    fn write(
        &mut self,
        key: &str,
        value: Value,
        meta: EntryMeta,
    ) -> Result<bool, MemoryRepositoryError>;

    fn delete(&mut self, key: &str) -> Result<bool, MemoryRepositoryError>;

    fn snapshot(&self) -> BTreeMap<String, MemoryEntry>;
}

/// In-process store for the execution and session scopes.
#[derive(Debug, Clone)]
pub struct EphemeralStore {
    scope: MemoryScope,
    entries: BTreeMap<String, MemoryEntry>,
}

impl EphemeralStore {
    pub fn new(scope: MemoryScope) -> Self {
        Self {
            scope,
            entries: BTreeMap::new(),
        }
    }
}

impl ScopedStore for EphemeralStore {
    fn scope(&self) -> MemoryScope {
        self.scope
    }

    fn entry(&self, key: &str) -> Option<&MemoryEntry> {
        self.entries.get(key)
    }

    fn write(
        &mut self,
        key: &str,
        value: Value,
        meta: EntryMeta,
    ) -> Result<bool, MemoryRepositoryError> {
        let entry = MemoryEntry::superseding(self.entries.get(key), value, meta);
        self.entries.insert(key.to_string(), entry);
        Ok(true)
    }

    fn delete(&mut self, key: &str) -> Result<bool, MemoryRepositoryError> {
        Ok(self.entries.remove(key).is_some())
    }

    fn snapshot(&self) -> BTreeMap<String, MemoryEntry> {
        self.entries.clone()
    }
}

/// Write-through store for the user and project scopes.
#[derive(Debug, Clone)]
pub struct PersistentStore {
    scope: MemoryScope,
    repository: MemoryRepository,
    entries: BTreeMap<String, MemoryEntry>,
}

impl PersistentStore {
    pub fn open(
        scope: MemoryScope,
        repository: MemoryRepository,
    ) -> Result<Self, MemoryRepositoryError> {
        repository.ensure_schema()?;
        let entries = repository.load_scope(scope)?;
        Ok(Self {
            scope,
            repository,
            entries,
        })
    }
}

impl ScopedStore for PersistentStore {
    fn scope(&self) -> MemoryScope {
        self.scope
    }

    fn entry(&self, key: &str) -> Option<&MemoryEntry> {
        self.entries.get(key)
    }

    fn write(
        &mut self,
        key: &str,
        value: Value,
        meta: EntryMeta,
    ) -> Result<bool, MemoryRepositoryError> {
        let entry = MemoryEntry::superseding(self.entries.get(key), value, meta);
        self.repository.save_entry(self.scope, key, &entry)?;
        self.entries.insert(key.to_string(), entry);
        Ok(true)
    }

    fn delete(&mut self, key: &str) -> Result<bool, MemoryRepositoryError> {
        let removed = self.entries.remove(key).is_some();
        let deleted = self.repository.delete_entry(self.scope, key)?;
        Ok(removed || deleted)
    }

    fn snapshot(&self) -> BTreeMap<String, MemoryEntry> {
        self.entries.clone()
    }
}
