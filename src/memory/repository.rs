use super::domain::{MemoryEntry, MemoryScope};
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum MemoryRepositoryError {
    #[error("sqlite open failed at {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to create memory database parent {path}: {source}")]
    CreateParent {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("sqlite statement failed: {source}")]
    Sql {
        #[source]
        source: rusqlite::Error,
    },
    #[error("memory value for `{scope}/{key}` is not valid json: {source}")]
    Json {
        scope: MemoryScope,
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Durable backing for the persistent scopes, one row per `(scope, key)`.
#[derive(Debug, Clone)]
pub struct MemoryRepository {
    db_path: PathBuf,
}

impl MemoryRepository {
    pub fn open(db_path: &Path) -> Result<Self, MemoryRepositoryError> {
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent).map_err(|source| MemoryRepositoryError::CreateParent {
                path: parent.display().to_string(),
                source,
            })?;
        }

        let repo = Self {
            db_path: db_path.to_path_buf(),
        };

        // Ensure open is valid now to fail fast.
        let _ = repo.connect()?;
        Ok(repo)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn ensure_schema(&self) -> Result<(), MemoryRepositoryError> {
        let connection = self.connect()?;
        connection
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS memory_store (
                    scope TEXT NOT NULL,
                    key TEXT NOT NULL,
                    value TEXT NOT NULL,
                    version INTEGER NOT NULL,
                    updated_at TEXT NOT NULL,
                    source TEXT NOT NULL,
                    confidence REAL NOT NULL,
                    justification TEXT,
                    PRIMARY KEY (scope, key)
                );
                ",
            )
            .map_err(|source| MemoryRepositoryError::Sql { source })
    }

    pub fn save_entry(
        &self,
        scope: MemoryScope,
        key: &str,
        entry: &MemoryEntry,
    ) -> Result<(), MemoryRepositoryError> {
        let value =
            serde_json::to_string(&entry.value).map_err(|source| MemoryRepositoryError::Json {
                scope,
                key: key.to_string(),
                source,
            })?;
        let mut connection = self.connect()?;
        let tx = connection
            .transaction()
            .map_err(|source| MemoryRepositoryError::Sql { source })?;
        tx.execute(
            "
            INSERT INTO memory_store (
                scope, key, value, version, updated_at, source, confidence, justification
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(scope, key) DO UPDATE SET
                value=excluded.value,
                version=excluded.version,
                updated_at=excluded.updated_at,
                source=excluded.source,
                confidence=excluded.confidence,
                justification=excluded.justification
            ",
            params![
                scope.as_str(),
                key,
                value,
                i64::from(entry.version),
                entry.updated_at,
                entry.source,
                entry.confidence,
                entry.justification,
            ],
        )
        .map_err(|source| MemoryRepositoryError::Sql { source })?;
        tx.commit()
            .map_err(|source| MemoryRepositoryError::Sql { source })
    }

    pub fn delete_entry(&self, scope: MemoryScope, key: &str) -> Result<bool, MemoryRepositoryError> {
        let connection = self.connect()?;
        let deleted = connection
            .execute(
                "DELETE FROM memory_store WHERE scope = ?1 AND key = ?2",
                params![scope.as_str(), key],
            )
            .map_err(|source| MemoryRepositoryError::Sql { source })?;
        Ok(deleted > 0)
    }

    pub fn load_scope(
        &self,
        scope: MemoryScope,
    ) -> Result<BTreeMap<String, MemoryEntry>, MemoryRepositoryError> {
        let connection = self.connect()?;
        let mut statement = connection
            .prepare(
                "
                SELECT key, value, version, updated_at, source, confidence, justification
                FROM memory_store
                WHERE scope = ?1
                ORDER BY key ASC
                ",
            )
            .map_err(|source| MemoryRepositoryError::Sql { source })?;
        let rows = statement
            .query_map(params![scope.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, f64>(5)?,
                    row.get::<_, Option<String>>(6)?,
                ))
            })
            .map_err(|source| MemoryRepositoryError::Sql { source })?;

        let mut entries = BTreeMap::new();
        for row in rows {
            let (key, raw_value, version, updated_at, source, confidence, justification) =
                row.map_err(|source| MemoryRepositoryError::Sql { source })?;
            let value = serde_json::from_str(&raw_value).map_err(|source| {
                MemoryRepositoryError::Json {
                    scope,
                    key: key.clone(),
                    source,
                }
            })?;
            entries.insert(
                key,
                MemoryEntry {
                    value,
                    version: u32::try_from(version).unwrap_or(u32::MAX),
                    updated_at,
                    source,
                    confidence,
                    justification,
                },
            );
        }
        Ok(entries)
    }

    fn connect(&self) -> Result<Connection, MemoryRepositoryError> {
        let connection =
            Connection::open(&self.db_path).map_err(|source| MemoryRepositoryError::Open {
                path: self.db_path.display().to_string(),
                source,
            })?;
        connection
            .busy_timeout(Duration::from_secs(5))
            .map_err(|source| MemoryRepositoryError::Sql { source })?;
        connection
            .execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|source| MemoryRepositoryError::Sql { source })?;
        Ok(connection)
    }
}
