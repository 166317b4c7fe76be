use crate::infrastructure::error::InfraError;
use crate::infrastructure::storage::open_connection;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, InfraError>;
    fn set(&self, key: &str, value: &str) -> Result<(), InfraError>;
}

#[derive(Debug, Clone)]
pub struct SqliteKeyValueStore {
    db_path: PathBuf,
}

impl SqliteKeyValueStore {
    pub fn new(db_path: impl AsRef<Path>) -> Self {
        Self {
            db_path: db_path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection, InfraError> {
        open_connection(&self.db_path)
    }
}

impl KeyValueStore for SqliteKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, InfraError> {
        let connection = self.connect()?;
        let value = connection
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), InfraError> {
        let connection = self.connect()?;
        connection.execute(
            "INSERT INTO kv_store (key, value)
             VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    values: Mutex<HashMap<String, String>>,
}

impl KeyValueStore for InMemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, InfraError> {
        let values = self
            .values
            .lock()
            .map_err(|error| InfraError::poisoned("kv store", error))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), InfraError> {
        let mut values = self
            .values
            .lock()
            .map_err(|error| InfraError::poisoned("kv store", error))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::storage::initialize_database;
    use crate::test_support::TempWorkspace;

    #[test]
    fn sqlite_store_upserts_values() {
        let workspace = TempWorkspace::new("kv-store");
        let path = workspace.path().join("schedule.sqlite");
        initialize_database(&path).expect("initialize database");
        let store = SqliteKeyValueStore::new(&path);

        assert_eq!(store.get("lastNotificationDay").expect("get"), None);
        store.set("lastNotificationDay", "2026-02-16").expect("set");
        store.set("lastNotificationDay", "2026-02-17").expect("overwrite");
        assert_eq!(
            store.get("lastNotificationDay").expect("get"),
            Some("2026-02-17".to_string())
        );
    }

    #[test]
    fn in_memory_store_roundtrip() {
        let store = InMemoryKeyValueStore::default();
        store.set("k", "v").expect("set");
        assert_eq!(store.get("k").expect("get"), Some("v".to_string()));
        assert_eq!(store.get("missing").expect("get"), None);
    }
}
