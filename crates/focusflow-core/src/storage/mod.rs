pub mod account;
mod config;
pub mod database;
pub mod migrations;

pub use account::UserRecord;
pub use config::{Config, IntegrationsConfig, NotificationsConfig, ScheduleConfig};
pub use database::Database;

use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{ConfigError, StorageError};

/// Keys used in the durable store.
pub mod keys {
    /// User record with the embedded task collection.
    pub const USER: &str = "focusflow.user";
    /// Lifetime count of completed focus sessions.
    pub const COMPLETED_POMODOROS: &str = "focusflow.completed_pomodoros";
    /// Theme flag, independent of the account.
    pub const DARK_MODE: &str = "focusflow.dark_mode";
    /// Serialized session engine, written by front ends that exit between commands.
    pub const TIMER_ENGINE: &str = "focusflow.timer_engine";
}

/// Durable string key-value store.
///
/// One record per logical key; values are JSON or plain scalars.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

/// In-process store. Nothing survives the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that rejects every write, for exercising best-effort persistence.
    pub fn read_only() -> Self {
        Self {
            entries: HashMap::new(),
            read_only: true,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::Unavailable(format!("cannot write '{key}'")));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        if self.read_only {
            return Err(StorageError::Unavailable(format!("cannot remove '{key}'")));
        }
        self.entries.remove(key);
        Ok(())
    }
}

/// Returns the data directory, creating it if needed.
///
/// `FOCUSFLOW_DATA_DIR` wins when set; otherwise `~/.config/focusflow[-dev]/`
/// based on `FOCUSFLOW_ENV` (set to `dev` for the development directory).
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("FOCUSFLOW_DATA_DIR") {
        Some(explicit) if !explicit.is_empty() => PathBuf::from(explicit),
        _ => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("FOCUSFLOW_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("focusflow-dev")
            } else {
                base_dir.join("focusflow")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_roundtrip() {
        let mut store = MemoryStore::new();
        assert!(store.get("a").unwrap().is_none());
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        store.remove("a").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn read_only_store_rejects_writes() {
        let mut store = MemoryStore::read_only();
        assert!(matches!(
            store.set("a", "1"),
            Err(StorageError::Unavailable(_))
        ));
        assert!(store.get("a").unwrap().is_none());
    }
}
