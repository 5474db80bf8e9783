//! Key-value persistence substrate.
//!
//! Values are opaque strings. The file-backed store keeps one file per key in
//! a data directory and rewrites it whole on every `set`; there is no locking
//! between processes, so the last writer wins.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::warn;

use crate::error::{ChatError, Result};

/// Full conversation mapping, JSON-encoded.
pub const HISTORY_KEY: &str = "conversation-history";
/// Credential used by the most recent send or save.
pub const LAST_CREDENTIAL_KEY: &str = "last-used-credential";
/// Credential entered the first time a shared link was opened.
pub const SHARED_CREDENTIAL_KEY: &str = "shared-link-credential";

/// Storage abstraction for persisted string values.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// File-backed store: `<base_dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileKeyValueStore {
    base_dir: PathBuf,
}

impl FileKeyValueStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", normalize_key(key)))
    }
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match fs::read(&path) {
            Ok(bytes) => match String::from_utf8(bytes) {
                Ok(data) => Ok(Some(data)),
                Err(err) => {
                    warn!(key, path = %path.display(), "stored value is not UTF-8, reading it lossily");
                    Ok(Some(String::from_utf8_lossy(err.as_bytes()).into_owned()))
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(ChatError::storage(key, err)),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        fs::create_dir_all(&self.base_dir).map_err(|e| ChatError::storage(key, e))?;
        fs::write(&path, value).map_err(|e| ChatError::storage(key, e))?;
        // Credentials live next to history, so keep every file owner-only.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))
                .map_err(|e| ChatError::storage(key, e))?;
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(ChatError::storage(key, err)),
        }
    }
}

/// In-process store, used by tests and for throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|_| ChatError::storage(key, "store lock poisoned"))?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| ChatError::storage(key, "store lock poisoned"))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|_| ChatError::storage(key, "store lock poisoned"))?;
        values.remove(key);
        Ok(())
    }
}

fn normalize_key(key: &str) -> String {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return "default".to_string();
    }
    trimmed
        .chars()
        .map(|ch| {
            let lower = ch.to_ascii_lowercase();
            if lower.is_ascii_alphanumeric() || lower == '-' || lower == '.' {
                lower
            } else {
                '-'
            }
        })
        .collect()
}
