// Key-value session storage

use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// Blob store used to snapshot the pet between runs
pub trait SessionStore {
    fn save(&mut self, key: &str, blob: &[u8]) -> Result<(), PersistError>;

    /// `Ok(None)` when nothing was stored under `key`
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistError>;
}

/// One file per key inside a directory
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self, PersistError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(PersistError::InvalidKey(key.to_string()));
        }
        Ok(self.base_dir.join(format!("{}.json", key)))
    }
}

impl SessionStore for FileStore {
    fn save(&mut self, key: &str, blob: &[u8]) -> Result<(), PersistError> {
        let path = self.path_for(key)?;
        let temp_path = path.with_extension("json.tmp");

        // Write then rename so a crash never leaves a half-written snapshot
        fs::write(&temp_path, blob)?;
        fs::rename(&temp_path, &path)?;

        debug!("Saved {}", path.display());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistError> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(&path)?))
    }
}

/// In-process store; contents vanish with it
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SessionStore for MemoryStore {
    fn save(&mut self, key: &str, blob: &[u8]) -> Result<(), PersistError> {
        self.entries.insert(key.to_string(), blob.to_vec());
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistError> {
        Ok(self.entries.get(key).cloned())
    }
}
