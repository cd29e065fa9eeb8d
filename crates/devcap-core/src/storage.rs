// ── Classifier index persistence ──
//
// Indices are keyed by `<PREFIX>_DEVICEIDS`. The engine saves them after a
// build and reuses them on the next start when every family is present.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use crate::classifier::ClassifierIndex;
use crate::error::CoreError;

/// Load/save collaborator for classifier indices.
pub trait Storage: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<ClassifierIndex>, CoreError>;

    fn save(&self, key: &str, index: &ClassifierIndex) -> Result<(), CoreError>;

    fn clear(&self) -> Result<(), CoreError>;
}

// ── In-memory ───────────────────────────────────────────────────────

/// Process-local storage. Cheap to clone; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<DashMap<String, ClassifierIndex>>,
}

impl MemoryStorage {
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

impl Storage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<ClassifierIndex>, CoreError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn save(&self, key: &str, index: &ClassifierIndex) -> Result<(), CoreError> {
        self.entries.insert(key.to_owned(), index.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        self.entries.clear();
        Ok(())
    }
}

// ── File-backed ─────────────────────────────────────────────────────

/// One JSON file per key under `dir`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Creates the directory if it does not exist yet.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<ClassifierIndex>, CoreError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&path)?;
        let index = serde_json::from_str(&raw).map_err(|e| CoreError::Storage {
            message: format!("{}: {e}", path.display()),
        })?;
        Ok(Some(index))
    }

    fn save(&self, key: &str, index: &ClassifierIndex) -> Result<(), CoreError> {
        let path = self.path_for(key);
        let raw = serde_json::to_string(index).map_err(|e| CoreError::Storage {
            message: e.to_string(),
        })?;
        fs::write(&path, raw)?;
        debug!(path = %path.display(), entries = index.len(), "saved classifier index");
        Ok(())
    }

    fn clear(&self) -> Result<(), CoreError> {
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}
