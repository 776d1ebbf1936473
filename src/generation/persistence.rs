//! Persistence collaborator

use anyhow::{bail, Result};
use async_trait::async_trait;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

/// What persistence did with a write request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOutcome {
    /// `false` when the target existed and overwriting was not allowed
    pub written: bool,
}

/// Stores fully rendered file content
#[async_trait]
pub trait Persistence: Send + Sync {
    async fn write(&self, path: &Path, content: &str, overwrite: bool) -> Result<WriteOutcome>;
}

/// In-memory persistence keyed by path
///
/// Keeps write order. Paths registered with [`MemoryPersistence::fail_on`]
/// return an error instead of storing anything.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    files: RwLock<IndexMap<PathBuf, String>>,
    failing: RwLock<HashSet<PathBuf>>,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates `path` as if an earlier run had written it
    pub fn seed(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into(), content.into());
    }

    /// Makes every write to `path` fail
    pub fn fail_on(&self, path: impl Into<PathBuf>) {
        self.failing
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(path.into());
    }

    pub fn get(&self, path: impl AsRef<Path>) -> Option<String> {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path.as_ref())
            .cloned()
    }

    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        self.get(path).is_some()
    }

    /// Stored paths in first-write order
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.files.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Persistence for MemoryPersistence {
    async fn write(&self, path: &Path, content: &str, overwrite: bool) -> Result<WriteOutcome> {
        if self
            .failing
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(path)
        {
            bail!("write to {} rejected", path.display());
        }

        let mut files = self.files.write().unwrap_or_else(PoisonError::into_inner);
        if !overwrite && files.contains_key(path) {
            return Ok(WriteOutcome { written: false });
        }
        files.insert(path.to_path_buf(), content.to_string());
        Ok(WriteOutcome { written: true })
    }
}
