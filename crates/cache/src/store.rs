//! File-backed result cache

use crate::entry::CacheEntry;
use crate::keys::cache_key;
use crate::kind::CacheKind;
use chrono::{DateTime, Utc};
use repro_core::{Error, Result};
use repro_utils::write_json_atomic;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Entry counts per kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub root: PathBuf,
    pub entries: BTreeMap<CacheKind, usize>,
}

impl CacheStats {
    pub fn total(&self) -> usize {
        self.entries.values().sum()
    }

    pub fn count(&self, kind: CacheKind) -> usize {
        self.entries.get(&kind).copied().unwrap_or(0)
    }
}

/// Cache rooted at a directory, one subdirectory per kind
#[derive(Debug, Clone)]
pub struct ResultCache {
    root: PathBuf,
}

impl ResultCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Location of the entry for `identifier`, whether or not it exists
    pub fn entry_path(&self, kind: CacheKind, identifier: &str) -> PathBuf {
        self.root
            .join(kind.dir_name())
            .join(format!("{}.json", cache_key(kind, identifier)))
    }

    /// Fresh payload for `identifier`, deserialized as `T`
    pub fn get<T: DeserializeOwned>(&self, kind: CacheKind, identifier: &str) -> Option<T> {
        let value = self.get_value(kind, identifier)?;
        match serde_json::from_value(value) {
            Ok(payload) => Some(payload),
            Err(e) => {
                tracing::warn!(kind = %kind, identifier, error = %e, "cached payload has unexpected shape, ignoring");
                None
            }
        }
    }

    /// Fresh raw payload for `identifier`
    pub fn get_value(&self, kind: CacheKind, identifier: &str) -> Option<serde_json::Value> {
        self.get_value_at(kind, identifier, Utc::now())
    }

    /// Raw payload if the entry is fresh at `now`
    pub fn get_value_at(
        &self,
        kind: CacheKind,
        identifier: &str,
        now: DateTime<Utc>,
    ) -> Option<serde_json::Value> {
        let path = self.entry_path(kind, identifier);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(kind = %kind, identifier, "cache miss");
                return None;
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "failed to read cache entry");
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "corrupt cache entry, treating as miss");
                return None;
            }
        };

        if entry.kind != kind || entry.identifier != identifier {
            tracing::warn!(path = %path.display(), "cache entry does not belong to this key, ignoring");
            return None;
        }

        if !entry.is_valid_at(now) {
            tracing::debug!(kind = %kind, identifier, cached_at = %entry.cached_at, "cache entry expired");
            return None;
        }

        tracing::debug!(kind = %kind, identifier, "cache hit");
        Some(entry.payload)
    }

    /// Store `payload`; failures are logged, never returned
    pub fn set<T: Serialize + ?Sized>(&self, kind: CacheKind, identifier: &str, payload: &T) {
        self.set_with_timestamp(kind, identifier, payload, Utc::now());
    }

    /// Store `payload` as if it had been cached at `cached_at`
    pub fn set_with_timestamp<T: Serialize + ?Sized>(
        &self,
        kind: CacheKind,
        identifier: &str,
        payload: &T,
        cached_at: DateTime<Utc>,
    ) {
        if let Err(e) = self.try_set(kind, identifier, payload, cached_at) {
            tracing::warn!(kind = %kind, identifier, error = %e, "failed to write cache entry");
        }
    }

    fn try_set<T: Serialize + ?Sized>(
        &self,
        kind: CacheKind,
        identifier: &str,
        payload: &T,
        cached_at: DateTime<Utc>,
    ) -> Result<()> {
        let entry = CacheEntry {
            kind,
            key: cache_key(kind, identifier),
            identifier: identifier.to_string(),
            payload: serde_json::to_value(payload)?,
            cached_at,
        };
        write_json_atomic(&self.entry_path(kind, identifier), &entry)?;
        tracing::debug!(kind = %kind, identifier, "cached");
        Ok(())
    }

    /// Remove entries of one kind, or all kinds; returns how many were removed
    pub fn clear(&self, kind: Option<CacheKind>) -> Result<usize> {
        let kinds = match kind {
            Some(kind) => vec![kind],
            None => CacheKind::ALL.to_vec(),
        };

        let mut removed = 0;
        for kind in kinds {
            for path in self.entry_files(kind)? {
                fs::remove_file(&path).map_err(|e| Error::file_system(&path, "remove cache entry", e))?;
                removed += 1;
            }
        }
        tracing::info!(removed, "cache cleared");
        Ok(removed)
    }

    /// Entry counts per kind plus the cache root
    pub fn stats(&self) -> Result<CacheStats> {
        let mut entries = BTreeMap::new();
        for kind in CacheKind::ALL {
            entries.insert(kind, self.entry_files(kind)?.len());
        }
        Ok(CacheStats {
            root: self.root.clone(),
            entries,
        })
    }

    fn entry_files(&self, kind: CacheKind) -> Result<Vec<PathBuf>> {
        let dir = self.root.join(kind.dir_name());
        let read_dir = match fs::read_dir(&dir) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::file_system(&dir, "list cache directory", e)),
        };

        let mut files = Vec::new();
        for entry in read_dir {
            let path = entry
                .map_err(|e| Error::file_system(&dir, "list cache directory", e))?
                .path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }
}
