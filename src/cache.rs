// Documentation cache keyed by module path and file hash

use crate::error::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, warn};

/// Name of the cache file inside the cache directory
pub const CACHE_FILE_NAME: &str = "cache.json";

/// One cached documentation entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub hash: String,
    pub documentation: String,
    pub file_path: PathBuf,
}

/// Cache statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total_entries: usize,
    pub cache_file: PathBuf,
}

/// JSON-backed cache of generated documentation.
///
/// An entry is valid while the hash of its source file (content, mtime and
/// size) is unchanged. The file is rewritten after every change.
#[derive(Debug)]
pub struct DocumentationCache {
    cache_file: PathBuf,
    entries: BTreeMap<String, CacheEntry>,
}

impl DocumentationCache {
    /// Open the cache in `dir`; a missing or unreadable file gives an empty cache
    pub fn open(dir: &Path) -> Self {
        let cache_file = dir.join(CACHE_FILE_NAME);
        let entries = match std::fs::read_to_string(&cache_file) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!("Ignoring corrupt cache {}: {}", cache_file.display(), e);
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        debug!("Loaded {} cache entries from {}", entries.len(), cache_file.display());
        Self {
            cache_file,
            entries,
        }
    }

    /// SHA-256 over file bytes, modification time and size
    pub fn file_hash(path: &Path) -> Option<String> {
        let bytes = std::fs::read(path).ok()?;
        let metadata = std::fs::metadata(path).ok()?;
        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_nanos())
            .unwrap_or(0);

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        hasher.update(mtime.to_le_bytes());
        hasher.update(metadata.len().to_le_bytes());
        Some(format!("{:x}", hasher.finalize()))
    }

    /// Whether `key` has an entry matching the current state of `file`
    pub fn is_cached(&self, key: &str, file: &Path) -> bool {
        match (self.entries.get(key), Self::file_hash(file)) {
            (Some(entry), Some(hash)) => !entry.hash.is_empty() && entry.hash == hash,
            _ => false,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|e| e.documentation.as_str())
    }

    /// Cached documentation for `key`, if still valid for `file`
    pub fn lookup(&self, key: &str, file: &Path) -> Option<String> {
        if self.is_cached(key, file) {
            self.get(key).map(str::to_string)
        } else {
            None
        }
    }

    /// Store documentation for `key` and persist the cache
    pub fn store(&mut self, key: &str, file: &Path, documentation: &str) -> Result<()> {
        let hash = Self::file_hash(file).unwrap_or_default();
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                hash,
                documentation: documentation.to_string(),
                file_path: file.to_path_buf(),
            },
        );
        self.save()
    }

    /// Remove one entry, or everything when `key` is `None`
    pub fn clear(&mut self, key: Option<&str>) -> Result<()> {
        match key {
            Some(key) => {
                self.entries.remove(key);
            }
            None => self.entries.clear(),
        }
        self.save()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            total_entries: self.entries.len(),
            cache_file: self.cache_file.clone(),
        }
    }

    fn save(&self) -> Result<()> {
        if let Some(dir) = self.cache_file.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let json = serde_json::to_string_pretty(&self.entries)?;
        std::fs::write(&self.cache_file, json)?;
        Ok(())
    }
}
