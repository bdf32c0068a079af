// ABOUTME: On-disk state for incremental project passes
// ABOUTME: A path -> SHA-256 map plus the Holoforms last generated for each path

use holoform_core::{Holoform, HoloformError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Hex SHA-256 of `content`.
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

/// Read a JSON map, treating a missing or unreadable file as empty.
fn load_map<V: DeserializeOwned>(path: &Path) -> BTreeMap<String, V> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No state file at {}, starting empty", path.display());
            return BTreeMap::new();
        }
        Err(e) => {
            warn!("Failed to read {}: {}; starting empty", path.display(), e);
            return BTreeMap::new();
        }
    };

    match serde_json::from_str(&content) {
        Ok(map) => map,
        Err(e) => {
            warn!("Ignoring corrupt state file {}: {}", path.display(), e);
            BTreeMap::new()
        }
    }
}

/// Write `value` as pretty JSON through a temp file and a rename.
fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let data = serde_json::to_vec_pretty(value)?;
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, data)?;
    fs::rename(&temp_path, path).map_err(|e| {
        HoloformError::Cache(format!("Failed to replace {}: {}", path.display(), e))
    })?;
    Ok(())
}

/// Relative path -> content hash, as of the last successful parse.
#[derive(Debug, Clone)]
pub struct FileHashCache {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileHashCache {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = load_map(&path);
        debug!("Loaded {} cache entries from {}", entries.len(), path.display());
        Self { path, entries }
    }

    pub fn is_fresh(&self, relative_path: &str, hash: &str) -> bool {
        self.entries.get(relative_path).is_some_and(|h| h == hash)
    }

    pub fn get(&self, relative_path: &str) -> Option<&str> {
        self.entries.get(relative_path).map(String::as_str)
    }

    pub fn insert(&mut self, relative_path: String, hash: String) {
        self.entries.insert(relative_path, hash);
    }

    pub fn remove(&mut self, relative_path: &str) -> bool {
        self.entries.remove(relative_path).is_some()
    }

    /// Drop every entry whose path is not in `present`; returns the dropped paths.
    pub fn retain_present(&mut self, present: &HashSet<String>) -> Vec<String> {
        let stale: Vec<String> = self
            .entries
            .keys()
            .filter(|k| !present.contains(*k))
            .cloned()
            .collect();
        for key in &stale {
            self.entries.remove(key);
        }
        stale
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self) -> Result<()> {
        write_atomic(&self.path, &self.entries)?;
        debug!("Saved {} cache entries to {}", self.entries.len(), self.path.display());
        Ok(())
    }
}

/// Relative path -> Holoforms generated from that file.
#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
    records: BTreeMap<String, Vec<Holoform>>,
}

impl RecordStore {
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = load_map(&path);
        Self { path, records }
    }

    pub fn get(&self, relative_path: &str) -> Option<&[Holoform]> {
        self.records.get(relative_path).map(Vec::as_slice)
    }

    pub fn contains(&self, relative_path: &str) -> bool {
        self.records.contains_key(relative_path)
    }

    /// Replace a file's Holoforms wholesale.
    pub fn replace(&mut self, relative_path: String, holoforms: Vec<Holoform>) {
        self.records.insert(relative_path, holoforms);
    }

    pub fn remove(&mut self, relative_path: &str) -> bool {
        self.records.remove(relative_path).is_some()
    }

    pub fn retain_present(&mut self, present: &HashSet<String>) -> Vec<String> {
        let stale: Vec<String> = self
            .records
            .keys()
            .filter(|k| !present.contains(*k))
            .cloned()
            .collect();
        for key in &stale {
            self.records.remove(key);
        }
        stale
    }

    pub fn save(&self) -> Result<()> {
        write_atomic(&self.path, &self.records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn hash_is_stable_hex() {
        let hash = content_hash(b"def f():\n    pass\n");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, content_hash(b"def f():\n    pass\n"));
        assert_ne!(hash, content_hash(b"def g():\n    pass\n"));
    }

    #[test]
    fn cache_survives_reload() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".holoform_cache.json");

        let mut cache = FileHashCache::load(&path);
        assert!(cache.is_empty());
        cache.insert("a.py".to_string(), "abc".to_string());
        cache.save().unwrap();
        assert!(!path.with_extension("tmp").exists());

        let reloaded = FileHashCache::load(&path);
        assert!(reloaded.is_fresh("a.py", "abc"));
        assert!(!reloaded.is_fresh("a.py", "def"));
        assert_eq!(reloaded.get("missing.py"), None);
    }

    #[test]
    fn corrupt_cache_starts_empty() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".holoform_cache.json");
        fs::write(&path, "{not json").unwrap();
        assert!(FileHashCache::load(&path).is_empty());
    }

    #[test]
    fn retain_drops_vanished_paths() {
        let tmp = TempDir::new().unwrap();
        let mut cache = FileHashCache::load(tmp.path().join("c.json"));
        cache.insert("keep.py".to_string(), "1".to_string());
        cache.insert("gone.py".to_string(), "2".to_string());

        let present: HashSet<String> = ["keep.py".to_string()].into_iter().collect();
        assert_eq!(cache.retain_present(&present), vec!["gone.py".to_string()]);
        assert_eq!(cache.len(), 1);
    }
}
