//! External validation cache.
//!
//! A separate runtime process may record which tests had their BDD/PBT
//! heuristics validated during an actual run. This module reads that JSON
//! file once at startup; the static analysis only ever consumes it to
//! suppress the corresponding hints. Absence or corruption of the file
//! degrades to "nothing validated", never to an error.

use std::collections::HashMap;
use std::path::Path;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Deserialize;
use tracing::warn;

use crate::errors::CacheError;

/// On-disk shape of the cache file.
#[derive(Debug, Default, Deserialize)]
struct CacheFile {
    #[serde(default)]
    tests_with_semantic_validation: HashMap<String, HashMap<String, HeuristicEntry>>,
}

#[derive(Debug, Default, Deserialize)]
struct HeuristicEntry {
    #[serde(default)]
    validated: bool,
}

/// Validated heuristics per test identifier.
#[derive(Debug, Default)]
pub struct ValidationCache {
    validated: FxHashMap<String, FxHashSet<String>>,
}

impl ValidationCache {
    /// An empty cache: nothing externally validated.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read the cache file, degrading to an empty cache on any failure.
    pub fn load(path: &Path) -> Self {
        match Self::read(path) {
            Ok(cache) => cache,
            Err(CacheError::Io { .. }) if !path.exists() => Self::empty(),
            Err(e) => {
                warn!("failed to load validation cache: {e}");
                Self::empty()
            }
        }
    }

    fn read(path: &Path) -> Result<Self, CacheError> {
        let raw = std::fs::read_to_string(path).map_err(|source| CacheError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let file: CacheFile =
            serde_json::from_str(&raw).map_err(|e| CacheError::Malformed {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        let mut validated: FxHashMap<String, FxHashSet<String>> = FxHashMap::default();
        for (test_id, heuristics) in file.tests_with_semantic_validation {
            let entry = validated.entry(test_id).or_default();
            for (heuristic, status) in heuristics {
                if status.validated {
                    entry.insert(heuristic);
                }
            }
        }
        Ok(Self { validated })
    }

    /// Whether `heuristic` (e.g. "bdd", "pbt") was validated for `test_id`.
    pub fn is_validated(&self, test_id: &str, heuristic: &str) -> bool {
        self.validated
            .get(test_id)
            .is_some_and(|set| set.contains(heuristic))
    }

    pub fn is_empty(&self) -> bool {
        self.validated.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let cache = ValidationCache::load(Path::new("/nonexistent/cache.json"));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_corrupt_file_degrades_to_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "not json {").unwrap();

        let cache = ValidationCache::load(&path);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_validated_flags() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(
            &path,
            r#"{
                "tests_with_semantic_validation": {
                    "tests/test_api.py::test_create": {
                        "bdd": {"validated": true},
                        "pbt": {"validated": false}
                    }
                }
            }"#,
        )
        .unwrap();

        let cache = ValidationCache::load(&path);
        assert!(cache.is_validated("tests/test_api.py::test_create", "bdd"));
        assert!(!cache.is_validated("tests/test_api.py::test_create", "pbt"));
        assert!(!cache.is_validated("tests/test_api.py::test_other", "bdd"));
    }
}
