//! Persistent venue → acronym map.
//!
//! On disk the map is a JSON document:
//!
//! ```json
//! {
//!     "venues": { "International Conference on Software Engineering": "ICSE" },
//!     "unresolved": { "Workshop on Obscure Things": "Workshop on Obscure Things" }
//! }
//! ```
//!
//! A flat `{ "name": "acronym" }` object is accepted too; entries mapping a
//! name to itself are read as unresolved. Saving always writes the
//! structured form.

use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::normalize_venue;

/// Errors that can occur when loading or saving the acronym map
#[derive(Debug, Error)]
pub enum AcronymStoreError {
    #[error("Malformed acronym map {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct StructuredMap {
    #[serde(default)]
    venues: BTreeMap<String, String>,

    #[serde(default)]
    unresolved: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MapFile {
    Structured(StructuredMap),
    Flat(BTreeMap<String, String>),
}

/// Venue acronyms plus the names still waiting for one.
///
/// Keys are always stored in [`normalize_venue`] form.
#[derive(Debug, Default)]
pub struct AcronymStore {
    path: Option<PathBuf>,
    venues: BTreeMap<String, String>,
    unresolved: BTreeMap<String, String>,
    dirty: bool,
}

impl AcronymStore {
    /// An in-memory store that is never written anywhere
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the map at `path`. A missing file yields an empty store that
    /// will be created on the first [`flush`](Self::flush).
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, AcronymStoreError> {
        let path = path.into();
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No acronym map yet, starting empty");
                return Ok(Self {
                    path: Some(path),
                    ..Self::default()
                });
            }
            Err(e) => return Err(e.into()),
        };

        let parsed: MapFile =
            serde_json::from_str(&content).map_err(|e| AcronymStoreError::Malformed {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        let (venues, unresolved) = match parsed {
            MapFile::Structured(map) => (map.venues, map.unresolved),
            MapFile::Flat(map) => map.into_iter().partition(|(name, acronym)| name != acronym),
        };

        let mut store = Self {
            path: Some(path),
            ..Self::default()
        };
        for (name, acronym) in venues {
            store.load_entry(name, acronym, false);
        }
        for (name, _) in unresolved {
            store.load_entry(name.clone(), name, true);
        }

        tracing::debug!(
            venues = store.venues.len(),
            unresolved = store.unresolved.len(),
            "Loaded acronym map"
        );
        Ok(store)
    }

    fn load_entry(&mut self, name: String, acronym: String, unresolved: bool) {
        let key = normalize_venue(&name);
        if key.is_empty() || self.contains_key(&key) {
            tracing::warn!(venue = %name, "Duplicate acronym map entry after normalization, keeping the first");
            return;
        }
        if unresolved {
            self.unresolved.insert(key.clone(), key);
        } else {
            self.venues.insert(key, acronym.trim().to_string());
        }
    }

    fn contains_key(&self, key: &str) -> bool {
        self.venues.contains_key(key) || self.unresolved.contains_key(key)
    }

    /// Where the store is persisted, if anywhere
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Acronym for a venue: exact key match first, then case-insensitive.
    pub fn get(&self, name: &str) -> Option<&str> {
        let key = normalize_venue(name);
        if let Some(acronym) = self.venues.get(&key) {
            return Some(acronym.as_str());
        }
        self.venues
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(&key))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the venue is recorded as awaiting an acronym
    pub fn is_unresolved(&self, name: &str) -> bool {
        let key = normalize_venue(name);
        self.unresolved.contains_key(&key)
            || self.unresolved.keys().any(|k| k.eq_ignore_ascii_case(&key))
    }

    /// Record a venue with no known acronym. Returns `false` if the venue
    /// was already known (resolved or not).
    pub fn insert_unresolved(&mut self, name: &str) -> bool {
        let key = normalize_venue(name);
        if key.is_empty() || self.get(&key).is_some() || self.is_unresolved(&key) {
            return false;
        }
        self.unresolved.insert(key.clone(), key);
        self.dirty = true;
        true
    }

    /// Assign an acronym, moving the venue out of the unresolved set.
    /// Returns the acronym it replaced, if any.
    pub fn set(&mut self, name: &str, acronym: &str) -> Option<String> {
        let key = normalize_venue(name);
        self.unresolved.remove(&key);
        self.dirty = true;
        match self.venues.entry(key) {
            Entry::Occupied(mut e) => Some(e.insert(acronym.trim().to_string())),
            Entry::Vacant(e) => {
                e.insert(acronym.trim().to_string());
                None
            }
        }
    }

    /// Resolved entries, sorted by venue name
    pub fn venues(&self) -> impl Iterator<Item = (&str, &str)> {
        self.venues.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Venues awaiting an acronym, sorted
    pub fn unresolved(&self) -> impl Iterator<Item = &str> {
        self.unresolved.keys().map(|k| k.as_str())
    }

    /// Whether there are changes not yet flushed
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the map back if it changed. Returns whether a write happened.
    ///
    /// The document is written to a temporary file in the same directory and
    /// renamed over the target, so a crash never leaves a truncated map.
    pub fn flush(&mut self) -> Result<bool, AcronymStoreError> {
        let Some(path) = self.path.as_deref().filter(|_| self.dirty) else {
            return Ok(false);
        };

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)?;

        let doc = StructuredMap {
            venues: self.venues.clone(),
            unresolved: self.unresolved.clone(),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, &doc)?;
        tmp.write_all(b"\n")?;
        tmp.persist(path).map_err(|e| AcronymStoreError::Io(e.error))?;

        tracing::debug!(path = %path.display(), "Saved acronym map");
        self.dirty = false;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = AcronymStore::load(dir.path().join("none.json")).unwrap();
        assert_eq!(store.venues().count(), 0);
        assert!(!store.is_dirty());
    }

    #[test]
    fn test_malformed_file_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = AcronymStore::load(&path).unwrap_err();
        assert!(matches!(err, AcronymStoreError::Malformed { .. }));

        std::fs::write(&path, r#"{"venues": {"A": 3}}"#).unwrap();
        assert!(AcronymStore::load(&path).is_err());
    }

    #[test]
    fn test_flat_format_accepted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.json");
        std::fs::write(
            &path,
            r#"{
                "Proceedings of the International Conference on Software Engineering": "ICSE",
                "Workshop on Obscure Things": "Workshop on Obscure Things"
            }"#,
        )
        .unwrap();

        let store = AcronymStore::load(&path).unwrap();
        assert_eq!(
            store.get("International Conference on Software Engineering"),
            Some("ICSE")
        );
        assert!(store.is_unresolved("Workshop on Obscure Things"));
        assert_eq!(store.get("Workshop on Obscure Things"), None);
    }

    #[test]
    fn test_duplicate_keys_first_wins() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("map.json");
        std::fs::write(
            &path,
            r#"{"venues": {
                "45th Conference on Examples": "CE1",
                "46th Conference on Examples": "CE2"
            }}"#,
        )
        .unwrap();

        let store = AcronymStore::load(&path).unwrap();
        assert_eq!(store.venues().count(), 1);
        assert_eq!(store.get("Conference on Examples"), Some("CE1"));
    }

    #[test]
    fn test_case_insensitive_lookup() {
        let mut store = AcronymStore::empty();
        store.set("Symposium on Operating Systems Principles", "SOSP");
        assert_eq!(store.get("symposium on operating systems principles"), Some("SOSP"));
    }

    #[test]
    fn test_set_moves_unresolved() {
        let mut store = AcronymStore::empty();
        assert!(store.insert_unresolved("Workshop on Obscure Things"));
        assert!(!store.insert_unresolved("1st Workshop on Obscure Things"));

        assert_eq!(store.set("Workshop on Obscure Things", "WOT"), None);
        assert!(!store.is_unresolved("Workshop on Obscure Things"));
        assert_eq!(store.set("Workshop on Obscure Things", "WOOT"), Some("WOT".to_string()));
        assert_eq!(store.get("Workshop on Obscure Things"), Some("WOOT"));
    }

    #[test]
    fn test_flush_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("map.json");

        let mut store = AcronymStore::load(&path).unwrap();
        assert!(!store.flush().unwrap());

        store.set("International Conference on Software Engineering", "ICSE");
        store.insert_unresolved("Workshop on Obscure Things");
        assert!(store.flush().unwrap());
        assert!(!store.is_dirty());
        assert!(!store.flush().unwrap());

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            raw["venues"]["International Conference on Software Engineering"],
            "ICSE"
        );
        assert_eq!(
            raw["unresolved"]["Workshop on Obscure Things"],
            "Workshop on Obscure Things"
        );

        let reloaded = AcronymStore::load(&path).unwrap();
        assert_eq!(
            reloaded.get("International Conference on Software Engineering"),
            Some("ICSE")
        );
        assert!(reloaded.is_unresolved("Workshop on Obscure Things"));
    }

    #[test]
    fn test_empty_store_never_writes() {
        let mut store = AcronymStore::empty();
        store.set("X", "Y");
        assert!(!store.flush().unwrap());
    }
}
