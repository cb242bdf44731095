//! Ideal-target override storage
//!
//! Overrides live in a single durable entry keyed by [`OVERRIDES_KEY`]:
//!
//! ```json
//! {
//!   "version": 1,
//!   "overrides": {
//!     "es": { "searchVolume": 200, "competitors": 900, "price": 9.99, "royalties": 3.2 }
//!   }
//! }
//! ```
//!
//! Reads never fail. A missing entry, unreadable storage, a payload over
//! [`MAX_PERSISTED_BYTES`], a version mismatch or any invalid override all
//! mean "no overrides". Every [`ConfigStore::config`] call re-reads storage;
//! there is no cache in between.
//!
//! Writes return a [`ConfigError`] so callers can decide how to tell the user.

use super::targets::{default_targets, normalize_marketplace_id, IdealTargets};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Namespaced, version-tagged storage key for the override mapping
pub const OVERRIDES_KEY: &str = "marketscore.ideal-targets.v1";

/// Envelope version written alongside the overrides
pub const OVERRIDES_VERSION: u32 = 1;

/// Persisted payloads larger than this are ignored
pub const MAX_PERSISTED_BYTES: usize = 64 * 1024;

/// Marketplace id -> complete override record
pub type Overrides = BTreeMap<String, IdealTargets>;

/// Errors raised by a raw key-value backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage is read-only: cannot write '{0}'")]
    ReadOnly(String),
}

/// Errors raised when persisting overrides
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("invalid ideal targets for '{marketplace}': {reason}")]
    InvalidTargets { marketplace: String, reason: String },
}

/// Minimal synchronous key-value backend
pub trait KeyValueStore {
    /// Read the value stored under `key` (`Ok(None)` when absent)
    fn read(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the value stored under `key`
    fn write(&self, key: &str, value: &str) -> Result<(), StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).write(key, value)
    }
}

/// One JSON file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Default directory: `<config dir>/marketscore`, or `./.marketscore`
    /// when the platform has no config directory.
    pub fn default_dir() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join("marketscore"))
            .unwrap_or_else(|| PathBuf::from(".marketscore"))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing a key
    pub fn path_for(&self, key: &str) -> PathBuf {
        let file_name: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_name}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);

        // Write to temp file first, then rename (atomic on POSIX)
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, value)?;
        fs::rename(&tmp_path, &path)?;
        Ok(())
    }
}

/// In-memory backend for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
    read_only: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose writes always fail
    pub fn read_only() -> Self {
        Self {
            entries: DashMap::new(),
            read_only: true,
        }
    }

    /// Seed a raw value, bypassing validation
    pub fn insert_raw(&self, key: &str, value: impl Into<String>) {
        self.entries.insert(key.to_string(), value.into());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.raw(key))
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.read_only {
            return Err(StoreError::ReadOnly(key.to_string()));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedOverrides {
    version: u32,
    overrides: Overrides,
}

type ChangeListener = Box<dyn Fn(&str)>;

/// Resolves per-marketplace ideal targets (override, else compiled-in default)
pub struct ConfigStore<S: KeyValueStore> {
    storage: S,
    listeners: Vec<ChangeListener>,
}

impl<S: KeyValueStore> ConfigStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            listeners: Vec::new(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Register a callback run with the marketplace id after every
    /// successful override change, so dependent views can re-derive scores.
    pub fn with_change_listener(mut self, listener: impl Fn(&str) + 'static) -> Self {
        self.listeners.push(Box::new(listener));
        self
    }

    /// Read all overrides from storage (empty on any defect)
    pub fn load_overrides(&self) -> Overrides {
        let raw = match self.storage.read(OVERRIDES_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!("No ideal-target overrides stored, using defaults");
                return Overrides::new();
            }
            Err(e) => {
                warn!("Failed to read ideal-target overrides: {}", e);
                return Overrides::new();
            }
        };

        match parse_overrides(&raw) {
            Ok(overrides) => overrides,
            Err(reason) => {
                warn!("Ignoring stored ideal-target overrides: {}", reason);
                Overrides::new()
            }
        }
    }

    /// Serialize and write the complete override mapping
    pub fn save_overrides(&self, overrides: &Overrides) -> Result<(), ConfigError> {
        let mut normalized = Overrides::new();
        for (id, targets) in overrides {
            let id = normalize_marketplace_id(id);
            validate_override(&id, targets)?;
            normalized.insert(id, *targets);
        }

        let persisted = PersistedOverrides {
            version: OVERRIDES_VERSION,
            overrides: normalized,
        };
        let payload = serde_json::to_string_pretty(&persisted)?;
        self.storage.write(OVERRIDES_KEY, &payload)?;
        debug!("Saved {} ideal-target override(s)", persisted.overrides.len());
        Ok(())
    }

    /// Compiled-in anchors for a marketplace
    pub fn default_config(&self, marketplace: &str) -> IdealTargets {
        default_targets(marketplace)
    }

    /// Active anchors: the override when present, else the default
    pub fn config(&self, marketplace: &str) -> IdealTargets {
        let id = normalize_marketplace_id(marketplace);
        self.load_overrides()
            .get(&id)
            .copied()
            .unwrap_or_else(|| default_targets(&id))
    }

    pub fn has_override(&self, marketplace: &str) -> bool {
        let id = normalize_marketplace_id(marketplace);
        self.load_overrides().contains_key(&id)
    }

    /// Replace the override for one marketplace
    pub fn set_override(&self, marketplace: &str, targets: IdealTargets) -> Result<(), ConfigError> {
        let id = normalize_marketplace_id(marketplace);
        validate_override(&id, &targets)?;

        let mut overrides = self.load_overrides();
        overrides.insert(id.clone(), targets);
        self.save_overrides(&overrides)?;

        info!("Saved ideal-target override for '{}'", id);
        self.notify(&id);
        Ok(())
    }

    /// Drop the override for one marketplace and persist the result
    pub fn restore_default(&self, marketplace: &str) -> Result<(), ConfigError> {
        let id = normalize_marketplace_id(marketplace);
        let mut overrides = self.load_overrides();
        let removed = overrides.remove(&id).is_some();
        self.save_overrides(&overrides)?;

        if removed {
            info!("Restored default ideal targets for '{}'", id);
        } else {
            debug!("No override stored for '{}', defaults already active", id);
        }
        self.notify(&id);
        Ok(())
    }

    fn notify(&self, marketplace: &str) {
        for listener in &self.listeners {
            listener(marketplace);
        }
    }
}

impl ConfigStore<MemoryStore> {
    /// Isolated store backed by memory
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }
}

fn validate_override(id: &str, targets: &IdealTargets) -> Result<(), ConfigError> {
    if id.is_empty() {
        return Err(ConfigError::InvalidTargets {
            marketplace: id.to_string(),
            reason: "marketplace id is empty".to_string(),
        });
    }
    targets
        .validate()
        .map_err(|reason| ConfigError::InvalidTargets {
            marketplace: id.to_string(),
            reason,
        })
}

fn parse_overrides(raw: &str) -> Result<Overrides, String> {
    if raw.len() > MAX_PERSISTED_BYTES {
        return Err(format!(
            "payload is {} bytes (limit {})",
            raw.len(),
            MAX_PERSISTED_BYTES
        ));
    }

    let persisted: PersistedOverrides =
        serde_json::from_str(raw).map_err(|e| format!("malformed payload: {e}"))?;

    if persisted.version != OVERRIDES_VERSION {
        return Err(format!(
            "unsupported version {} (expected {})",
            persisted.version, OVERRIDES_VERSION
        ));
    }

    let mut overrides = Overrides::new();
    for (id, targets) in persisted.overrides {
        let id = normalize_marketplace_id(&id);
        if id.is_empty() {
            return Err("override with empty marketplace id".to_string());
        }
        targets.validate().map_err(|reason| format!("{id}: {reason}"))?;
        overrides.insert(id, targets);
    }
    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn es_override() -> IdealTargets {
        IdealTargets::new(200.0, 900.0, 9.99, 3.2)
    }

    #[test]
    fn test_config_defaults_without_storage() {
        let store = ConfigStore::in_memory();
        assert!(store.load_overrides().is_empty());
        assert_eq!(store.config("us"), store.default_config("us"));
    }

    #[test]
    fn test_set_override_replaces_default() {
        let store = ConfigStore::in_memory();
        store.set_override("ES", es_override()).unwrap();
        assert_eq!(store.config("es"), es_override());
        assert!(store.has_override("es"));
        // Other marketplaces untouched
        assert_eq!(store.config("us"), store.default_config("us"));
    }

    #[test]
    fn test_restore_default_removes_override() {
        let store = ConfigStore::in_memory();
        store.set_override("es", es_override()).unwrap();
        store.restore_default("es").unwrap();
        assert_eq!(store.config("es"), store.default_config("es"));
        assert!(!store.has_override("es"));
    }

    #[test]
    fn test_restore_default_without_override_is_ok() {
        let store = ConfigStore::in_memory();
        store.restore_default("fr").unwrap();
        assert_eq!(store.config("fr"), store.default_config("fr"));
    }

    #[test]
    fn test_corrupt_payload_means_no_overrides() {
        let store = ConfigStore::in_memory();
        store.storage().insert_raw(OVERRIDES_KEY, "{ not json");
        assert!(store.load_overrides().is_empty());
        assert_eq!(store.config("us"), store.default_config("us"));
    }

    #[test]
    fn test_wrong_version_means_no_overrides() {
        let store = ConfigStore::in_memory();
        store.storage().insert_raw(
            OVERRIDES_KEY,
            r#"{"version":2,"overrides":{"us":{"searchVolume":1,"competitors":1,"price":1,"royalties":1}}}"#,
        );
        assert!(store.load_overrides().is_empty());
    }

    #[test]
    fn test_incomplete_override_means_no_overrides() {
        let store = ConfigStore::in_memory();
        store.storage().insert_raw(
            OVERRIDES_KEY,
            r#"{"version":1,"overrides":{"us":{"searchVolume":1,"price":1}}}"#,
        );
        assert!(store.load_overrides().is_empty());
    }

    #[test]
    fn test_negative_override_means_no_overrides() {
        let store = ConfigStore::in_memory();
        store.storage().insert_raw(
            OVERRIDES_KEY,
            r#"{"version":1,"overrides":{"us":{"searchVolume":-5,"competitors":1,"price":1,"royalties":1}}}"#,
        );
        assert!(store.load_overrides().is_empty());
    }

    #[test]
    fn test_oversized_payload_is_ignored() {
        let store = ConfigStore::in_memory();
        let padding = " ".repeat(MAX_PERSISTED_BYTES + 1);
        store.storage().insert_raw(
            OVERRIDES_KEY,
            format!(
                r#"{{"version":1,"overrides":{{"us":{{"searchVolume":1,"competitors":1,"price":1,"royalties":1}}}}}}{padding}"#
            ),
        );
        assert!(store.load_overrides().is_empty());
    }

    #[test]
    fn test_write_failure_is_reported() {
        let store = ConfigStore::new(MemoryStore::read_only());
        let err = store.set_override("us", es_override()).unwrap_err();
        assert!(matches!(err, ConfigError::Storage(StoreError::ReadOnly(_))));
        // Reads still work and fall back to defaults
        assert_eq!(store.config("us"), store.default_config("us"));
    }

    #[test]
    fn test_invalid_override_is_rejected() {
        let store = ConfigStore::in_memory();
        let err = store
            .set_override("us", IdealTargets::new(100.0, -1.0, 10.0, 3.0))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTargets { .. }));
        let err = store.set_override("  ", es_override()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidTargets { .. }));
        assert!(store.load_overrides().is_empty());
    }

    #[test]
    fn test_change_listener_fires_after_success_only() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let store = ConfigStore::in_memory()
            .with_change_listener(move |id| sink.borrow_mut().push(id.to_string()));

        store.set_override("ES", es_override()).unwrap();
        store.restore_default("es").unwrap();
        let _ = store.set_override("es", IdealTargets::new(f64::NAN, 1.0, 1.0, 1.0));

        assert_eq!(*seen.borrow(), vec!["es".to_string(), "es".to_string()]);
    }

    #[test]
    fn test_saved_payload_is_version_tagged() {
        let store = ConfigStore::in_memory();
        store.set_override("us", es_override()).unwrap();
        let raw = store.storage().raw(OVERRIDES_KEY).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["overrides"]["us"]["competitors"], 900.0);
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(FileStore::new(dir.path()));
        store.set_override("es", es_override()).unwrap();

        let reopened = ConfigStore::new(FileStore::new(dir.path()));
        assert_eq!(reopened.config("es"), es_override());
        assert!(dir.path().join("marketscore.ideal-targets.v1.json").exists());
    }

    #[test]
    fn test_file_store_missing_dir_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("does-not-exist"));
        assert!(store.read(OVERRIDES_KEY).unwrap().is_none());
    }

    #[test]
    fn test_path_for_sanitizes_key() {
        let store = FileStore::new("/tmp/x");
        assert_eq!(store.path_for("a/b:c"), PathBuf::from("/tmp/x/a_b_c.json"));
    }
}
