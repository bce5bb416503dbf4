use chrono::{DateTime, Utc};
use fd_lock::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

use crate::world::Position;

pub const DEFAULT_MAX_PATH_LENGTH: u32 = 600;
pub const DEFAULT_MAX_LINEAR_RANGE: u32 = 10;

const SNAPSHOT_VERSION: &str = "1";

/// Errors that can occur while saving or loading durable records
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: String, found: String },

    #[error("Lock acquisition failed: {reason}")]
    LockError { reason: String },
}

/// Durable record of a single directive. Outlives the in-memory directive
/// and may be edited by external tooling between ticks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectiveMemory {
    /// Tick the directive was first wrapped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<u64>,
    /// Tick after which a non-persistent directive is removed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration: Option<u64>,
    /// Cached colony binding
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colony: Option<String>,
    /// Target of a requested marker move
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_relocation: Option<Position>,
    /// Names of waypoint markers, in travel order
    #[serde(skip_serializing_if = "Option::is_none")]
    pub waypoints: Option<Vec<String>>,
    pub persistent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suspend_until: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_path_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_linear_range: Option<u32>,
    pub allow_portals: bool,
    pub debug: bool,
    /// Kind-specific fields, kept as-is
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl DirectiveMemory {
    pub fn is_expired(&self, tick: u64) -> bool {
        !self.persistent && self.expiration.is_some_and(|expiration| tick > expiration)
    }

    /// The suspension deadline while `tick` is still before it
    pub fn suspended_until(&self, tick: u64) -> Option<u64> {
        self.suspend_until.filter(|&until| tick < until)
    }

    pub fn max_path_length_or(&self, default: u32) -> u32 {
        self.max_path_length.unwrap_or(default)
    }

    pub fn max_linear_range_or(&self, default: u32) -> u32 {
        self.max_linear_range.unwrap_or(default)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct MemorySnapshot {
    version: String,
    saved_at: DateTime<Utc>,
    records: BTreeMap<String, DirectiveMemory>,
}

/// Durable records keyed by directive name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryStore {
    records: BTreeMap<String, DirectiveMemory>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&DirectiveMemory> {
        self.records.get(name)
    }

    /// Copy of the record for `name`, or an empty record
    pub fn record(&self, name: &str) -> DirectiveMemory {
        self.records.get(name).cloned().unwrap_or_default()
    }

    pub fn put(&mut self, name: &str, memory: DirectiveMemory) {
        self.records.insert(name.to_string(), memory);
    }

    /// Edit a record in place, creating an empty one first if needed
    pub fn update<F>(&mut self, name: &str, edit: F)
    where
        F: FnOnce(&mut DirectiveMemory),
    {
        edit(self.records.entry(name.to_string()).or_default());
    }

    pub fn remove(&mut self, name: &str) -> Option<DirectiveMemory> {
        self.records.remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.records.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &DirectiveMemory)> {
        self.records.iter().map(|(name, record)| (name.as_str(), record))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ask for a directive to be moved. Picked up on its next refresh.
    pub fn request_relocation(&mut self, name: &str, target: Position) {
        debug!(directive = %name, target = %target, "Relocation requested");
        self.update(name, |record| record.pending_relocation = Some(target));
    }

    /// Load records from a JSON snapshot. A missing file yields an empty store.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "No durable record file, starting empty");
            return Ok(Self::new());
        }

        let content = std::fs::read_to_string(path)?;
        let snapshot: MemorySnapshot = serde_json::from_str(&content)?;
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(PersistenceError::VersionMismatch {
                expected: SNAPSHOT_VERSION.to_string(),
                found: snapshot.version,
            });
        }

        info!(
            path = %path.display(),
            records = snapshot.records.len(),
            saved_at = %snapshot.saved_at,
            "Loaded durable records"
        );
        Ok(Self {
            records: snapshot.records,
        })
    }

    /// Write all records as a JSON snapshot while holding an exclusive file lock
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistenceError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(path)?;
        let mut lock = RwLock::new(file);
        let mut guard = lock.try_write().map_err(|e| PersistenceError::LockError {
            reason: format!("{} is locked by another writer: {e}", path.display()),
        })?;

        let snapshot = MemorySnapshot {
            version: SNAPSHOT_VERSION.to_string(),
            saved_at: Utc::now(),
            records: self.records.clone(),
        };
        let json = serde_json::to_vec_pretty(&snapshot)?;

        guard.set_len(0)?;
        guard.seek(SeekFrom::Start(0))?;
        guard.write_all(&json)?;
        guard.flush()?;

        debug!(path = %path.display(), records = self.records.len(), "Saved durable records");
        Ok(())
    }
}
