//! Snapshot persistence.
//!
//! All mutable collections serialize into a single JSON document that is
//! rewritten after every effective mutation and read back once at startup.
//! The store is best-effort: a failed save is logged and counted, never
//! propagated into the mutation that triggered it, at the documented risk of
//! losing that mutation across a restart.

use crate::state::events::Event;
use crate::state::sessions::Session;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{info, warn};

/// Snapshot store errors.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("snapshot io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("snapshot encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The persisted state document: four top-level mappings.
///
/// The club registry is static configuration and deliberately absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub events: HashMap<String, Event>,
    #[serde(default)]
    pub sessions: HashMap<String, Session>,
    #[serde(default)]
    pub members: HashMap<String, BTreeSet<String>>,
    /// Per-club event counters, kept independent of the event map so IDs
    /// stay unique even if events are ever pruned.
    #[serde(default)]
    pub event_counters: HashMap<String, u64>,
}

/// Durable home of the snapshot document.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Write the snapshot, replacing prior content. Writes go to a sibling
    /// temp file first and rename over, so a crash mid-write never leaves a
    /// torn document.
    pub fn save(&self, snapshot: &Snapshot) -> Result<(), PersistError> {
        let encoded = serde_json::to_vec_pretty(snapshot)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, &encoded)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Read the snapshot back. A missing file is a fresh install; corrupt
    /// content is logged and treated as empty rather than refusing to start.
    pub fn load(&self) -> Snapshot {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(path = %self.path.display(), "No snapshot found, starting empty");
                return Snapshot::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read snapshot, starting empty");
                return Snapshot::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Snapshot is corrupt, starting empty");
                Snapshot::default()
            }
        }
    }
}
