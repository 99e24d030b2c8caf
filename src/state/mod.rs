//! Process-wide mutable state.
//!
//! A single [`Store`] owns every mutable collection for the lifetime of the
//! process. It is seeded from the snapshot at startup, injected into each
//! component, and re-persisted after every effective mutation. Each
//! collection serializes its read-modify-write sequences behind its own
//! lock.

pub mod events;
pub mod roster;
pub mod sessions;

use crate::metrics;
use crate::persistence::{Snapshot, SnapshotStore};
use crate::registry::ClubRegistry;
use events::EventLedger;
use roster::Roster;
use sessions::SessionLedger;
use tracing::{error, info};

/// Owner of all mutable collections plus the snapshot store.
pub struct Store {
    pub registry: ClubRegistry,
    pub events: EventLedger,
    pub sessions: SessionLedger,
    pub roster: Roster,
    snapshots: SnapshotStore,
}

impl Store {
    /// Build a store seeded from the snapshot on disk.
    pub fn open(registry: ClubRegistry, snapshots: SnapshotStore) -> Self {
        let snapshot = snapshots.load();
        info!(
            events = snapshot.events.len(),
            sessions = snapshot.sessions.len(),
            members = snapshot.members.len(),
            "State snapshot loaded"
        );

        let store = Self {
            registry,
            events: EventLedger::default(),
            sessions: SessionLedger::default(),
            roster: Roster::default(),
            snapshots,
        };
        store.events.restore(snapshot.events, snapshot.event_counters);
        store.sessions.restore(snapshot.sessions);
        store.roster.restore(snapshot.members);
        store
    }

    /// Assemble the current snapshot.
    pub fn snapshot(&self) -> Snapshot {
        let (events, event_counters) = self.events.export();
        Snapshot {
            events,
            sessions: self.sessions.export(),
            members: self.roster.export(),
            event_counters,
        }
    }

    /// Flush state to the snapshot store.
    ///
    /// Failures are logged and counted; the in-memory mutation that
    /// triggered the flush always stands, at the cost of possibly losing it
    /// across a restart.
    pub fn persist(&self) {
        if let Err(e) = self.snapshots.save(&self.snapshot()) {
            metrics::record_persist_failure();
            error!(error = %e, "Failed to persist snapshot");
        }
    }
}
