//! Reaction routing.
//!
//! An inbound check-in reaction arrives with the correlation its source
//! notice was created with. A matching record gets an idempotent membership
//! update; anything else is dropped silently, since a reaction is not a
//! command and has no error channel back to the reacting user. Self-
//! reactions from the notifier are already filtered by the platform layer.

use crate::metrics;
use crate::notify::Correlation;
use crate::state::Store;
use tracing::debug;

/// Outcome of routing one reaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// A record gained the reactor; state changed and needs persisting.
    Recorded,
    /// The reactor was already present, or the session had closed.
    Unchanged,
    /// The correlation matched no live record.
    Ignored,
}

/// Apply a check-in reaction to the store.
pub fn route(store: &Store, correlation: &Correlation, reactor: &str) -> RouteOutcome {
    let changed = match correlation {
        Correlation::Event(id) => store.events.add_attendee(id, reactor),
        Correlation::Session(id) => store.sessions.mark_present(id, reactor),
    };
    match changed {
        Ok(true) => {
            metrics::record_reaction_routed();
            RouteOutcome::Recorded
        }
        Ok(false) => RouteOutcome::Unchanged,
        Err(_) => {
            debug!(?correlation, reactor = %reactor, "Reaction matched no live record");
            RouteOutcome::Ignored
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::SnapshotStore;
    use crate::registry::ClubRegistry;
    use chrono::NaiveDate;

    fn store(dir: &tempfile::TempDir) -> Store {
        Store::open(
            ClubRegistry::campus_catalog(),
            SnapshotStore::new(dir.path().join("clubd.json")),
        )
    }

    #[test]
    fn test_event_checkin_routes_to_rsvp() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let when = NaiveDate::from_ymd_opt(2031, 3, 5)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        let id = store.events.create("science", "Lab Night", "", when, "mod1");

        let correlation = Correlation::Event(id.clone());
        assert_eq!(route(&store, &correlation, "u1"), RouteOutcome::Recorded);
        assert_eq!(route(&store, &correlation, "u1"), RouteOutcome::Unchanged);
        assert!(store.events.get(&id).unwrap().attendees.contains("u1"));
    }

    #[test]
    fn test_session_checkin_routes_to_presence() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);
        let when = NaiveDate::from_ymd_opt(2031, 3, 5)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        let id = store.sessions.start("art", 5, when);

        let correlation = Correlation::Session(id.clone());
        assert_eq!(route(&store, &correlation, "u1"), RouteOutcome::Recorded);
        assert!(store.sessions.get(&id).unwrap().present.contains("u1"));
    }

    #[test]
    fn test_unknown_correlation_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let store = store(&dir);

        let correlation = Correlation::Event("science_99".to_string());
        assert_eq!(route(&store, &correlation, "u1"), RouteOutcome::Ignored);
    }
}
