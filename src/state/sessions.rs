//! Attendance sessions: time-boxed presence windows.

use crate::error::{EngineError, EngineResult};
use chrono::NaiveDateTime;
use parking_lot::RwLock;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A time-boxed attendance window for one club meeting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub club: String,
    pub started_at: NaiveDateTime,
    pub duration_minutes: u32,
    #[serde(default)]
    pub present: BTreeSet<String>,
    #[serde(default)]
    pub closed: bool,
}

/// All attendance sessions behind one lock.
#[derive(Default)]
pub struct SessionLedger {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionLedger {
    /// Open a session. IDs carry a random hex suffix so two sessions
    /// started for the same club within the same second stay distinct.
    pub fn start(&self, club: &str, duration_minutes: u32, now: NaiveDateTime) -> String {
        let stamp = now.format("%Y%m%d_%H%M%S");
        let mut sessions = self.sessions.write();
        let id = loop {
            let suffix = rand::thread_rng().gen_range(0x1000..0x10000u32);
            let candidate = format!("{club}_{stamp}_{suffix:04x}");
            if !sessions.contains_key(&candidate) {
                break candidate;
            }
        };
        sessions.insert(
            id.clone(),
            Session {
                club: club.to_string(),
                started_at: now,
                duration_minutes,
                present: BTreeSet::new(),
                closed: false,
            },
        );
        id
    }

    /// Record presence. Returns whether the member was newly added.
    ///
    /// A closed session accepts the call but ignores it: check-ins arrive
    /// as reactions, which have no error channel, so a late check-in is
    /// dropped rather than rejected.
    pub fn mark_present(&self, session_id: &str, member: &str) -> EngineResult<bool> {
        let mut sessions = self.sessions.write();
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| EngineError::NotFound(session_id.to_string()))?;
        if session.closed {
            return Ok(false);
        }
        Ok(session.present.insert(member.to_string()))
    }

    /// Close a session, returning the final present count the first time.
    /// Closing again, or closing an unknown id, is a no-op.
    pub fn close(&self, session_id: &str) -> Option<usize> {
        let mut sessions = self.sessions.write();
        let session = sessions.get_mut(session_id)?;
        if session.closed {
            return None;
        }
        session.closed = true;
        Some(session.present.len())
    }

    pub fn get(&self, session_id: &str) -> Option<Session> {
        self.sessions.read().get(session_id).cloned()
    }

    /// Clone out the ledger for a snapshot.
    pub fn export(&self) -> HashMap<String, Session> {
        self.sessions.read().clone()
    }

    /// Seed the ledger from a loaded snapshot.
    pub fn restore(&self, sessions: HashMap<String, Session>) {
        *self.sessions.write() = sessions;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2031, 3, 5)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_id_shape_and_same_second_starts() {
        let ledger = SessionLedger::default();
        let a = ledger.start("art", 5, noon());
        let b = ledger.start("art", 5, noon());

        assert!(a.starts_with("art_20310305_120000_"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_mark_present_is_idempotent() {
        let ledger = SessionLedger::default();
        let id = ledger.start("art", 5, noon());

        assert_eq!(ledger.mark_present(&id, "u1"), Ok(true));
        assert_eq!(ledger.mark_present(&id, "u1"), Ok(false));
        assert_eq!(ledger.get(&id).unwrap().present.len(), 1);
    }

    #[test]
    fn test_mark_present_unknown_session() {
        let ledger = SessionLedger::default();
        assert_eq!(
            ledger.mark_present("art_x", "u1"),
            Err(EngineError::NotFound("art_x".to_string()))
        );
    }

    #[test]
    fn test_closed_session_ignores_checkins() {
        let ledger = SessionLedger::default();
        let id = ledger.start("art", 1, noon());
        ledger.mark_present(&id, "u1").unwrap();

        assert_eq!(ledger.close(&id), Some(1));
        // Late check-in: no error, no effect on the count at close.
        assert_eq!(ledger.mark_present(&id, "u2"), Ok(false));
        assert_eq!(ledger.get(&id).unwrap().present.len(), 1);
    }

    #[test]
    fn test_close_is_idempotent() {
        let ledger = SessionLedger::default();
        let id = ledger.start("art", 1, noon());

        assert_eq!(ledger.close(&id), Some(0));
        assert_eq!(ledger.close(&id), None);
        assert_eq!(ledger.close("unknown"), None);
    }
}
