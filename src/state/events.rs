//! Event ledger: scheduled club events and their attendee sets.

use crate::error::{EngineError, EngineResult};
use chrono::{Duration, NaiveDateTime};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Fixed parse format for event date/time input.
pub const WHEN_FORMAT: &str = "%Y-%m-%d %H:%M";

/// How many entries an upcoming-events listing returns at most.
pub const UPCOMING_LIMIT: usize = 10;

/// A scheduled club event with RSVP tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub club: String,
    pub title: String,
    pub description: String,
    pub scheduled_at: NaiveDateTime,
    pub creator: String,
    #[serde(default)]
    pub attendees: BTreeSet<String>,
    /// Set by the first reminder sweep that finds the event inside the
    /// notification window; later sweeps skip it.
    #[serde(default)]
    pub reminder_sent: bool,
}

impl Event {
    /// Parse a `YYYY-MM-DD` / `HH:MM` pair under the fixed format.
    ///
    /// The parsed time is not required to be in the future; `upcoming`
    /// filters past events out at query time instead.
    pub fn parse_when(date: &str, time: &str) -> EngineResult<NaiveDateTime> {
        let raw = format!("{date} {time}");
        NaiveDateTime::parse_from_str(&raw, WHEN_FORMAT)
            .map_err(|_| EngineError::InvalidTimestamp(raw))
    }
}

#[derive(Default)]
struct EventsInner {
    events: HashMap<String, Event>,
    /// Monotonic per-club counters, persisted independently of the event
    /// map so IDs never repeat even if the map is pruned.
    counters: HashMap<String, u64>,
}

/// All scheduled events behind one lock.
#[derive(Default)]
pub struct EventLedger {
    inner: RwLock<EventsInner>,
}

impl EventLedger {
    /// Create an event under the next `{club}_{n}` identifier. The club key
    /// must already be validated against the registry.
    pub fn create(
        &self,
        club: &str,
        title: &str,
        description: &str,
        scheduled_at: NaiveDateTime,
        creator: &str,
    ) -> String {
        let mut inner = self.inner.write();
        let n = {
            let counter = inner.counters.entry(club.to_string()).or_insert(0);
            let n = *counter;
            *counter += 1;
            n
        };
        let id = format!("{club}_{n}");
        inner.events.insert(
            id.clone(),
            Event {
                club: club.to_string(),
                title: title.to_string(),
                description: description.to_string(),
                scheduled_at,
                creator: creator.to_string(),
                attendees: BTreeSet::new(),
                reminder_sent: false,
            },
        );
        id
    }

    /// Record an RSVP. Returns whether the member was newly added.
    pub fn add_attendee(&self, event_id: &str, member: &str) -> EngineResult<bool> {
        let mut inner = self.inner.write();
        let event = inner
            .events
            .get_mut(event_id)
            .ok_or_else(|| EngineError::NotFound(event_id.to_string()))?;
        Ok(event.attendees.insert(member.to_string()))
    }

    /// Upcoming events: strictly future, optionally filtered by club,
    /// ascending by scheduled time, at most [`UPCOMING_LIMIT`] entries.
    /// Recomputed on every call.
    pub fn upcoming(&self, club: Option<&str>, now: NaiveDateTime) -> Vec<(String, Event)> {
        let inner = self.inner.read();
        let mut upcoming: Vec<(String, Event)> = inner
            .events
            .iter()
            .filter(|(_, e)| e.scheduled_at > now)
            .filter(|(_, e)| club.is_none_or(|c| e.club == c))
            .map(|(id, e)| (id.clone(), e.clone()))
            .collect();
        upcoming.sort_by(|a, b| {
            a.1.scheduled_at
                .cmp(&b.1.scheduled_at)
                .then_with(|| a.0.cmp(&b.0))
        });
        upcoming.truncate(UPCOMING_LIMIT);
        upcoming
    }

    /// Collect events entering the reminder window `(now, now + window]`
    /// whose flag is unset, flagging them in the same lock acquisition.
    /// Each event can therefore be returned by at most one call, ever.
    pub fn mark_due_reminders(
        &self,
        now: NaiveDateTime,
        window: Duration,
    ) -> Vec<(String, Event)> {
        let horizon = now + window;
        let mut inner = self.inner.write();
        let mut due: Vec<(String, Event)> = Vec::new();
        for (id, event) in inner.events.iter_mut() {
            if !event.reminder_sent && event.scheduled_at > now && event.scheduled_at <= horizon {
                event.reminder_sent = true;
                due.push((id.clone(), event.clone()));
            }
        }
        due.sort_by(|a, b| a.1.scheduled_at.cmp(&b.1.scheduled_at));
        due
    }

    pub fn get(&self, event_id: &str) -> Option<Event> {
        self.inner.read().events.get(event_id).cloned()
    }

    /// Clone out the ledger for a snapshot.
    pub fn export(&self) -> (HashMap<String, Event>, HashMap<String, u64>) {
        let inner = self.inner.read();
        (inner.events.clone(), inner.counters.clone())
    }

    /// Seed the ledger from a loaded snapshot.
    pub fn restore(&self, events: HashMap<String, Event>, counters: HashMap<String, u64>) {
        let mut inner = self.inner.write();
        inner.events = events;
        inner.counters = counters;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2031, 3, 5)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_ids_count_up_per_club() {
        let ledger = EventLedger::default();
        assert_eq!(ledger.create("science", "A", "", at(18, 0), "m"), "science_0");
        assert_eq!(ledger.create("science", "B", "", at(19, 0), "m"), "science_1");
        assert_eq!(ledger.create("art", "C", "", at(20, 0), "m"), "art_0");
    }

    #[test]
    fn test_counter_survives_restore_of_pruned_map() {
        let ledger = EventLedger::default();
        ledger.create("science", "A", "", at(18, 0), "m");
        let (_, counters) = ledger.export();

        // Restore with the event pruned away but the counter intact.
        let restored = EventLedger::default();
        restored.restore(HashMap::new(), counters);
        assert_eq!(
            restored.create("science", "B", "", at(19, 0), "m"),
            "science_1"
        );
    }

    #[test]
    fn test_add_attendee_is_idempotent() {
        let ledger = EventLedger::default();
        let id = ledger.create("science", "Lab Night", "", at(18, 0), "m");

        assert_eq!(ledger.add_attendee(&id, "u1"), Ok(true));
        assert_eq!(ledger.add_attendee(&id, "u1"), Ok(false));
        assert_eq!(ledger.get(&id).unwrap().attendees.len(), 1);
    }

    #[test]
    fn test_add_attendee_unknown_event() {
        let ledger = EventLedger::default();
        assert_eq!(
            ledger.add_attendee("science_9", "u1"),
            Err(EngineError::NotFound("science_9".to_string()))
        );
    }

    #[test]
    fn test_upcoming_filters_sorts_and_caps() {
        let ledger = EventLedger::default();
        let now = at(12, 0);
        ledger.create("science", "past", "", at(9, 0), "m");
        ledger.create("art", "other club", "", at(13, 0), "m");
        // Insert in reverse order to exercise the sort.
        for m in (0..12u32).rev() {
            ledger.create("science", "future", "", at(14, m), "m");
        }

        let all = ledger.upcoming(None, now);
        assert_eq!(all.len(), UPCOMING_LIMIT);
        assert!(all.windows(2).all(|w| w[0].1.scheduled_at <= w[1].1.scheduled_at));
        assert!(all.iter().all(|(_, e)| e.scheduled_at > now));

        let science = ledger.upcoming(Some("science"), now);
        assert!(science.iter().all(|(_, e)| e.club == "science"));
    }

    #[test]
    fn test_parse_when_rejects_bad_input() {
        assert!(Event::parse_when("2031-03-05", "18:30").is_ok());
        assert_eq!(
            Event::parse_when("tomorrow", "6pm"),
            Err(EngineError::InvalidTimestamp("tomorrow 6pm".to_string()))
        );
    }

    #[test]
    fn test_mark_due_reminders_flags_exactly_once() {
        let ledger = EventLedger::default();
        let now = at(12, 0);
        let in_window = ledger.create("science", "soon", "", at(12, 40), "m");
        ledger.create("science", "later", "", at(15, 0), "m");
        ledger.create("science", "already started", "", at(11, 0), "m");

        let due = ledger.mark_due_reminders(now, Duration::hours(1));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].0, in_window);
        assert!(ledger.get(&in_window).unwrap().reminder_sent);

        // A second sweep over the same window finds nothing.
        assert!(ledger.mark_due_reminders(now, Duration::hours(1)).is_empty());
    }
}
