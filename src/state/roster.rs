//! Membership roster: which clubs each member has explicitly joined.
//!
//! Kept redundantly alongside the chat platform's own role state; the
//! engine's join/leave path writes both halves and rolls this one back when
//! the platform half fails (see [`crate::engine::Engine::join_club`]).

use parking_lot::RwLock;
use std::collections::{BTreeSet, HashMap};

/// Member identity mapped to the clubs they have joined.
#[derive(Default)]
pub struct Roster {
    members: RwLock<HashMap<String, BTreeSet<String>>>,
}

impl Roster {
    /// Returns whether the membership was newly added.
    pub fn join(&self, member: &str, club: &str) -> bool {
        self.members
            .write()
            .entry(member.to_string())
            .or_default()
            .insert(club.to_string())
    }

    /// Returns whether the membership existed.
    pub fn leave(&self, member: &str, club: &str) -> bool {
        let mut members = self.members.write();
        let Some(clubs) = members.get_mut(member) else {
            return false;
        };
        let removed = clubs.remove(club);
        if clubs.is_empty() {
            members.remove(member);
        }
        removed
    }

    /// Clubs the member has joined, in stable order.
    pub fn clubs_of(&self, member: &str) -> BTreeSet<String> {
        self.members.read().get(member).cloned().unwrap_or_default()
    }

    /// Clone out the roster for a snapshot.
    pub fn export(&self) -> HashMap<String, BTreeSet<String>> {
        self.members.read().clone()
    }

    /// Seed the roster from a loaded snapshot.
    pub fn restore(&self, members: HashMap<String, BTreeSet<String>>) {
        *self.members.write() = members;
    }
}
