//! Shared fixtures for engine integration tests: recording collaborators
//! and a ready-wired engine over a temp snapshot.
#![allow(dead_code)]

use async_trait::async_trait;
use clubd::config::EngineConfig;
use clubd::engine::Engine;
use clubd::notify::{Notice, Notifier, NotifyError, RoleDirectory, RoleError};
use clubd::persistence::SnapshotStore;
use clubd::registry::{Club, ClubRegistry};
use clubd::state::Store;
use clubd::state::events::Event;
use clubd::state::sessions::Session;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Notifier that records everything it is asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    pub announcements: Mutex<Vec<Notice>>,
    /// Titles of reminded events, in delivery order.
    pub reminders: Mutex<Vec<String>>,
    /// (club key, final present count) per closed session.
    pub summaries: Mutex<Vec<(String, usize)>>,
    /// Members that received a direct message.
    pub dms: Mutex<Vec<String>>,
    /// Members whose direct messages fail.
    pub refuse_dms_to: Mutex<Vec<String>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn announcement(&self, _club: &Club, notice: &Notice) -> Result<(), NotifyError> {
        self.announcements.lock().push(notice.clone());
        Ok(())
    }

    async fn reminder(&self, _club: &Club, event: &Event) -> Result<(), NotifyError> {
        self.reminders.lock().push(event.title.clone());
        Ok(())
    }

    async fn session_closed(
        &self,
        club: &Club,
        _session: &Session,
        present: usize,
    ) -> Result<(), NotifyError> {
        self.summaries.lock().push((club.key.clone(), present));
        Ok(())
    }

    async fn direct_message(&self, member: &str, _notice: &Notice) -> Result<(), NotifyError> {
        if self.refuse_dms_to.lock().iter().any(|m| m == member) {
            return Err(NotifyError(format!("dm refused: {member}")));
        }
        self.dms.lock().push(member.to_string());
        Ok(())
    }
}

/// Role directory stub with scriptable membership and failure mode.
#[derive(Default)]
pub struct StubDirectory {
    pub role_members: Mutex<Vec<String>>,
    pub granted: Mutex<Vec<(String, String)>>,
    pub revoked: Mutex<Vec<(String, String)>>,
    fail: AtomicBool,
}

impl StubDirectory {
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn failing(&self) -> bool {
        self.fail.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoleDirectory for StubDirectory {
    async fn grant(&self, member: &str, club: &Club) -> Result<(), RoleError> {
        if self.failing() {
            return Err(RoleError("platform unavailable".to_string()));
        }
        self.granted
            .lock()
            .push((member.to_string(), club.key.clone()));
        Ok(())
    }

    async fn revoke(&self, member: &str, club: &Club) -> Result<(), RoleError> {
        if self.failing() {
            return Err(RoleError("platform unavailable".to_string()));
        }
        self.revoked
            .lock()
            .push((member.to_string(), club.key.clone()));
        Ok(())
    }

    async fn members(&self, _club: &Club) -> Result<Vec<String>, RoleError> {
        if self.failing() {
            return Err(RoleError("platform unavailable".to_string()));
        }
        Ok(self.role_members.lock().clone())
    }
}

/// Engine wired to recording collaborators over a temp snapshot.
pub fn test_engine(
    dir: &tempfile::TempDir,
) -> (Arc<Engine>, Arc<RecordingNotifier>, Arc<StubDirectory>) {
    let store = Arc::new(Store::open(
        ClubRegistry::campus_catalog(),
        SnapshotStore::new(dir.path().join("clubd.json")),
    ));
    let notifier = Arc::new(RecordingNotifier::default());
    let roles = Arc::new(StubDirectory::default());
    let settings = EngineConfig {
        // Fast pacing so fan-out tests don't sit in the limiter.
        announce_per_second: 100,
        ..EngineConfig::default()
    };
    let engine = Engine::new(
        store,
        notifier.clone() as Arc<dyn Notifier>,
        roles.clone() as Arc<dyn RoleDirectory>,
        settings,
    );
    (engine, notifier, roles)
}
