//! Outbound notification seam.
//!
//! The engine renders nothing itself; it hands structured [`Notice`]s to a
//! [`Notifier`] supplied by the hosting platform layer. A notice that
//! expects a check-in reaction carries a [`Correlation`], so the reaction
//! can be routed back to its record without parsing rendered text.

use crate::registry::Club;
use crate::state::events::Event;
use crate::state::sessions::Session;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Links a rendered notification back to its source record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Correlation {
    Event(String),
    Session(String),
}

impl Correlation {
    /// The label/ID form platforms embed in a rendered footer.
    pub fn token(&self) -> String {
        match self {
            Self::Event(id) => format!("Event ID: {id}"),
            Self::Session(id) => format!("Session ID: {id}"),
        }
    }
}

/// A structured outbound message. Rendering is the platform layer's job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: String,
    /// Accent color, taken from the owning club.
    pub color: u32,
    pub correlation: Option<Correlation>,
}

/// Outbound send failure. Counted by the caller, never retried.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct NotifyError(pub String);

/// Where engine output goes.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Event or session announcement posted to the club's channel.
    async fn announcement(&self, club: &Club, notice: &Notice) -> Result<(), NotifyError>;

    /// Reminder addressed to the club's role. On a multi-server deployment
    /// the implementation fans out to every server where the role resolves.
    async fn reminder(&self, club: &Club, event: &Event) -> Result<(), NotifyError>;

    /// Attendance-closed summary with the final present count.
    async fn session_closed(
        &self,
        club: &Club,
        session: &Session,
        present: usize,
    ) -> Result<(), NotifyError>;

    /// Direct message to one member (announcement fan-out path).
    async fn direct_message(&self, member: &str, notice: &Notice) -> Result<(), NotifyError>;
}

/// External role state for a club: the other half of the membership
/// dual-write, plus member resolution for fan-outs.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    async fn grant(&self, member: &str, club: &Club) -> Result<(), RoleError>;
    async fn revoke(&self, member: &str, club: &Club) -> Result<(), RoleError>;
    async fn members(&self, club: &Club) -> Result<Vec<String>, RoleError>;
}

/// External role operation failure.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct RoleError(pub String);

/// Notifier that writes notices to the log. Used by the standalone daemon,
/// which has no chat transport attached.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn announcement(&self, club: &Club, notice: &Notice) -> Result<(), NotifyError> {
        info!(club = %club.key, title = %notice.title, "announcement");
        Ok(())
    }

    async fn reminder(&self, club: &Club, event: &Event) -> Result<(), NotifyError> {
        info!(club = %club.key, title = %event.title, scheduled_at = %event.scheduled_at, "reminder");
        Ok(())
    }

    async fn session_closed(
        &self,
        club: &Club,
        session: &Session,
        present: usize,
    ) -> Result<(), NotifyError> {
        info!(club = %club.key, started_at = %session.started_at, present, "attendance closed");
        Ok(())
    }

    async fn direct_message(&self, member: &str, notice: &Notice) -> Result<(), NotifyError> {
        info!(member = %member, title = %notice.title, "direct message");
        Ok(())
    }
}

/// Role directory for the standalone daemon: grants and revocations are
/// acknowledged locally and no role resolves any members.
#[derive(Debug, Default)]
pub struct NullRoleDirectory;

#[async_trait]
impl RoleDirectory for NullRoleDirectory {
    async fn grant(&self, _member: &str, _club: &Club) -> Result<(), RoleError> {
        Ok(())
    }

    async fn revoke(&self, _member: &str, _club: &Club) -> Result<(), RoleError> {
        Ok(())
    }

    async fn members(&self, _club: &Club) -> Result<Vec<String>, RoleError> {
        Ok(Vec::new())
    }
}
