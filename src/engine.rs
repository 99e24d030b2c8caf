//! The engine facade the external command and reaction layers drive.
//!
//! Owns the shared [`Store`], the outbound collaborator seams, and every
//! background timer. All timers hang off one root cancellation token so
//! shutdown terminates them instead of leaking tasks.

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::metrics;
use crate::notify::{Correlation, Notice, Notifier, NotifyError, RoleDirectory};
use crate::router::{self, RouteOutcome};
use crate::scheduler;
use crate::state::Store;
use crate::state::events::Event;
use chrono::{Local, NaiveDateTime};
use dashmap::DashMap;
use futures_util::StreamExt;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use nonzero_ext::nonzero;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Coordinates the store, outbound collaborators, and background timers.
pub struct Engine {
    store: Arc<Store>,
    notifier: Arc<dyn Notifier>,
    roles: Arc<dyn RoleDirectory>,
    settings: EngineConfig,
    shutdown: CancellationToken,
    /// Live auto-close timers by session id, so shutdown can account for
    /// them and fired timers can deregister themselves.
    close_timers: DashMap<String, CancellationToken>,
    announce_limiter: DefaultDirectRateLimiter,
    myself: Weak<Engine>,
}

impl Engine {
    pub fn new(
        store: Arc<Store>,
        notifier: Arc<dyn Notifier>,
        roles: Arc<dyn RoleDirectory>,
        settings: EngineConfig,
    ) -> Arc<Self> {
        let per_second =
            NonZeroU32::new(settings.announce_per_second).unwrap_or(nonzero!(1u32));
        Arc::new_cyclic(|myself| Self {
            store,
            notifier,
            roles,
            shutdown: CancellationToken::new(),
            close_timers: DashMap::new(),
            announce_limiter: RateLimiter::direct(Quota::per_second(per_second)),
            myself: myself.clone(),
            settings,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop the reminder sweep and every pending close timer.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Create a scheduled event and announce it with its correlation.
    pub async fn create_event(
        &self,
        club: &str,
        title: &str,
        description: &str,
        date: &str,
        time: &str,
        creator: &str,
    ) -> EngineResult<String> {
        let club_info = self.store.registry.require(club)?.clone();
        let scheduled_at = Event::parse_when(date, time)?;
        let event_id = self
            .store
            .events
            .create(club, title, description, scheduled_at, creator);
        self.store.persist();
        info!(event = %event_id, club = %club, scheduled_at = %scheduled_at, "Event created");

        let notice = Notice {
            title: format!("New {} Event", club_info.name),
            body: format!(
                "{title}\n{description}\nWhen: {}",
                scheduled_at.format("%B %d, %Y at %I:%M %p")
            ),
            color: club_info.color,
            correlation: Some(Correlation::Event(event_id.clone())),
        };
        self.deliver(
            self.notifier.announcement(&club_info, &notice).await,
            "event announcement",
        );
        Ok(event_id)
    }

    /// Upcoming events, soonest first. With a club filter, the club must
    /// exist; without one, all clubs are listed together.
    pub fn list_upcoming(&self, club: Option<&str>) -> EngineResult<Vec<(String, Event)>> {
        if let Some(club) = club {
            self.store.registry.require(club)?;
        }
        Ok(self.store.events.upcoming(club, Local::now().naive_local()))
    }

    /// Start an attendance session and schedule its auto-close.
    pub async fn start_session(
        &self,
        club: &str,
        duration_minutes: Option<u32>,
    ) -> EngineResult<String> {
        let club_info = self.store.registry.require(club)?.clone();
        let duration = duration_minutes
            .unwrap_or(self.settings.default_session_minutes)
            .max(1);
        let session_id = self
            .store
            .sessions
            .start(club, duration, Local::now().naive_local());
        self.store.persist();
        metrics::record_session_opened();
        info!(session = %session_id, club = %club, duration, "Attendance session started");

        let notice = Notice {
            title: format!("{} Attendance", club_info.name),
            body: format!("Attendance is being taken for {duration} minutes."),
            color: club_info.color,
            correlation: Some(Correlation::Session(session_id.clone())),
        };
        self.deliver(
            self.notifier.announcement(&club_info, &notice).await,
            "attendance announcement",
        );

        if let Some(engine) = self.myself.upgrade() {
            let token = self.shutdown.child_token();
            self.close_timers.insert(session_id.clone(), token.clone());
            scheduler::spawn_session_closer(engine, session_id.clone(), duration, token);
        }
        Ok(session_id)
    }

    /// Close a session and emit its summary. Invoked by the close timer;
    /// harmless to call again once the session is closed.
    pub async fn finish_session(&self, session_id: &str) {
        let Some(present) = self.store.sessions.close(session_id) else {
            return;
        };
        self.store.persist();
        metrics::record_session_closed();
        info!(session = %session_id, present, "Attendance session closed");

        if let Some(session) = self.store.sessions.get(session_id)
            && let Ok(club) = self.store.registry.require(&session.club)
        {
            self.deliver(
                self.notifier.session_closed(club, &session, present).await,
                "attendance summary",
            );
        }
    }

    pub(crate) fn forget_close_timer(&self, session_id: &str) {
        self.close_timers.remove(session_id);
    }

    /// Route an inbound check-in reaction, persisting when a record changed.
    pub fn handle_reaction(&self, correlation: &Correlation, reactor: &str) {
        if router::route(&self.store, correlation, reactor) == RouteOutcome::Recorded {
            self.store.persist();
        }
    }

    /// Join a club: internal record first, then the platform role. A failed
    /// grant rolls the record back so the two halves stay consistent.
    pub async fn join_club(&self, member: &str, club: &str) -> EngineResult<bool> {
        let club_info = self.store.registry.require(club)?.clone();
        if !self.store.roster.join(member, club) {
            return Ok(false);
        }
        if let Err(e) = self.roles.grant(member, &club_info).await {
            self.store.roster.leave(member, club);
            warn!(member = %member, club = %club, error = %e, "Role grant failed, membership rolled back");
            return Err(EngineError::RoleSync(e.to_string()));
        }
        self.store.persist();
        info!(member = %member, club = %club, "Member joined club");
        Ok(true)
    }

    /// Leave a club, with the same rollback discipline as `join_club`.
    pub async fn leave_club(&self, member: &str, club: &str) -> EngineResult<bool> {
        let club_info = self.store.registry.require(club)?.clone();
        if !self.store.roster.leave(member, club) {
            return Ok(false);
        }
        if let Err(e) = self.roles.revoke(member, &club_info).await {
            self.store.roster.join(member, club);
            warn!(member = %member, club = %club, error = %e, "Role revoke failed, membership restored");
            return Err(EngineError::RoleSync(e.to_string()));
        }
        self.store.persist();
        info!(member = %member, club = %club, "Member left club");
        Ok(true)
    }

    /// One reminder sweep pass at the current wall-clock time. Returns how
    /// many reminders went out.
    pub async fn run_reminder_sweep(&self) -> usize {
        self.sweep_at(Local::now().naive_local()).await
    }

    /// Sweep with an explicit `now`: events entering the window are flagged
    /// inside one lock acquisition, then notified outside it, so a slow
    /// notifier never blocks the mutation path and no event is notified
    /// twice.
    pub async fn sweep_at(&self, now: NaiveDateTime) -> usize {
        let window = chrono::Duration::minutes(self.settings.reminder_window_minutes);
        let due = self.store.events.mark_due_reminders(now, window);
        if due.is_empty() {
            return 0;
        }
        self.store.persist();

        let mut sent = 0;
        for (event_id, event) in due {
            let Ok(club) = self.store.registry.require(&event.club) else {
                debug!(event = %event_id, club = %event.club, "Reminder skipped, club no longer configured");
                continue;
            };
            match self.notifier.reminder(club, &event).await {
                Ok(()) => {
                    metrics::record_reminder_sent();
                    sent += 1;
                }
                Err(e) => {
                    metrics::record_notify_failure();
                    warn!(event = %event_id, error = %e, "Reminder delivery failed");
                }
            }
        }
        sent
    }

    /// Direct-message an announcement to every member holding the club's
    /// role. Sends are paced and concurrency-bounded, each capped by a
    /// timeout; failures are counted, not retried. Returns (sent, failed).
    pub async fn announce(
        &self,
        club: &str,
        author: &str,
        text: &str,
    ) -> EngineResult<(usize, usize)> {
        let club_info = self.store.registry.require(club)?.clone();
        let members = self
            .roles
            .members(&club_info)
            .await
            .map_err(|e| EngineError::RoleSync(e.to_string()))?;

        let notice = Notice {
            title: format!("{} Announcement", club_info.name),
            body: format!("{text}\n- {author}"),
            color: club_info.color,
            correlation: None,
        };
        let sent = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);
        let send_timeout = Duration::from_secs(self.settings.send_timeout_seconds);

        futures_util::stream::iter(members)
            .for_each_concurrent(self.settings.announce_concurrency.max(1), |member| {
                let notice = &notice;
                let sent = &sent;
                let failed = &failed;
                async move {
                    self.announce_limiter.until_ready().await;
                    match tokio::time::timeout(
                        send_timeout,
                        self.notifier.direct_message(&member, notice),
                    )
                    .await
                    {
                        Ok(Ok(())) => {
                            sent.fetch_add(1, Ordering::Relaxed);
                        }
                        Ok(Err(e)) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                            metrics::record_notify_failure();
                            debug!(member = %member, error = %e, "Announcement DM failed");
                        }
                        Err(_) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                            metrics::record_notify_failure();
                            debug!(member = %member, "Announcement DM timed out");
                        }
                    }
                }
            })
            .await;

        Ok((sent.into_inner(), failed.into_inner()))
    }

    fn deliver(&self, result: Result<(), NotifyError>, what: &str) {
        if let Err(e) = result {
            metrics::record_notify_failure();
            warn!(error = %e, "Failed to deliver {what}");
        }
    }
}
