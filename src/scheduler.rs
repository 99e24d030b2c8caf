//! Background time-driven tasks: the reminder sweep and per-session close
//! timers. Every task hangs off a cancellation token so shutdown terminates
//! it instead of leaking.

use crate::engine::Engine;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Spawn the periodic reminder sweep.
///
/// The first pass runs immediately (useful after a restart), then one per
/// interval. A failing pass only affects its own tick; the loop ends on
/// cancellation alone.
pub fn spawn_reminder_sweep(engine: Arc<Engine>, every: Duration) -> JoinHandle<()> {
    let token = engine.shutdown_token();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("Reminder sweep stopped");
                    return;
                }
                _ = interval.tick() => {
                    let sent = engine.run_reminder_sweep().await;
                    if sent > 0 {
                        info!(sent, "Reminder sweep delivered notifications");
                    }
                }
            }
        }
    })
}

/// Spawn the auto-close timer tied 1:1 to an attendance session.
pub(crate) fn spawn_session_closer(
    engine: Arc<Engine>,
    session_id: String,
    duration_minutes: u32,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let wait = Duration::from_secs(u64::from(duration_minutes) * 60);
        tokio::select! {
            _ = token.cancelled() => {
                debug!(session = %session_id, "Close timer cancelled");
            }
            _ = tokio::time::sleep(wait) => {
                engine.finish_session(&session_id).await;
            }
        }
        engine.forget_close_timer(&session_id);
    })
}
