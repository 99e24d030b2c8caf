//! Prometheus metrics collection for clubd.
//!
//! Tracks engine activity and, per the delivery contract, counts failures
//! instead of retrying them.

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use std::sync::OnceLock;

/// Global Prometheus registry for all metrics.
pub static REGISTRY: OnceLock<Registry> = OnceLock::new();

pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(Registry::new)
}

/// Event reminders delivered by the sweep.
pub static REMINDERS_SENT: OnceLock<IntCounter> = OnceLock::new();

/// Check-in reactions that changed a record.
pub static REACTIONS_ROUTED: OnceLock<IntCounter> = OnceLock::new();

/// Outbound notifications that failed or timed out.
pub static NOTIFY_FAILURES: OnceLock<IntCounter> = OnceLock::new();

/// Snapshot saves that failed (the mutation stands in memory).
pub static PERSIST_FAILURES: OnceLock<IntCounter> = OnceLock::new();

/// Attendance sessions currently open.
pub static OPEN_SESSIONS: OnceLock<IntGauge> = OnceLock::new();

/// Initialize the Prometheus metrics registry.
///
/// Must be called once at startup before any metrics are recorded.
pub fn init() {
    let r = registry();

    macro_rules! register {
        ($metric:ident, $init:expr) => {
            let m = $init.expect(concat!(stringify!($metric), " creation failed"));
            if let Err(e) = r.register(Box::new(m.clone())) {
                tracing::warn!(error = %e, concat!("Failed to register metric ", stringify!($metric)));
            }
            let _ = $metric.set(m);
        };
    }

    register!(
        REMINDERS_SENT,
        IntCounter::new("clubd_reminders_sent_total", "Event reminders delivered")
    );
    register!(
        REACTIONS_ROUTED,
        IntCounter::new("clubd_reactions_routed_total", "Check-in reactions applied")
    );
    register!(
        NOTIFY_FAILURES,
        IntCounter::new("clubd_notify_failures_total", "Outbound notification failures")
    );
    register!(
        PERSIST_FAILURES,
        IntCounter::new("clubd_persist_failures_total", "Snapshot save failures")
    );
    register!(
        OPEN_SESSIONS,
        IntGauge::new("clubd_open_sessions", "Attendance sessions currently open")
    );
}

/// Gather all metrics and encode them in Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = registry().gather();
    let mut buffer = vec![];
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "Failed to encode Prometheus metrics");
        return String::new();
    }
    match String::from_utf8(buffer) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "Prometheus metrics were not valid UTF-8");
            String::new()
        }
    }
}

#[inline]
pub fn record_reminder_sent() {
    if let Some(c) = REMINDERS_SENT.get() {
        c.inc();
    }
}

#[inline]
pub fn record_reaction_routed() {
    if let Some(c) = REACTIONS_ROUTED.get() {
        c.inc();
    }
}

#[inline]
pub fn record_notify_failure() {
    if let Some(c) = NOTIFY_FAILURES.get() {
        c.inc();
    }
}

#[inline]
pub fn record_persist_failure() {
    if let Some(c) = PERSIST_FAILURES.get() {
        c.inc();
    }
}

#[inline]
pub fn record_session_opened() {
    if let Some(g) = OPEN_SESSIONS.get() {
        g.inc();
    }
}

#[inline]
pub fn record_session_closed() {
    if let Some(g) = OPEN_SESSIONS.get() {
        g.dec();
    }
}
