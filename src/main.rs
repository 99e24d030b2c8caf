//! clubd - club coordination daemon.
//!
//! Hosts the engine standalone: loads the club catalog and state snapshot,
//! runs the reminder sweep, and shuts down cleanly on ctrl-c. A chat
//! platform embeds the library instead and supplies its own notifier and
//! role directory.

use clubd::config::{Config, ConfigError};
use clubd::engine::Engine;
use clubd::notify::{LogNotifier, NullRoleDirectory};
use clubd::persistence::SnapshotStore;
use clubd::registry::ClubRegistry;
use clubd::state::Store;
use clubd::{metrics, scheduler};
use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "clubd.toml".to_string());

    let config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(ConfigError::Io(e)) if e.kind() == ErrorKind::NotFound => {
            info!(path = %config_path, "No config file, using built-in defaults");
            Config::default()
        }
        Err(e) => {
            error!(path = %config_path, error = %e, "Failed to load config");
            return Err(e.into());
        }
    };

    metrics::init();

    let registry = ClubRegistry::from_config(&config.clubs);
    info!(clubs = registry.len(), "Club catalog loaded");

    let snapshots = SnapshotStore::new(&config.engine.data_path);
    let store = Arc::new(Store::open(registry, snapshots));
    let engine = Engine::new(
        store,
        Arc::new(LogNotifier),
        Arc::new(NullRoleDirectory),
        config.engine.clone(),
    );

    let sweep = scheduler::spawn_reminder_sweep(
        Arc::clone(&engine),
        Duration::from_secs(config.engine.reminder_interval_minutes * 60),
    );
    info!(
        interval_minutes = config.engine.reminder_interval_minutes,
        window_minutes = config.engine.reminder_window_minutes,
        "Reminder sweep started"
    );

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    engine.shutdown();
    let _ = sweep.await;

    Ok(())
}
