/**
 * Server Initialization
 *
 * Builds the application from configuration:
 * 1. Open the board store
 * 2. Build the mailer if SMTP is configured
 * 3. Spawn the hub and assemble `AppState`
 * 4. Start the periodic cleanup task
 * 5. Create the router
 */

use std::time::Duration;

use axum::Router;
use thiserror::Error;

use crate::backend::auth::Mailer;
use crate::backend::routes::router::create_router;
use crate::backend::server::config::{ConfigError, ServerConfig};
use crate::backend::server::state::AppState;
use crate::backend::storage::{BoardStore, StorageError};

/// Expired magic links and idle identity locks are swept this often
const CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// Startup failures
#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to open board store: {0}")]
    Storage(#[from] StorageError),
}

/// Create the application from a loaded configuration
///
/// # Errors
///
/// Fails only if the board store cannot be opened. A broken SMTP setup is
/// logged and login continues without mail.
pub async fn create_app(config: ServerConfig) -> Result<Router<()>, InitError> {
    tracing::info!("[Server] initializing kanban sync backend");

    // Step 1: Open storage (runs migrations for SQLite)
    let store = BoardStore::open(&config.database_url).await?;
    tracing::info!("[Server] board store ready ({})", store_kind(&store));

    // Step 2: Optional mailer
    let mailer = config.smtp.as_ref().and_then(|smtp| match Mailer::from_config(smtp) {
        Ok(mailer) => Some(mailer),
        Err(e) => {
            tracing::error!("[Server] SMTP configuration unusable, mail disabled: {}", e);
            None
        }
    });

    Ok(create_app_with(config, store, mailer))
}

/// Create the application around an already opened store
///
/// Used directly by tests to inject an in-memory store.
pub fn create_app_with(config: ServerConfig, store: BoardStore, mailer: Option<Mailer>) -> Router<()> {
    // Step 3: Hub and shared state
    let app_state = AppState::new(config, store, mailer);

    // Step 4: Periodic cleanup
    spawn_cleanup(&app_state);

    // Step 5: Router with all routes
    let app = create_router(app_state);
    tracing::info!("[Server] router configured");
    app
}

fn spawn_cleanup(app_state: &AppState) {
    let magic_links = app_state.magic_links.clone();
    let locks = app_state.sync.locks().clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CLEANUP_INTERVAL);
        // First tick completes immediately
        interval.tick().await;
        loop {
            interval.tick().await;
            let links = magic_links.prune_expired();
            let idle = locks.prune_idle();
            tracing::debug!(
                "[Server] cleanup removed {} expired links, {} idle locks",
                links,
                idle
            );
        }
    });
}

fn store_kind(store: &BoardStore) -> &'static str {
    match store {
        BoardStore::Sqlite(_) => "sqlite",
        BoardStore::Memory(_) => "memory",
    }
}
