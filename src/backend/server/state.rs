/**
 * Application State Management
 *
 * `AppState` is the central state container handed to every handler. All
 * fields are cheap to clone: handles, pools and `Arc`s.
 *
 * # State Extraction
 *
 * The `FromRef` implementations let handlers extract only the part they
 * need, e.g. `State<SyncService>` or `State<HubHandle>`.
 */

use std::sync::Arc;

use axum::extract::FromRef;

use crate::backend::auth::{Mailer, MagicLinkStore, TokenService};
use crate::backend::realtime::HubHandle;
use crate::backend::server::config::ServerConfig;
use crate::backend::storage::BoardStore;
use crate::backend::sync::SyncService;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Live session registry
    pub hub: HubHandle,
    /// Pull/push with per-identity serialization
    pub sync: SyncService,
    pub tokens: TokenService,
    pub magic_links: MagicLinkStore,
    /// `None` when SMTP is not configured
    pub mailer: Option<Mailer>,
}

impl AppState {
    /// Assemble state from configuration and an opened store
    pub fn new(config: ServerConfig, store: BoardStore, mailer: Option<Mailer>) -> Self {
        let hub = crate::backend::realtime::spawn_hub(config.session.queue_capacity);
        let sync = SyncService::new(store, hub.clone(), config.broadcast_scope);
        let tokens = TokenService::new(&config.jwt_secret, config.token_ttl());
        let magic_links = MagicLinkStore::new(config.magic_link_ttl());
        Self {
            config: Arc::new(config),
            hub,
            sync,
            tokens,
            magic_links,
            mailer,
        }
    }
}

impl FromRef<AppState> for SyncService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.sync.clone()
    }
}

impl FromRef<AppState> for HubHandle {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.hub.clone()
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.tokens.clone()
    }
}
