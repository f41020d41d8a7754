/**
 * WebSocket Subscription Handler
 *
 * GET /api/ws?token=<jwt>. Browsers cannot set headers on a WebSocket
 * handshake, so the session token travels in the query string. The
 * identity is resolved once here; the upgraded socket then becomes a
 * session registered with the hub.
 */

use axum::{
    extract::{ws::WebSocketUpgrade, Query, State},
    response::Response,
};
use futures_util::StreamExt;
use serde::Deserialize;

use crate::backend::auth::{AuthError, IdentityProvider};
use crate::backend::error::BackendError;
use crate::backend::realtime::session;
use crate::backend::server::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionQuery {
    pub token: Option<String>,
}

/// Handle the WebSocket upgrade (GET /api/ws)
///
/// # Errors
///
/// * `401 Unauthorized` - missing, invalid or expired token
pub async fn handle_ws_subscription(
    State(state): State<AppState>,
    Query(query): Query<SubscriptionQuery>,
    ws: WebSocketUpgrade,
) -> Result<Response, BackendError> {
    let token = query
        .token
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingCredential)?;
    let identity = state.tokens.authenticate(&token).map_err(|e| {
        tracing::warn!("[Session] upgrade rejected: {}", e);
        e
    })?;

    let hub = state.hub.clone();
    let config = state.config.session.clone();
    let scope = state.config.broadcast_scope;
    tracing::info!("[Session] upgrading connection for {}", identity);

    Ok(ws
        .max_message_size(config.max_message_size)
        .on_upgrade(move |socket| async move {
            let (sink, stream) = socket.split();
            session::serve(stream, sink, identity, hub, config, scope).await;
        }))
}
