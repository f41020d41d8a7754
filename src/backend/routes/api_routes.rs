/**
 * API Route Configuration
 *
 * # Routes
 *
 * ## Public
 * - `POST /api/auth/login`
 * - `GET /api/auth/magic-link`
 * - `GET /api/ws` - authenticates from `?token=` itself
 *
 * ## Bearer token required
 * - `GET /api/auth/verify`
 * - `GET /api/data/get`
 * - `POST /api/data/sync`
 */

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::backend::auth::{login, redeem_magic_link, verify};
use crate::backend::middleware::auth_middleware;
use crate::backend::realtime::handle_ws_subscription;
use crate::backend::server::state::AppState;
use crate::backend::sync::{get_board, sync_board};

/// Add the API routes to `router`
///
/// Protected routes get [`auth_middleware`] through `route_layer`, so
/// unknown paths still fall through to static files instead of a 401.
pub fn configure_api_routes(router: Router<AppState>, app_state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/api/auth/verify", get(verify))
        .route("/api/data/get", get(get_board))
        .route("/api/data/sync", post(sync_board))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    router
        // Authentication endpoints
        .route("/api/auth/login", post(login))
        .route("/api/auth/magic-link", get(redeem_magic_link))
        // Realtime
        .route("/api/ws", get(handle_ws_subscription))
        .merge(protected)
}
