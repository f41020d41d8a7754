/**
 * Router Configuration
 *
 * Combines all route configurations into a single Axum router.
 *
 * # Route Order
 *
 * 1. API routes (auth, board data, WebSocket)
 * 2. Static files from the configured directory for everything else
 * 3. CORS applied around the whole router, so preflights never reach
 *    the auth middleware
 */

use axum::{
    http::{header, Method},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::backend::routes::api_routes::configure_api_routes;
use crate::backend::server::state::AppState;

/// Create the Axum router with all routes configured
///
/// # Route Details
///
/// - `POST /api/auth/login` - Request a magic link
/// - `GET /api/auth/magic-link` - Redeem it
/// - `GET /api/auth/verify` - Check a session token
/// - `GET /api/data/get` - Stored board
/// - `POST /api/data/sync` - Push and merge a board
/// - `GET /api/ws` - WebSocket session
/// - anything else - static files
pub fn create_router(app_state: AppState) -> Router<()> {
    let router = configure_api_routes(Router::new(), &app_state);

    // Static frontend
    let router = router.fallback_service(ServeDir::new(&app_state.config.static_dir));

    router.layer(cors_layer()).with_state(app_state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}
