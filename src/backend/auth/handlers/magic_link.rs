/**
 * Magic Link Redemption
 *
 * GET /api/auth/magic-link?token=... consumes the one-time token and sends
 * the browser back to the app with a session token in the query string.
 */
use axum::{
    extract::{Query, State},
    http::{header::LOCATION, StatusCode},
    response::{IntoResponse, Response},
};
use reqwest::Url;

use crate::backend::auth::handlers::types::MagicLinkQuery;
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

pub async fn redeem_magic_link(
    State(state): State<AppState>,
    Query(query): Query<MagicLinkQuery>,
) -> Result<Response, BackendError> {
    let token = query
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| BackendError::protocol("Missing token"))?;

    let email = state.magic_links.redeem(&token).ok_or_else(|| {
        tracing::warn!("[Auth] unknown or expired magic link token");
        BackendError::protocol("Invalid or expired token")
    })?;

    let jwt = state.tokens.create_token(&email).map_err(|e| {
        tracing::error!("[Auth] failed to sign session token: {:?}", e);
        BackendError::handler(StatusCode::INTERNAL_SERVER_ERROR, "Failed to create session")
    })?;

    tracing::info!("[Auth] {} logged in via magic link", email);
    Ok((StatusCode::FOUND, [(LOCATION, landing_location(&jwt, &email))]).into_response())
}

/// `/?token=<jwt>&email=<email>` with both values form-encoded
fn landing_location(jwt: &str, email: &str) -> String {
    let mut url = match Url::parse("http://localhost/") {
        Ok(url) => url,
        Err(_) => return format!("/?token={}&email={}", jwt, email),
    };
    url.query_pairs_mut()
        .append_pair("token", jwt)
        .append_pair("email", email);
    format!("/?{}", url.query().unwrap_or_default())
}
