/**
 * Login Handler
 *
 * POST /api/auth/login. Accepts an e-mail address, stores a one-time token
 * for it and hands out the link that redeems the token.
 *
 * # Process
 *
 * 1. Validate the address
 * 2. Issue a one-time token
 * 3. Build the link from the request's own host
 * 4. Mail it in the background when SMTP is configured
 */
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header::HOST, HeaderMap},
    response::Json,
};

use crate::backend::auth::handlers::types::{LoginRequest, LoginResponse};
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;
use crate::shared::SharedError;

const FORWARDED_PROTO: &str = "x-forwarded-proto";

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, BackendError> {
    let Json(request) = payload.map_err(|e| {
        tracing::warn!("[Auth] rejected login body: {}", e);
        BackendError::protocol("Invalid request format")
    })?;

    let email = request.email.trim().to_string();
    if email.is_empty() || !email.contains('@') {
        return Err(SharedError::validation("email", "Invalid email address").into());
    }

    let token = state.magic_links.issue(&email);
    let magic_link = format!(
        "{}/api/auth/magic-link?token={}",
        base_url(&headers, state.config.port),
        token
    );
    tracing::info!("[Auth] magic link issued for {}", email);

    if let Some(mailer) = state.mailer.clone() {
        let link = magic_link.clone();
        let to = email.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send_magic_link(&to, &link).await {
                tracing::error!("[Auth] failed to mail login link to {}: {}", to, e);
            }
        });
    }

    Ok(Json(LoginResponse {
        status: "success".to_string(),
        message: "Magic link has been sent".to_string(),
        magic_link,
    }))
}

/// Scheme and authority the client used to reach us
fn base_url(headers: &HeaderMap, port: u16) -> String {
    let scheme = match headers.get(FORWARDED_PROTO).and_then(|v| v.to_str().ok()) {
        Some("https") => "https",
        _ => "http",
    };
    match headers.get(HOST).and_then(|v| v.to_str().ok()) {
        Some(host) if !host.is_empty() => format!("{}://{}", scheme, host),
        _ => format!("{}://localhost:{}", scheme, port),
    }
}
