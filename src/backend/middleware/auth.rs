/**
 * Authentication Middleware
 *
 * Protects routes that need an identity. It reads the bearer token from
 * the Authorization header, resolves it through the configured
 * [`IdentityProvider`] and attaches the identity to the request.
 */

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::backend::auth::{AuthError, IdentityProvider};
use crate::backend::error::BackendError;
use crate::backend::server::state::AppState;

/// Authenticated user data extracted from the token
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub email: String,
}

/// Authentication middleware
///
/// 1. Extracts the token from `Authorization: Bearer <token>`
/// 2. Verifies it
/// 3. Attaches [`AuthenticatedUser`] to the request extensions
///
/// Returns 401 Unauthorized if the token is missing or invalid.
pub async fn auth_middleware(
    State(app_state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, BackendError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    let token = bearer_token(header).map_err(|e| {
        tracing::warn!("[Auth] {}", e);
        e
    })?;

    let email = app_state.tokens.authenticate(token).map_err(|e| {
        tracing::warn!("[Auth] rejected token: {}", e);
        e
    })?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser { email });

    Ok(next.run(request).await)
}

fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    let header = header.ok_or(AuthError::MissingCredential)?;
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MalformedHeader)
}

/// Axum extractor for the authenticated user
///
/// Only valid on routes behind [`auth_middleware`].
#[derive(Clone, Debug)]
pub struct AuthUser(pub AuthenticatedUser);

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = BackendError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| {
                tracing::warn!("[Auth] AuthenticatedUser not found in request extensions");
                AuthError::MissingCredential
            })?;

        Ok(AuthUser(user))
    }
}
