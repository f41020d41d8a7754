/**
 * Token Verification
 *
 * GET /api/auth/verify. Mounted behind the auth middleware, so reaching the
 * handler already means the bearer token was accepted.
 */
use axum::response::Json;

use crate::backend::auth::handlers::types::VerifyResponse;
use crate::backend::middleware::AuthUser;

pub async fn verify(AuthUser(user): AuthUser) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        email: user.email,
        status: "valid".to_string(),
    })
}
