/**
 * Authentication Handler Types
 *
 * Request and response bodies for the login flow. Field names follow the
 * browser client's JSON conventions.
 */

use serde::{Deserialize, Serialize};

/// Login request
#[derive(Deserialize, Serialize, Debug)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
}

/// Login response
///
/// `magic_link` is echoed so development setups without SMTP can still
/// complete a login.
#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub status: String,
    pub message: String,
    pub magic_link: String,
}

/// Query string of the magic link
#[derive(Deserialize, Debug, Default)]
pub struct MagicLinkQuery {
    pub token: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct VerifyResponse {
    pub email: String,
    pub status: String,
}
