/**
 * Error Conversion
 *
 * Turns a `BackendError` into a JSON HTTP response:
 * ```json
 * { "error": "Error message", "status": 400 }
 * ```
 */

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use crate::backend::error::types::BackendError;

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!("[Http] {} ({})", self, status);
        } else {
            tracing::debug!("[Http] {} ({})", self, status);
        }

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}
