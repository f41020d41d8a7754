/**
 * Board Data Handlers
 *
 * Both routes sit behind the auth middleware; the identity always comes
 * from the token, never from the body.
 *
 * - `GET /api/data/get` - stored board
 * - `POST /api/data/sync` - push a board, receive the merged one
 */

use axum::{
    extract::{rejection::JsonRejection, State},
    response::Json,
};
use serde::{Deserialize, Serialize};

use crate::backend::error::BackendError;
use crate::backend::middleware::AuthUser;
use crate::backend::sync::service::SyncService;
use crate::shared::Board;

/// `{"status": "success", "data": <board>}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardResponse {
    pub status: String,
    pub data: Board,
}

impl BoardResponse {
    fn success(data: Board) -> Self {
        Self {
            status: "success".to_string(),
            data,
        }
    }
}

pub async fn get_board(
    State(sync): State<SyncService>,
    AuthUser(user): AuthUser,
) -> Result<Json<BoardResponse>, BackendError> {
    let board = sync.fetch(&user.email).await?;
    Ok(Json(BoardResponse::success(board)))
}

pub async fn sync_board(
    State(sync): State<SyncService>,
    AuthUser(user): AuthUser,
    payload: Result<Json<Board>, JsonRejection>,
) -> Result<Json<BoardResponse>, BackendError> {
    let Json(client) = payload.map_err(|e| {
        tracing::warn!("[Sync] rejected push from {}: {}", user.email, e);
        BackendError::protocol(format!("Invalid board: {}", e.body_text()))
    })?;
    let merged = sync.push(&user.email, client).await?;
    Ok(Json(BoardResponse::success(merged)))
}
