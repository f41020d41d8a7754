/**
 * Board API Client
 *
 * Thin reqwest wrapper over the two data endpoints. The token is passed per
 * call because the coordinator may swap or drop it at any time.
 */

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;

use crate::client::config::ClientConfig;
use crate::client::error::ClientError;
use crate::shared::Board;

#[derive(Debug, Deserialize)]
struct BoardEnvelope {
    #[serde(default)]
    status: String,
    data: Board,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Debug, Clone)]
pub struct BoardApi {
    http: Client,
    get_url: String,
    sync_url: String,
}

impl BoardApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(config.timings.request_timeout)
            .build()?;
        Ok(Self {
            http,
            get_url: config.api_url("/api/data/get"),
            sync_url: config.api_url("/api/data/sync"),
        })
    }

    /// Pull the stored board (GET /api/data/get)
    pub async fn fetch(&self, token: &str) -> Result<Board, ClientError> {
        let response = self.http.get(&self.get_url).bearer_auth(token).send().await?;
        read_board(response).await
    }

    /// Push `board` and return the merged result (POST /api/data/sync)
    pub async fn push(&self, token: &str, board: &Board) -> Result<Board, ClientError> {
        let response = self
            .http
            .post(&self.sync_url)
            .bearer_auth(token)
            .json(board)
            .send()
            .await?;
        read_board(response).await
    }
}

async fn read_board(response: Response) -> Result<Board, ClientError> {
    let status = response.status();
    if status == StatusCode::UNAUTHORIZED {
        return Err(ClientError::Unauthorized);
    }
    if !status.is_success() {
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .map(|body| body.error)
            .unwrap_or(text);
        return Err(ClientError::Server {
            status: status.as_u16(),
            message,
        });
    }

    let body = response.text().await?;
    let envelope: BoardEnvelope =
        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))?;
    if envelope.status != "success" {
        return Err(ClientError::Decode(format!(
            "unexpected status '{}'",
            envelope.status
        )));
    }
    Ok(envelope.data)
}
