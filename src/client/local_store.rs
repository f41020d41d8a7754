//! Local board file.
//!
//! The last known board is kept as `board.json` so the client starts with
//! something to show while offline. Writes go through a temp file and a
//! rename, so a crash never leaves a half-written board.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::client::error::ClientError;
use crate::shared::Board;

const FILE_NAME: &str = "board.json";

#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
}

impl LocalStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored board, or `None` if nothing was saved yet
    pub async fn load(&self) -> Result<Option<Board>, ClientError> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| ClientError::Decode(format!("{}: {}", self.path.display(), e)))
    }

    pub async fn save(&self, board: &Board) -> Result<(), ClientError> {
        if let Some(dir) = self.path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let json = serde_json::to_vec_pretty(board).map_err(|e| ClientError::Decode(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}
