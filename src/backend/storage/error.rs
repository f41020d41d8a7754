use thiserror::Error;

/// Failures of the board storage backends
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The stored JSON no longer decodes as a board
    #[error("Stored board for {identity} is corrupt: {source}")]
    Corrupt {
        identity: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode board: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}
