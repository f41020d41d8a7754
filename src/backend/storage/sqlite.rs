/**
 * SQLite Board Store
 *
 * Boards are stored as JSON text, one row per identity in `user_data`.
 * Saving also records the identity in `users` the first time it is seen;
 * both writes share one transaction.
 */

use std::str::FromStr;

use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::backend::storage::StorageError;
use crate::shared::Board;

#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect, creating the database file if needed, and run migrations
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        tracing::info!("[Storage] connecting to {}", database_url);

        let options = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);

        // An in-memory database lives and dies with its single connection
        let in_memory = database_url.contains(":memory:");
        let pool = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(5)
                .connect_with(options)
                .await?
        };

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        tracing::info!("[Storage] migrations applied");
        Ok(())
    }

    pub async fn load(&self, identity: &str) -> Result<Board, StorageError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT data FROM user_data WHERE email = ?")
            .bind(identity)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            None => Ok(Board::initial()),
            Some((data,)) => serde_json::from_str(&data).map_err(|source| StorageError::Corrupt {
                identity: identity.to_string(),
                source,
            }),
        }
    }

    pub async fn save(&self, identity: &str, board: &Board) -> Result<(), StorageError> {
        let data = serde_json::to_string(board)?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        sqlx::query("INSERT OR IGNORE INTO users (email, created_at) VALUES (?, ?)")
            .bind(identity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            "INSERT INTO user_data (email, data, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(email) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
        )
        .bind(identity)
        .bind(&data)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        tracing::debug!("[Storage] saved board for {} ({} bytes)", identity, data.len());
        Ok(())
    }
}
