/**
 * Server Configuration
 *
 * Settings are resolved in three layers, later layers winning:
 * 1. built-in defaults
 * 2. an optional TOML file named by `KANBAN_CONFIG`
 * 3. environment variables (a `.env` file is loaded by the binary first)
 *
 * # Environment Variables
 *
 * | Variable | Field | Default |
 * |----------|-------|---------|
 * | `PORT` | `port` | 3001 |
 * | `DATABASE_URL` | `database_url` | `sqlite://kanban.db` |
 * | `JWT_SECRET` | `jwt_secret` | development placeholder |
 * | `STATIC_DIR` | `static_dir` | `.` |
 * | `BROADCAST_SCOPE` | `broadcast_scope` | `account` |
 * | `SMTP_HOST`, `SMTP_PORT`, `SMTP_USERNAME`, `SMTP_PASSWORD`, `SMTP_FROM` | `smtp` | unset |
 */

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::backend::realtime::BroadcastScope;

pub const DEFAULT_PORT: u16 = 3001;
const DEV_JWT_SECRET: &str = "your-default-secret-key-change-in-production";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid value for {key}: {message}")]
    Invalid { key: &'static str, message: String },
}

impl ConfigError {
    fn invalid(key: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            message: message.into(),
        }
    }
}

/// Per-connection tuning for realtime sessions
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Outbound queue depth before a session is treated as unresponsive
    pub queue_capacity: usize,
    /// Silence tolerated on the read side before the session is dropped
    pub pong_wait_secs: u64,
    /// Deadline for a single write
    pub write_wait_secs: u64,
    /// Largest inbound message accepted, in bytes
    pub max_message_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            pong_wait_secs: 60,
            write_wait_secs: 10,
            max_message_size: 1024 * 1024,
        }
    }
}

impl SessionConfig {
    pub fn pong_wait(&self) -> Duration {
        Duration::from_secs(self.pong_wait_secs)
    }

    /// Keep-alive period, nine tenths of `pong_wait`
    pub fn ping_period(&self) -> Duration {
        self.pong_wait() * 9 / 10
    }

    pub fn write_wait(&self) -> Duration {
        Duration::from_secs(self.write_wait_secs)
    }
}

/// Outgoing mail settings for magic links
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Sender address; falls back to `username`
    #[serde(default)]
    pub from: Option<String>,
}

fn default_smtp_port() -> u16 {
    587
}

impl SmtpConfig {
    pub fn sender(&self) -> &str {
        self.from
            .as_deref()
            .filter(|f| !f.is_empty())
            .unwrap_or(&self.username)
    }
}

/// Complete server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl_hours: u64,
    pub magic_link_ttl_minutes: u64,
    pub static_dir: PathBuf,
    pub broadcast_scope: BroadcastScope,
    pub session: SessionConfig,
    pub smtp: Option<SmtpConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            database_url: "sqlite://kanban.db".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_hours: 24 * 7,
            magic_link_ttl_minutes: 15,
            static_dir: PathBuf::from("."),
            broadcast_scope: BroadcastScope::default(),
            session: SessionConfig::default(),
            smtp: None,
        }
    }
}

impl ServerConfig {
    /// Load configuration from the optional file and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("KANBAN_CONFIG") {
            Ok(path) if !path.is_empty() => Self::from_file(Path::new(&path))?,
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.warn_on_dev_defaults();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `KEY=value` overrides from any lookup (the environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(port) = get("PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("PORT", format!("'{}' is not a port", port)))?;
        }
        if let Some(url) = get("DATABASE_URL") {
            self.database_url = url;
        }
        if let Some(secret) = get("JWT_SECRET") {
            self.jwt_secret = secret;
        }
        if let Some(dir) = get("STATIC_DIR") {
            self.static_dir = PathBuf::from(dir);
        }
        if let Some(scope) = get("BROADCAST_SCOPE") {
            self.broadcast_scope = scope
                .parse()
                .map_err(|e: String| ConfigError::invalid("BROADCAST_SCOPE", e))?;
        }

        if let Some(host) = get("SMTP_HOST") {
            let port = match get("SMTP_PORT") {
                Some(p) => p.trim().parse().map_err(|_| {
                    ConfigError::invalid("SMTP_PORT", format!("'{}' is not a port", p))
                })?,
                None => default_smtp_port(),
            };
            self.smtp = Some(SmtpConfig {
                host,
                port,
                username: get("SMTP_USERNAME").unwrap_or_default(),
                password: get("SMTP_PASSWORD").unwrap_or_default(),
                from: get("SMTP_FROM"),
            });
        }

        self.validate()
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session.queue_capacity == 0 {
            return Err(ConfigError::invalid("session.queue_capacity", "must be at least 1"));
        }
        if self.session.pong_wait_secs == 0 {
            return Err(ConfigError::invalid("session.pong_wait_secs", "must be at least 1"));
        }
        if self.token_ttl_hours == 0 {
            return Err(ConfigError::invalid("token_ttl_hours", "must be at least 1"));
        }
        Ok(())
    }

    fn warn_on_dev_defaults(&self) {
        if self.jwt_secret == DEV_JWT_SECRET {
            tracing::warn!("[Config] JWT_SECRET not set, using the development secret");
        }
        if self.smtp.is_none() {
            tracing::info!("[Config] SMTP not configured, magic links are only returned in responses");
        }
    }

    pub fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_hours * 3600)
    }

    pub fn magic_link_ttl(&self) -> Duration {
        Duration::from_secs(self.magic_link_ttl_minutes * 60)
    }
}
