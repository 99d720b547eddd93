//! Runtime configuration.
//!
//! Settings come from `bookcase.toml` (every table optional, every field
//! defaulted) and are then overridden by environment variables:
//!
//! | Variable | Setting |
//! |----------|---------|
//! | `HOST`, `PORT` | `server.host`, `server.port` |
//! | `STATIC_DIR` | `server.static_dir` |
//! | `REPOSITORY_TYPE` | `repository.type` |
//! | `DATABASE_URL` / `PG_DATABASE_URL`, `PG_*` | `[postgres]` |
//! | `REDIS_URL` | `redis.url` |
//!
//! Without a Redis URL the in-process cache and publisher are used.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::cache::RedisSettings;
use crate::db::{PostgresConfig, RepositoryType};

pub const CONFIG_FILE_NAME: &str = "bookcase.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub repository: RepositorySettings,
    pub postgres: PostgresSettings,
    pub redis: RedisSettings,
    pub events: EventSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Directory served read-only under `/static`.
    pub static_dir: Option<PathBuf>,
    pub body_limit_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            static_dir: None,
            body_limit_bytes: 2 * 1024 * 1024,
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RepositorySettings {
    #[serde(rename = "type")]
    pub repo_type: Option<RepositoryType>,
}

/// Postgres connection settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PostgresSettings {
    pub database_url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout: u64,
    pub idle_timeout: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for PostgresSettings {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout: 30,
            idle_timeout: 600,
            max_retries: 3,
            retry_delay_ms: 100,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventSettings {
    /// Events buffered per `/events` subscriber before the oldest are dropped.
    pub feed_capacity: usize,
    pub keep_alive_secs: u64,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            feed_capacity: 256,
            keep_alive_secs: 15,
        }
    }
}

impl AppConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {}", path.display()))
    }

    /// First `bookcase.toml` found in `.`, `backend/` or `..`.
    pub fn find_default_file() -> Option<PathBuf> {
        [
            PathBuf::from(CONFIG_FILE_NAME),
            PathBuf::from("backend").join(CONFIG_FILE_NAME),
            PathBuf::from("..").join(CONFIG_FILE_NAME),
        ]
        .into_iter()
        .find(|path| path.exists())
    }

    /// Default file if present (built-in defaults otherwise), then the
    /// environment on top.
    pub fn load() -> Result<Self> {
        let mut config = match Self::find_default_file() {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading configuration");
                Self::from_file(&path)?
            }
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(host) = std::env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            self.server.port = port
                .parse()
                .with_context(|| format!("PORT must be a port number, got '{}'", port))?;
        }
        if let Ok(dir) = std::env::var("STATIC_DIR") {
            self.server.static_dir = Some(PathBuf::from(dir));
        }
        if let Ok(kind) = std::env::var("REPOSITORY_TYPE") {
            let parsed = kind.parse::<RepositoryType>().map_err(anyhow::Error::msg)?;
            self.repository.repo_type = Some(parsed);
        }
        if let Ok(url) = std::env::var("REDIS_URL") {
            self.redis.url = url;
        }
        self.apply_postgres_env();
        Ok(())
    }

    fn apply_postgres_env(&mut self) {
        fn parse<T: std::str::FromStr>(key: &str) -> Option<T> {
            std::env::var(key).ok().and_then(|v| v.parse().ok())
        }

        let pg = &mut self.postgres;
        if let Ok(url) =
            std::env::var("DATABASE_URL").or_else(|_| std::env::var("PG_DATABASE_URL"))
        {
            pg.database_url = url;
        }
        if let Some(v) = parse("PG_POOL_MAX") {
            pg.max_connections = v;
        }
        if let Some(v) = parse("PG_POOL_MIN") {
            pg.min_connections = v;
        }
        if let Some(v) = parse("PG_CONN_TIMEOUT_SEC") {
            pg.connect_timeout = v;
        }
        if let Some(v) = parse("PG_IDLE_TIMEOUT_SEC") {
            pg.idle_timeout = v;
        }
        if let Some(v) = parse("PG_MAX_RETRIES") {
            pg.max_retries = v;
        }
        if let Some(v) = parse("PG_RETRY_DELAY_MS") {
            pg.retry_delay_ms = v;
        }
    }

    /// Explicit type, else Postgres when a database URL is configured.
    pub fn repository_type(&self) -> RepositoryType {
        match self.repository.repo_type {
            Some(ty) => ty,
            None if !self.postgres.database_url.is_empty() => RepositoryType::Postgres,
            None => RepositoryType::Local,
        }
    }

    #[cfg(feature = "postgres-repo")]
    pub fn postgres_config(&self) -> PostgresConfig {
        let pg = &self.postgres;
        PostgresConfig {
            database_url: pg.database_url.clone(),
            max_pool_size: pg.max_connections,
            min_pool_size: pg.min_connections,
            connection_timeout_sec: pg.connect_timeout,
            idle_timeout_sec: pg.idle_timeout,
            max_retries: pg.max_retries,
            retry_delay_ms: pg.retry_delay_ms,
        }
    }

    #[cfg(not(feature = "postgres-repo"))]
    pub fn postgres_config(&self) -> PostgresConfig {
        PostgresConfig {
            database_url: self.postgres.database_url.clone(),
        }
    }
}
