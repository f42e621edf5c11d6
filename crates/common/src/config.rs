//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Redis configuration.
    pub redis: RedisConfig,
    /// Unread tracking configuration.
    #[serde(default)]
    pub note_read: NoteReadConfig,
    /// Worker configuration.
    #[serde(default)]
    pub worker: WorkerConfig,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Redis configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL.
    pub url: String,
    /// Key prefix for all Redis channels.
    #[serde(default = "default_redis_prefix")]
    pub prefix: String,
}

/// Unread tracking configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct NoteReadConfig {
    /// Delay before an "unread note" notice is published, in milliseconds.
    #[serde(default = "default_unread_notice_delay_ms")]
    pub unread_notice_delay_ms: u64,
    /// How long the active antenna list is cached, in seconds.
    #[serde(default = "default_antenna_cache_ttl_secs")]
    pub antenna_cache_ttl_secs: u64,
}

/// Worker configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkerConfig {
    /// Channel the worker reads commands from (defaults to `{prefix}:noteread:commands`).
    #[serde(default)]
    pub command_channel: Option<String>,
    /// Emit logs as JSON.
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for NoteReadConfig {
    fn default() -> Self {
        Self {
            unread_notice_delay_ms: default_unread_notice_delay_ms(),
            antenna_cache_ttl_secs: default_antenna_cache_ttl_secs(),
        }
    }
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

fn default_redis_prefix() -> String {
    "misskey".to_string()
}

const fn default_unread_notice_delay_ms() -> u64 {
    2000
}

const fn default_antenna_cache_ttl_secs() -> u64 {
    60
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `NOTEREAD_ENV`)
    /// 3. Environment variables with `NOTEREAD_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("NOTEREAD_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("NOTEREAD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("NOTEREAD")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Channel the worker consumes commands from.
    #[must_use]
    pub fn command_channel(&self) -> String {
        self.worker
            .command_channel
            .clone()
            .unwrap_or_else(|| format!("{}:noteread:commands", self.redis.prefix))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn from_toml(source: &str) -> Config {
        config::Config::builder()
            .add_source(config::File::from_str(source, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = from_toml(
            r#"
            [database]
            url = "postgres://localhost/misskey"

            [redis]
            url = "redis://localhost"
            "#,
        );

        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.redis.prefix, "misskey");
        assert_eq!(config.note_read.unread_notice_delay_ms, 2000);
        assert_eq!(config.note_read.antenna_cache_ttl_secs, 60);
        assert_eq!(config.command_channel(), "misskey:noteread:commands");
        assert!(!config.worker.json_logs);
    }

    #[test]
    fn test_overrides() {
        let config = from_toml(
            r#"
            [database]
            url = "postgres://localhost/misskey"

            [redis]
            url = "redis://localhost"
            prefix = "mk"

            [note_read]
            unread_notice_delay_ms = 500

            [worker]
            command_channel = "custom"
            "#,
        );

        assert_eq!(config.note_read.unread_notice_delay_ms, 500);
        assert_eq!(config.command_channel(), "custom");
    }
}
