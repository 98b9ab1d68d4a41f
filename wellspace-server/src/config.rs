//! Server configuration
//!
//! Read from `WELLSPACE_*` environment variables, optionally seeded from a
//! `.env` file. Only the token secret is mandatory.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use log::LevelFilter;
use wellspace_lib::auth::DEFAULT_TOKEN_TTL;

use crate::paths;

pub const ENV_BIND: &str = "WELLSPACE_BIND";
pub const ENV_DATABASE: &str = "WELLSPACE_DATABASE";
pub const ENV_TOKEN_SECRET: &str = "WELLSPACE_TOKEN_SECRET";
pub const ENV_TOKEN_TTL_SECS: &str = "WELLSPACE_TOKEN_TTL_SECS";
pub const ENV_SECURE_COOKIES: &str = "WELLSPACE_SECURE_COOKIES";
pub const ENV_LOG_LEVEL: &str = "WELLSPACE_LOG_LEVEL";

const DEFAULT_BIND: ([u8; 4], u16) = ([127, 0, 0, 1], 3000);
const DEFAULT_BODY_LIMIT: usize = 64 * 1024;
const MEMORY: &str = ":memory:";

/// Errors from loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("WELLSPACE_TOKEN_SECRET must be set")]
    MissingSecret,

    #[error("Invalid value for {key}: {value:?} ({reason})")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },
}

/// Where sessions and users are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Database {
    /// A SQLite file.
    File(PathBuf),
    /// An in-memory SQLite database, lost on exit.
    Memory,
}

impl Database {
    fn parse(raw: &str) -> Self {
        if raw == MEMORY {
            Self::Memory
        } else {
            Self::File(PathBuf::from(raw))
        }
    }
}

impl Default for Database {
    fn default() -> Self {
        match paths::database_file() {
            Some(path) => Self::File(path),
            None => Self::File(PathBuf::from("wellspace.db")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub database: Database,
    pub token_secret: String,
    pub token_ttl: Duration,
    /// Adds `Secure` to the token cookie.
    pub secure_cookies: bool,
    pub log_level: LevelFilter,
    /// Largest accepted request body, in bytes.
    pub body_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(DEFAULT_BIND),
            database: Database::default(),
            token_secret: String::new(),
            token_ttl: DEFAULT_TOKEN_TTL,
            secure_cookies: false,
            log_level: LevelFilter::Info,
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl ServerConfig {
    /// Loads `.env` if present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = Self {
            token_secret: get(ENV_TOKEN_SECRET).ok_or(ConfigError::MissingSecret)?,
            ..Self::default()
        };

        if let Some(raw) = get(ENV_BIND) {
            config.bind = parse(ENV_BIND, &raw)?;
        }
        if let Some(raw) = get(ENV_DATABASE) {
            config.database = Database::parse(&raw);
        }
        if let Some(raw) = get(ENV_TOKEN_TTL_SECS) {
            let secs: u64 = parse(ENV_TOKEN_TTL_SECS, &raw)?;
            if secs == 0 {
                return Err(ConfigError::Invalid {
                    key: ENV_TOKEN_TTL_SECS,
                    value: raw,
                    reason: "must be positive".to_string(),
                });
            }
            config.token_ttl = Duration::from_secs(secs);
        }
        if let Some(raw) = get(ENV_SECURE_COOKIES) {
            config.secure_cookies = parse_flag(ENV_SECURE_COOKIES, &raw)?;
        }
        if let Some(raw) = get(ENV_LOG_LEVEL) {
            config.log_level = parse(ENV_LOG_LEVEL, &raw)?;
        }
        Ok(config)
    }

    pub fn with_bind(mut self, bind: SocketAddr) -> Self {
        self.bind = bind;
        self
    }

    pub fn with_database(mut self, database: Database) -> Self {
        self.database = database;
        self
    }

    pub fn with_token_secret(mut self, secret: impl Into<String>) -> Self {
        self.token_secret = secret.into();
        self
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.token_ttl = ttl;
        self
    }

    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    pub fn with_log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_body_limit(mut self, limit: usize) -> Self {
        self.body_limit = limit;
        self
    }
}

fn parse<T>(key: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|err: T::Err| ConfigError::Invalid {
        key,
        value: raw.to_string(),
        reason: err.to_string(),
    })
}

fn parse_flag(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(pairs: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_secret_is_required() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingSecret)));
        assert!(matches!(
            load(&[(ENV_TOKEN_SECRET, "   ")]),
            Err(ConfigError::MissingSecret)
        ));
    }

    #[test]
    fn test_defaults() {
        let config = load(&[(ENV_TOKEN_SECRET, "s3cret")]).unwrap();
        assert_eq!(config.token_secret, "s3cret");
        assert_eq!(config.bind, "127.0.0.1:3000".parse().unwrap());
        assert_eq!(config.token_ttl, Duration::from_secs(3600));
        assert!(!config.secure_cookies);
        assert_eq!(config.log_level, LevelFilter::Info);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            (ENV_TOKEN_SECRET, "s3cret"),
            (ENV_BIND, "0.0.0.0:8080"),
            (ENV_DATABASE, ":memory:"),
            (ENV_TOKEN_TTL_SECS, "900"),
            (ENV_SECURE_COOKIES, "TRUE"),
            (ENV_LOG_LEVEL, "debug"),
        ])
        .unwrap();
        assert_eq!(config.bind.port(), 8080);
        assert_eq!(config.database, Database::Memory);
        assert_eq!(config.token_ttl, Duration::from_secs(900));
        assert!(config.secure_cookies);
        assert_eq!(config.log_level, LevelFilter::Debug);
    }

    #[test]
    fn test_invalid_values() {
        let err = load(&[(ENV_TOKEN_SECRET, "s"), (ENV_BIND, "nowhere")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: ENV_BIND, .. }));

        let err = load(&[(ENV_TOKEN_SECRET, "s"), (ENV_TOKEN_TTL_SECS, "0")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: ENV_TOKEN_TTL_SECS, .. }));

        let err = load(&[(ENV_TOKEN_SECRET, "s"), (ENV_SECURE_COOKIES, "maybe")]).unwrap_err();
        assert!(err.to_string().contains(ENV_SECURE_COOKIES));
    }
}
