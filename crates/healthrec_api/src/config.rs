//! Server configuration from the process environment.
//!
//! # Responsibility
//! - Read `PORT` and `HEALTHREC_*` variables, with defaults for local runs.
//! - Reject malformed values at startup rather than at first use.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_DB_PATH: &str = "healthrec.sqlite3";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a valid port number, got `{value}`")]
    InvalidPort { var: &'static str, value: String },

    #[error("{var} must be an IP address, got `{value}`")]
    InvalidBindAddr { var: &'static str, value: String },

    #[error("{var} must not be empty")]
    Empty { var: &'static str },

    #[error("{var} must be an absolute path, got `{value}`")]
    RelativeLogDir { var: &'static str, value: String },
}

/// Resolved server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub bind_addr: IpAddr,
    pub db_path: PathBuf,
    pub log_level: String,
    /// Rolling log directory; logs go to stderr when `None`.
    pub log_dir: Option<PathBuf>,
}

impl ServerConfig {
    /// Loads `.env` when present, then reads the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match non_blank(&lookup, "PORT") {
            Some(value) => value.parse::<u16>().map_err(|_| ConfigError::InvalidPort {
                var: "PORT",
                value: value.clone(),
            })?,
            None => DEFAULT_PORT,
        };

        let bind_text = non_blank(&lookup, "HEALTHREC_BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_text
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidBindAddr {
                var: "HEALTHREC_BIND_ADDR",
                value: bind_text.clone(),
            })?;

        let db_path = match lookup("HEALTHREC_DB_PATH") {
            Some(value) if value.trim().is_empty() => {
                return Err(ConfigError::Empty {
                    var: "HEALTHREC_DB_PATH",
                })
            }
            Some(value) => PathBuf::from(value.trim()),
            None => PathBuf::from(DEFAULT_DB_PATH),
        };

        let log_level = non_blank(&lookup, "HEALTHREC_LOG_LEVEL")
            .unwrap_or_else(|| healthrec_core::default_log_level().to_string());

        let log_dir = match non_blank(&lookup, "HEALTHREC_LOG_DIR") {
            Some(value) => {
                let path = PathBuf::from(&value);
                if !path.is_absolute() {
                    return Err(ConfigError::RelativeLogDir {
                        var: "HEALTHREC_LOG_DIR",
                        value,
                    });
                }
                Some(path)
            }
            None => None,
        };

        Ok(Self {
            port,
            bind_addr,
            db_path,
            log_level,
            log_dir,
        })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}

fn non_blank<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
