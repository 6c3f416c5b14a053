use std::net::SocketAddr;
use thiserror::Error;

/// Configuration errors. Every variant is fatal at process startup (§7):
/// callers propagate these straight out of `main()` via `anyhow`, never
/// retry them.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(String),

    #[error("invalid value for environment variable {var}: {value:?}")]
    InvalidValue { var: String, value: String },

    #[error("failed to bind {0}: {1}")]
    Bind(SocketAddr, #[source] std::io::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
