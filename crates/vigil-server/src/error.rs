use thiserror::Error;

/// Errors a Server replica can hit. Transport/timeout errors are caught at
/// the task boundary that raises them (§7) and never reach `main` — this
/// enum exists for the handful of cases that are fatal to the whole
/// process.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] vigil_config::ConfigError),

    #[error(transparent)]
    Wire(#[from] vigil_wire::WireError),

    #[error("bind failed: {0}")]
    Bind(#[source] std::io::Error),
}

pub type ServerResult<T> = std::result::Result<T, ServerError>;
