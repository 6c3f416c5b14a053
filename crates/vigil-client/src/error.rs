use thiserror::Error;

/// Errors a Client can hit. Transport/timeout errors on a single replica
/// connection are caught and logged at the task boundary that raises them
/// (§7) and never surface here; these variants are the ones a caller
/// issuing one request needs to see.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Config(#[from] vigil_config::ConfigError),

    #[error(transparent)]
    Wire(#[from] vigil_wire::WireError),

    /// Active mode: no replica answered this request before the
    /// deliver-first timeout elapsed.
    #[error("no replica replied before timeout")]
    NoReply,

    /// Passive mode: an operation was sent before the first
    /// `primary_server` notification arrived, so there is no connection to
    /// send it on yet.
    #[error("no primary known yet")]
    NoPrimaryKnown,
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;
