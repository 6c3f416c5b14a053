use thiserror::Error;

/// Errors raised by the envelope codec.
///
/// Every variant maps onto the "Transport error" category of §7: the
/// caller's policy is to close the affected link, log, and (for heartbeat
/// links) propagate the membership consequence — `vigil-wire` itself never
/// retries or panics.
#[derive(Debug, Error)]
pub enum WireError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed frame: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("connection closed by peer")]
    Closed,

    #[error("frame exceeded maximum size of {0} bytes")]
    FrameTooLarge(usize),
}

pub type WireResult<T> = std::result::Result<T, WireError>;
