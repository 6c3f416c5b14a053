//! Envelope codec for the vigil replicated counter service.
//!
//! Every component talks to every other component over the same wire shape:
//! one [`vigil_types::Envelope`] per newline-delimited TCP frame. This crate
//! owns that framing plus the send/receive logging convention described in
//! §10.1, so components never touch `TcpStream` or `serde_json` directly.

mod connection;
mod error;

pub use connection::{bind, Connection};
pub use error::{WireError, WireResult};

pub use vigil_types::{Body, Envelope, ReplicaRef};
