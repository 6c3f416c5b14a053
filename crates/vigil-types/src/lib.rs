//! Shared identifiers and wire vocabulary for the vigil replicated counter
//! service.
//!
//! This crate defines the types every component (`vigil-server`,
//! `vigil-lfd`, `vigil-gfd`, `vigil-rm`, `vigil-client`) agrees on: replica
//! identity, the replication discipline, and the closed catalog of envelope
//! kinds that travel the wire. Unifying these in one place is what lets
//! `vigil-wire` provide a single codec instead of each component hand-rolling
//! its own `create_message`/`send`/`receive`.

use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

mod envelope;
mod replica_id;

pub use envelope::{Body, Envelope, ReplicaRef};
pub use replica_id::ReplicaId;

/// The two replication disciplines this service supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicationMode {
    /// Every replica executes every request independently; clients
    /// deduplicate replies.
    Active,
    /// A single primary executes requests and checkpoints to backups.
    Passive,
}

impl fmt::Display for ReplicationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplicationMode::Active => write!(f, "active"),
            ReplicationMode::Passive => write!(f, "passive"),
        }
    }
}

/// Error parsing a [`ReplicationMode`] from a configuration value.
#[derive(Debug, thiserror::Error)]
#[error("invalid replication mode {0:?}: expected \"active\" or \"passive\"")]
pub struct ParseReplicationModeError(pub String);

impl std::str::FromStr for ReplicationMode {
    type Err = ParseReplicationModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(ReplicationMode::Active),
            "passive" => Ok(ReplicationMode::Passive),
            other => Err(ParseReplicationModeError(other.to_string())),
        }
    }
}

/// A monotonic per-client request identifier, used for active-mode reply
/// deduplication and carried through on every client op/reply.
pub type RequestNumber = u64;

/// A passive-mode checkpoint sequence number (last-writer-wins at backups).
pub type Sequence = u64;

/// The wall-clock timestamp format every envelope carries, rendered exactly
/// as `YYYY-MM-DD HH:MM:SS` per the wire format (§6).
pub fn format_timestamp(time: DateTime<Local>) -> String {
    time.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Renders the current local time in the wire timestamp format.
pub fn now_timestamp() -> String {
    format_timestamp(Local::now())
}

/// Parses a wire timestamp back into a naive date-time, for components that
/// want to reason about message age. Malformed timestamps are not fatal:
/// callers should fall back to treating the message as "now".
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok()
}
