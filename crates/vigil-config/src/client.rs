use std::net::SocketAddr;

use vigil_types::{ReplicaId, ReplicationMode};

use crate::env::{all_replica_addrs, or_default, parse_or_default, socket_addr};
use crate::error::ConfigResult;

/// Configuration for a Client process.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub mode: ReplicationMode,
    /// A human-readable identifier for this client's `component_id`
    /// (defaults to a fixed string; multiple concurrent clients should set
    /// `MY_CLIENT_ID` distinctly so log lines and dedup tables are
    /// unambiguous).
    pub client_id: String,
    /// Active mode: every replica's client-facing address, dialed at
    /// startup.
    pub server_addrs: Vec<(ReplicaId, SocketAddr)>,
    /// Passive mode: the RM address this client listens to for
    /// `primary_server` notifications before following the designated
    /// primary.
    pub rm_addr: SocketAddr,
}

impl ClientConfig {
    pub fn from_env() -> ConfigResult<Self> {
        let mode: ReplicationMode = parse_or_default("VIGIL_MODE", ReplicationMode::Active)?;
        let client_id = or_default("MY_CLIENT_ID", "C1");

        let server_port: u16 = parse_or_default("SERVER_PORT", 12346)?;
        let server_addrs = all_replica_addrs(server_port)?;

        let rm_host = or_default("RM_IP", "127.0.0.1");
        let rm_client_port: u16 = parse_or_default("RM_CLIENT_PORT", 13579)?;
        let rm_addr = socket_addr(&rm_host, rm_client_port)?;

        Ok(Self { mode, client_id, server_addrs, rm_addr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn active_mode_lists_all_three_replicas() {
        std::env::set_var("VIGIL_MODE", "active");
        let cfg = ClientConfig::from_env().unwrap();
        assert_eq!(cfg.server_addrs.len(), 3);
        std::env::remove_var("VIGIL_MODE");
    }

    #[test]
    #[serial]
    fn passive_mode_defaults_rm_client_port() {
        std::env::set_var("VIGIL_MODE", "passive");
        std::env::remove_var("RM_CLIENT_PORT");
        let cfg = ClientConfig::from_env().unwrap();
        assert_eq!(cfg.rm_addr.port(), 13579);
        std::env::remove_var("VIGIL_MODE");
    }
}
