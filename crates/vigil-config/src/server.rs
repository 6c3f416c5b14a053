use std::net::SocketAddr;
use std::time::Duration;

use vigil_types::{ReplicaId, ReplicationMode};

use crate::env::{all_replica_addrs, duration_secs_or_default, parse_or_default, replica_id_var, socket_addr};
use crate::error::ConfigResult;

/// Configuration for one Server replica process.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub server_id: ReplicaId,
    pub mode: ReplicationMode,
    /// Address of this host's LFD control port; the Server dials this on
    /// startup to register and then answers heartbeats.
    pub lfd_addr: SocketAddr,
    /// Bind address for the client-facing application port.
    pub client_listen_addr: SocketAddr,
    /// Bind address for the peer state-sync port (§6's separate port for
    /// `request_state`/checkpoint traffic).
    pub peer_listen_addr: SocketAddr,
    /// The peer-sync addresses of all three replicas, keyed by id, so a
    /// backup can reach the primary (or a late joiner can reach the
    /// reliable replica) without a discovery step.
    pub peer_addrs: Vec<(ReplicaId, SocketAddr)>,
    /// Passive-mode primary checkpoint cadence.
    pub checkpoint_interval: Duration,
}

impl ServerConfig {
    pub fn from_env() -> ConfigResult<Self> {
        let server_id = replica_id_var("MY_SERVER_ID")?;
        let mode: ReplicationMode = parse_or_default("VIGIL_MODE", ReplicationMode::Active)?;

        let lfd_host = crate::env::or_default("LFD_IP", "127.0.0.1");
        let lfd_port: u16 = parse_or_default("LFD_PORT", 54321)?;
        let lfd_addr = socket_addr(&lfd_host, lfd_port)?;

        let client_port: u16 = parse_or_default("SERVER_PORT", 12346)?;
        let client_listen_addr = socket_addr("0.0.0.0", client_port)?;

        let default_peer_port = match mode {
            ReplicationMode::Active => 12351,
            ReplicationMode::Passive => 12347,
        };
        let peer_port: u16 = parse_or_default("SERVER_PEER_PORT", default_peer_port)?;
        let peer_listen_addr = socket_addr("0.0.0.0", peer_port)?;
        let peer_addrs = all_replica_addrs(peer_port)?;

        let checkpoint_interval = duration_secs_or_default("CHECKPOINT_INTERVAL_SECS", 5)?;

        Ok(Self {
            server_id,
            mode,
            lfd_addr,
            client_listen_addr,
            peer_listen_addr,
            peer_addrs,
            checkpoint_interval,
        })
    }

    /// This replica's own peer-sync address, looked up from `peer_addrs`.
    ///
    /// `peer_addrs` is built from the fixed 3-replica set in `from_env` and
    /// always contains `server_id`; callers outside this module only ever
    /// see a `ServerConfig` produced by `from_env`.
    pub fn own_peer_addr(&self) -> SocketAddr {
        self.peer_addrs
            .iter()
            .find(|(id, _)| *id == self.server_id)
            .map(|(_, addr)| *addr)
            .expect("server_id is always present in peer_addrs")
    }

    /// The peer-sync addresses of the other two replicas.
    pub fn other_peer_addrs(&self) -> Vec<(ReplicaId, SocketAddr)> {
        self.peer_addrs
            .iter()
            .filter(|(id, _)| *id != self.server_id)
            .copied()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn defaults_match_spec_port_table_for_passive_mode() {
        std::env::set_var("MY_SERVER_ID", "S1");
        std::env::set_var("VIGIL_MODE", "passive");
        std::env::remove_var("SERVER_PEER_PORT");
        std::env::remove_var("SERVER_PORT");
        std::env::remove_var("LFD_PORT");

        let cfg = ServerConfig::from_env().unwrap();
        assert_eq!(cfg.client_listen_addr.port(), 12346);
        assert_eq!(cfg.peer_listen_addr.port(), 12347);
        assert_eq!(cfg.lfd_addr.port(), 54321);
        assert_eq!(cfg.server_id, ReplicaId::new(1));

        std::env::remove_var("MY_SERVER_ID");
        std::env::remove_var("VIGIL_MODE");
    }

    #[test]
    #[serial]
    fn active_mode_defaults_to_reliable_server_port() {
        std::env::set_var("MY_SERVER_ID", "S2");
        std::env::set_var("VIGIL_MODE", "active");
        std::env::remove_var("SERVER_PEER_PORT");

        let cfg = ServerConfig::from_env().unwrap();
        assert_eq!(cfg.peer_listen_addr.port(), 12351);

        std::env::remove_var("MY_SERVER_ID");
        std::env::remove_var("VIGIL_MODE");
    }

    #[test]
    #[serial]
    fn missing_server_id_is_an_error() {
        std::env::remove_var("MY_SERVER_ID");
        assert!(ServerConfig::from_env().is_err());
    }
}
