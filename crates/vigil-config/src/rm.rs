use std::net::SocketAddr;

use vigil_types::ReplicationMode;

use crate::env::{parse_or_default, socket_addr};
use crate::error::ConfigResult;

/// Configuration for the (singleton) Replication Manager.
#[derive(Debug, Clone)]
pub struct RmConfig {
    pub mode: ReplicationMode,
    /// Bind address RM listens on for the GFD connection.
    pub gfd_listen_addr: SocketAddr,
    /// Bind address RM listens on for Client connections (passive mode
    /// only — active-mode clients never talk to RM).
    pub client_listen_addr: SocketAddr,
}

impl RmConfig {
    pub fn from_env() -> ConfigResult<Self> {
        let mode: ReplicationMode = parse_or_default("VIGIL_MODE", ReplicationMode::Active)?;

        let gfd_port: u16 = parse_or_default("RM_PORT", 12346)?;
        let gfd_listen_addr = socket_addr("0.0.0.0", gfd_port)?;

        let client_port: u16 = parse_or_default("RM_CLIENT_PORT", 13579)?;
        let client_listen_addr = socket_addr("0.0.0.0", client_port)?;

        Ok(Self { mode, gfd_listen_addr, client_listen_addr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn defaults_match_spec_port_table() {
        std::env::remove_var("RM_PORT");
        std::env::remove_var("RM_CLIENT_PORT");
        std::env::remove_var("VIGIL_MODE");

        let cfg = RmConfig::from_env().unwrap();
        assert_eq!(cfg.gfd_listen_addr.port(), 12346);
        assert_eq!(cfg.client_listen_addr.port(), 13579);
    }
}
