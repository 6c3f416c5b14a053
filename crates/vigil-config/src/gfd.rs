use std::net::SocketAddr;
use std::time::Duration;

use crate::env::{duration_secs_or_default, or_default, parse_or_default, socket_addr};
use crate::error::ConfigResult;

/// Configuration for the (singleton) Global Fault Detector.
#[derive(Debug, Clone)]
pub struct GfdConfig {
    /// Bind address GFD listens on for LFD connections.
    pub listen_addr: SocketAddr,
    /// Address of the RM this GFD reports `update_membership` to and
    /// receives `recover_server`/`new_primary`/`new_reliable` directives
    /// from.
    pub rm_addr: SocketAddr,
    /// Heartbeat cadence GFD uses against each connected LFD.
    pub heartbeat_interval: Duration,
}

impl GfdConfig {
    pub fn from_env() -> ConfigResult<Self> {
        let listen_port: u16 = parse_or_default("GFD_PORT", 12345)?;
        let listen_addr = socket_addr("0.0.0.0", listen_port)?;

        let rm_host = or_default("RM_IP", "127.0.0.1");
        let rm_port: u16 = parse_or_default("RM_PORT", 12346)?;
        let rm_addr = socket_addr(&rm_host, rm_port)?;

        let heartbeat_interval = duration_secs_or_default("HEARTBEAT_INTERVAL_SECS", 2)?;

        Ok(Self { listen_addr, rm_addr, heartbeat_interval })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn defaults_match_spec_port_table() {
        std::env::remove_var("GFD_PORT");
        std::env::remove_var("RM_PORT");

        let cfg = GfdConfig::from_env().unwrap();
        assert_eq!(cfg.listen_addr.port(), 12345);
        assert_eq!(cfg.rm_addr.port(), 12346);
    }
}
