use std::net::SocketAddr;
use std::time::Duration;

use crate::env::{duration_secs_or_default, or_default, parse_or_default, socket_addr};
use crate::error::{ConfigError, ConfigResult};

/// Configuration for one Local Fault Detector process (one per host).
#[derive(Debug, Clone)]
pub struct LfdConfig {
    /// This LFD's own identifier (`LFD1`, `LFD2`, `LFD3`), used as its
    /// `component_id` and to name itself to the GFD.
    pub lfd_id: String,
    /// Bind address this LFD listens on for its local Server's register and
    /// heartbeat-acknowledgment traffic.
    pub server_listen_addr: SocketAddr,
    /// Address of the GFD this LFD reports membership events to.
    pub gfd_addr: SocketAddr,
    /// Heartbeat cadence and the matching dead-detection timeout (§4.2:
    /// "no well-formed reply within one heartbeat interval").
    pub heartbeat_interval: Duration,
}

impl LfdConfig {
    pub fn from_env() -> ConfigResult<Self> {
        let lfd_id = required_lfd_id()?;
        let server_port: u16 = parse_or_default("LFD_PORT", 54321)?;
        let server_listen_addr = socket_addr("0.0.0.0", server_port)?;

        let gfd_host = or_default("GFD_IP", "127.0.0.1");
        let gfd_port: u16 = parse_or_default("GFD_PORT", 12345)?;
        let gfd_addr = socket_addr(&gfd_host, gfd_port)?;

        let heartbeat_interval = duration_secs_or_default("HEARTBEAT_INTERVAL_SECS", 2)?;

        Ok(Self {
            lfd_id,
            server_listen_addr,
            gfd_addr,
            heartbeat_interval,
        })
    }
}

fn required_lfd_id() -> ConfigResult<String> {
    let raw = crate::env::required("MY_LFD_ID")?;
    if raw.starts_with("LFD") && raw["LFD".len()..].parse::<u16>().is_ok() {
        Ok(raw)
    } else {
        Err(ConfigError::InvalidValue { var: "MY_LFD_ID".to_string(), value: raw })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn defaults_match_spec_port_table() {
        std::env::set_var("MY_LFD_ID", "LFD2");
        std::env::remove_var("LFD_PORT");
        std::env::remove_var("GFD_PORT");

        let cfg = LfdConfig::from_env().unwrap();
        assert_eq!(cfg.server_listen_addr.port(), 54321);
        assert_eq!(cfg.gfd_addr.port(), 12345);
        assert_eq!(cfg.lfd_id, "LFD2");

        std::env::remove_var("MY_LFD_ID");
    }

    #[test]
    #[serial]
    fn rejects_malformed_lfd_id() {
        std::env::set_var("MY_LFD_ID", "frobnicate");
        assert!(LfdConfig::from_env().is_err());
        std::env::remove_var("MY_LFD_ID");
    }
}
