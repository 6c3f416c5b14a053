use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use vigil_types::ReplicaId;

use crate::error::{ConfigError, ConfigResult};

/// Reads a required environment variable.
pub(crate) fn required(var: &str) -> ConfigResult<String> {
    env::var(var).map_err(|_| ConfigError::MissingVar(var.to_string()))
}

/// Reads an environment variable, falling back to `default` if unset.
pub(crate) fn or_default(var: &str, default: &str) -> String {
    env::var(var).unwrap_or_else(|_| default.to_string())
}

/// Reads and parses an environment variable, falling back to `default` if
/// unset. A present-but-unparsable value is a hard configuration error.
pub(crate) fn parse_or_default<T>(var: &str, default: T) -> ConfigResult<T>
where
    T: FromStr,
{
    match env::var(var) {
        Err(_) => Ok(default),
        Ok(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { var: var.to_string(), value }),
    }
}

/// Reads the host configured for replica `id` (env vars `S1`/`S2`/`S3`),
/// defaulting to loopback for single-host development the way the original
/// prototype's scripts were run.
pub(crate) fn replica_host(id: ReplicaId) -> String {
    or_default(&id.to_string(), "127.0.0.1")
}

/// Resolves `host:port` into a [`SocketAddr`], accepting either a literal IP
/// or (best-effort, IP-only here — no DNS in a config loader) a dotted
/// address.
pub(crate) fn socket_addr(host: &str, port: u16) -> ConfigResult<SocketAddr> {
    let ip: IpAddr = host
        .parse()
        .map_err(|_| ConfigError::InvalidValue { var: "host".to_string(), value: host.to_string() })?;
    Ok(SocketAddr::new(ip, port))
}

/// Resolves a replica's identifier env var (`MY_SERVER_ID`, `MY_LFD_ID`)
/// into a [`ReplicaId`].
pub(crate) fn replica_id_var(var: &str) -> ConfigResult<ReplicaId> {
    let raw = required(var)?;
    raw.parse()
        .map_err(|_| ConfigError::InvalidValue { var: var.to_string(), value: raw })
}

pub(crate) fn duration_secs_or_default(var: &str, default_secs: u64) -> ConfigResult<Duration> {
    let secs: u64 = parse_or_default(var, default_secs)?;
    Ok(Duration::from_secs(secs))
}

/// The fixed 3-replica membership the original's three hardcoded host
/// variables (`S1`, `S2`, `S3`) describe. §6 fixes membership at 3 replicas;
/// dynamic membership beyond this set is an explicit non-goal (§1).
pub(crate) const REPLICA_IDS: [u16; 3] = [1, 2, 3];

pub(crate) fn all_replica_addrs(port: u16) -> ConfigResult<Vec<(ReplicaId, SocketAddr)>> {
    REPLICA_IDS
        .iter()
        .map(|&n| {
            let id = ReplicaId::new(n);
            let host = replica_host(id);
            socket_addr(&host, port).map(|addr| (id, addr))
        })
        .collect()
}
