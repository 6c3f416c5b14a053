//! The Global Fault Detector (§4.3): authoritative replica membership and
//! the reliable transport of control directives between RM and LFDs.

mod error;
mod lfd_connection;
mod membership;
mod registry;
mod rm_client;

pub use error::{GfdError, GfdResult};
pub use membership::Membership;

use std::sync::Arc;

use tokio::sync::mpsc;
use vigil_config::GfdConfig;

use registry::DirectiveRegistry;

pub async fn run(config: GfdConfig) -> GfdResult<()> {
    let membership = Arc::new(Membership::new());
    let registry = Arc::new(DirectiveRegistry::new());
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    tracing::info!(addr = %config.listen_addr, rm_addr = %config.rm_addr, "starting global fault detector");

    let rm_task = tokio::spawn(rm_client::run(
        config.rm_addr,
        events_rx,
        Arc::clone(&membership),
        Arc::clone(&registry),
    ));

    lfd_connection::run(
        config.listen_addr,
        config.heartbeat_interval,
        membership,
        registry,
        events_tx,
    )
    .await?;

    rm_task.abort();
    Ok(())
}
