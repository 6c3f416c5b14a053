//! The Local Fault Detector (§4.2): the sole bidirectional bridge between
//! one Server replica on a host and the GFD.

mod error;
mod gfd_client;
mod server_side;
mod state;

pub use error::{LfdError, LfdResult};

use std::sync::Arc;

use tokio::sync::mpsc;
use vigil_config::LfdConfig;

use state::ServerLink;

pub async fn run(config: LfdConfig) -> LfdResult<()> {
    let link = Arc::new(ServerLink::new());
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    tracing::info!(lfd_id = %config.lfd_id, "starting local fault detector");

    let gfd_task = tokio::spawn(gfd_client::run(
        config.gfd_addr,
        config.lfd_id.clone(),
        events_rx,
        Arc::clone(&link),
    ));

    server_side::run(
        config.server_listen_addr,
        config.lfd_id.clone(),
        config.heartbeat_interval,
        link,
        events_tx,
    )
    .await?;

    gfd_task.abort();
    Ok(())
}
