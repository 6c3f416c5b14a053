//! The Server replica (§4.1): counter state, the active/passive request
//! executors, the passive-mode promotion state machine, the checkpoint
//! protocol, peer state sync, and the LFD heartbeat client.

mod client_listener;
mod error;
mod lfd_client;
mod peer;
mod state;

pub use error::{ServerError, ServerResult};
pub use state::{Counter, Promotion, PromotionState};

use std::sync::Arc;

use vigil_config::ServerConfig;

/// Runs one Server replica process to completion (it only returns on a
/// fatal bind failure; the per-connection and periodic tasks run forever
/// otherwise).
pub async fn run(config: ServerConfig) -> ServerResult<()> {
    let config = Arc::new(config);
    let counter = Arc::new(Counter::new());
    let promotion = Arc::new(PromotionState::new());

    tracing::info!(
        server_id = %config.server_id,
        mode = %config.mode,
        client_port = config.client_listen_addr.port(),
        peer_port = config.peer_listen_addr.port(),
        "starting server replica"
    );

    let lfd_task = tokio::spawn(lfd_client::run(
        Arc::clone(&config),
        Arc::clone(&counter),
        Arc::clone(&promotion),
    ));

    let peer_task = tokio::spawn(peer::run_peer_listener(
        config.peer_listen_addr,
        config.server_id,
        Arc::clone(&counter),
        Arc::clone(&promotion),
    ));

    let client_task = tokio::spawn(client_listener::run(
        config.client_listen_addr,
        config.server_id,
        config.mode,
        Arc::clone(&counter),
        Arc::clone(&promotion),
    ));

    tokio::select! {
        _ = lfd_task => {},
        res = peer_task => { res.expect("peer listener task panicked")?; },
        res = client_task => { res.expect("client listener task panicked")?; },
    }

    Ok(())
}
