use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use vigil_types::Body;
use vigil_wire::{Connection, WireResult};

use crate::state::ServerLink;

/// Maintains this LFD's single connection to the GFD: registers on
/// connect, answers heartbeats, forwards membership events this LFD's
/// server-side task produces (via `events_rx`), and routes inbound
/// directives to the connected Server (§4.2, §4.3).
pub async fn run(
    gfd_addr: SocketAddr,
    lfd_id: String,
    mut events_rx: mpsc::UnboundedReceiver<Body>,
    link: Arc<ServerLink>,
) {
    loop {
        match connect_and_serve(gfd_addr, &lfd_id, &mut events_rx, &link).await {
            Ok(()) => tracing::info!(lfd_id = %lfd_id, "gfd connection closed cleanly"),
            Err(e) => tracing::warn!(lfd_id = %lfd_id, error = %e, "gfd connection lost"),
        }
        sleep(Duration::from_secs(1)).await;
    }
}

async fn connect_and_serve(
    gfd_addr: SocketAddr,
    lfd_id: &str,
    events_rx: &mut mpsc::UnboundedReceiver<Body>,
    link: &Arc<ServerLink>,
) -> WireResult<()> {
    let mut conn = Connection::connect(gfd_addr, lfd_id.to_string(), Duration::from_secs(5)).await?;
    conn.send(Body::Register { member_count: None, checkpoint: None }).await?;
    tracing::info!(lfd_id = %lfd_id, "registered with gfd");

    loop {
        tokio::select! {
            biased;

            event = events_rx.recv() => {
                let Some(event) = event else { return Ok(()) };
                conn.send(event).await?;
            }

            envelope = conn.recv() => {
                let Some(envelope) = envelope? else { return Ok(()) };
                match envelope.body {
                    Body::Heartbeat => conn.send(Body::HeartbeatAck).await?,
                    Body::RecoverServer { server_id } => {
                        tracing::info!(lfd_id = %lfd_id, server_id = %server_id, "initiating abstract recovery side-effect");
                    }
                    Body::NewPrimary { server_id } => {
                        if !link.forward(Body::NewPrimary { server_id }).await {
                            tracing::debug!(lfd_id = %lfd_id, server_id = %server_id, "no server connected to forward new_primary to");
                        }
                    }
                    Body::NewReliable { server_id } => {
                        if !link.forward(Body::NewReliable { server_id }).await {
                            tracing::debug!(lfd_id = %lfd_id, server_id = %server_id, "no server connected to forward new_reliable to");
                        }
                    }
                    other => {
                        tracing::debug!(kind = other.kind_name(), "dropping unexpected gfd message");
                    }
                }
            }
        }
    }
}
