use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use vigil_types::Body;
use vigil_wire::{Connection, WireResult};

use crate::membership::Membership;
use crate::registry::DirectiveRegistry;

/// Maintains GFD's single connection to RM: registers the initial member
/// count on connect, forwards `update_membership` events produced by the
/// LFD-connection tasks, and routes inbound directives to the LFD owning
/// the named replica (§4.3, §4.4).
pub async fn run(
    rm_addr: SocketAddr,
    mut events_rx: mpsc::UnboundedReceiver<Body>,
    membership: Arc<Membership>,
    registry: Arc<DirectiveRegistry>,
) {
    loop {
        match connect_and_serve(rm_addr, &mut events_rx, &membership, &registry).await {
            Ok(()) => tracing::info!("rm connection closed cleanly"),
            Err(e) => tracing::warn!(error = %e, "rm connection lost"),
        }
        sleep(Duration::from_secs(1)).await;
    }
}

async fn connect_and_serve(
    rm_addr: SocketAddr,
    events_rx: &mut mpsc::UnboundedReceiver<Body>,
    membership: &Arc<Membership>,
    registry: &Arc<DirectiveRegistry>,
) -> WireResult<()> {
    let mut conn = Connection::connect(rm_addr, "GFD", Duration::from_secs(5)).await?;
    conn.send(Body::Register { member_count: Some(membership.count()), checkpoint: None }).await?;
    tracing::info!("registered with rm");

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
                    Body::RecoverServer { server_id } => {
                        registry.route(server_id, Body::RecoverServer { server_id }).await;
                    }
                    Body::NewPrimary { server_id } => {
                        registry.route(server_id, Body::NewPrimary { server_id }).await;
                    }
                    Body::NewReliable { server_id } => {
                        registry.route(server_id, Body::NewReliable { server_id }).await;
                    }
                    other => {
                        tracing::debug!(kind = other.kind_name(), "dropping unexpected rm message");
                    }
                }
            }
        }
    }
}
