use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, sleep_until, Instant};
use vigil_types::{Body, ReplicaId};
use vigil_wire::{Connection, WireResult};

use crate::membership::Membership;
use crate::registry::DirectiveRegistry;

/// Accepts LFD connections (§4.3: "accepts many LFD connections"). Each
/// connection gets its own task that heartbeats the LFD, applies its
/// `add replica`/`remove replica` events to the shared membership set, and
/// relays directives routed to it from RM.
pub async fn run(
    listen_addr: SocketAddr,
    heartbeat_interval: Duration,
    membership: Arc<Membership>,
    registry: Arc<DirectiveRegistry>,
    rm_tx: mpsc::UnboundedSender<Body>,
) -> WireResult<()> {
    let listener = vigil_wire::bind(listen_addr).await?;
    tracing::info!(addr = %listen_addr, "gfd lfd-listener bound");

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let membership = Arc::clone(&membership);
        let registry = Arc::clone(&registry);
        let rm_tx = rm_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_lfd(stream, heartbeat_interval, membership, registry, rm_tx).await {
                tracing::debug!(%peer_addr, error = %e, "lfd connection ended");
            }
        });
    }
}

async fn serve_lfd(
    stream: tokio::net::TcpStream,
    heartbeat_interval: Duration,
    membership: Arc<Membership>,
    registry: Arc<DirectiveRegistry>,
    rm_tx: mpsc::UnboundedSender<Body>,
) -> WireResult<()> {
    let mut conn = Connection::new(stream, "GFD")?;

    let Some(first) = conn.recv().await? else { return Ok(()) };
    if !matches!(first.body, Body::Register { .. }) {
        tracing::debug!("expected register as first message from lfd, dropping connection");
        return Ok(());
    }
    let lfd_id = first.component_id;
    tracing::info!(lfd_id = %lfd_id, "lfd registered");

    let (directive_tx, mut directive_rx) = mpsc::unbounded_channel();
    registry.set(lfd_id.clone(), directive_tx).await;

    let mut owned: Vec<ReplicaId> = Vec::new();
    let mut ticker = interval(heartbeat_interval);
    let mut deadline = Instant::now() + heartbeat_interval * 2;

    let result: WireResult<()> = loop {
        tokio::select! {
            biased;

            Some(directive) = directive_rx.recv() => {
                if let Err(e) = conn.send(directive).await {
                    break Err(e);
                }
            }

            _ = ticker.tick() => {
                if let Err(e) = conn.send(Body::Heartbeat).await {
                    break Err(e);
                }
            }

            () = sleep_until(deadline) => {
                tracing::warn!(lfd_id = %lfd_id, "lfd heartbeat timed out, treating as dead");
                break Ok(());
            }

            recv_result = conn.recv() => {
                match recv_result {
                    Err(e) => break Err(e),
                    Ok(None) => break Ok(()),
                    Ok(Some(envelope)) => {
                        deadline = Instant::now() + heartbeat_interval * 2;
                        apply_event(&lfd_id, envelope.body, &membership, &rm_tx, &mut owned);
                    }
                }
            }
        }
    };

    registry.clear(&lfd_id).await;
    for id in owned {
        let (_, count) = membership.remove(id);
        tracing::info!(lfd_id = %lfd_id, server_id = %id, member_count = count, "removing replica, lfd disconnected");
        let _ = rm_tx.send(Body::UpdateMembership { member_count: count, server_id: id });
    }

    result
}

fn apply_event(
    lfd_id: &str,
    body: Body,
    membership: &Membership,
    rm_tx: &mpsc::UnboundedSender<Body>,
    owned: &mut Vec<ReplicaId>,
) {
    match body {
        Body::HeartbeatAck => {}
        Body::AddReplica { message_data } => {
            let id = message_data.server_id;
            let (changed, count) = membership.add(id);
            if changed {
                owned.push(id);
            }
            tracing::info!(lfd_id = %lfd_id, server_id = %id, member_count = count, "add replica");
            let _ = rm_tx.send(Body::UpdateMembership { member_count: count, server_id: id });
        }
        Body::RemoveReplica { message_data } => {
            let id = message_data.server_id;
            let (_, count) = membership.remove(id);
            owned.retain(|existing| *existing != id);
            tracing::info!(lfd_id = %lfd_id, server_id = %id, member_count = count, "remove replica");
            let _ = rm_tx.send(Body::UpdateMembership { member_count: count, server_id: id });
        }
        other => {
            tracing::debug!(kind = other.kind_name(), "dropping unexpected lfd message");
        }
    }
}
