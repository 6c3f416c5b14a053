use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use vigil_types::{Body, ReplicaId};
use vigil_wire::{Connection, WireResult};

use crate::state::ServerLink;

/// Accepts the (at most one, at a time) Server connection for this host and
/// runs its registration + heartbeat loop (§4.2).
pub async fn run(
    listen_addr: SocketAddr,
    lfd_id: String,
    heartbeat_interval: Duration,
    link: Arc<ServerLink>,
    gfd_tx: mpsc::UnboundedSender<Body>,
) -> WireResult<()> {
    let listener = vigil_wire::bind(listen_addr).await?;
    tracing::info!(lfd_id = %lfd_id, addr = %listen_addr, "server listener bound");

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let lfd_id = lfd_id.clone();
        let link = Arc::clone(&link);
        let gfd_tx = gfd_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_one_server(stream, lfd_id, heartbeat_interval, link, gfd_tx).await {
                tracing::debug!(%peer_addr, error = %e, "server connection ended");
            }
        });
    }
}

async fn serve_one_server(
    stream: tokio::net::TcpStream,
    lfd_id: String,
    heartbeat_interval: Duration,
    link: Arc<ServerLink>,
    gfd_tx: mpsc::UnboundedSender<Body>,
) -> WireResult<()> {
    let mut conn = Connection::new(stream, lfd_id.clone())?;

    let Some(envelope) = conn.recv().await? else {
        return Ok(());
    };
    let server_id: Option<ReplicaId> = envelope.component_id.parse().ok();
    if !matches!(envelope.body, Body::Register { .. }) || server_id.is_none() {
        tracing::debug!("expected register as first message from server, dropping connection");
        return Ok(());
    }
    let server_id = server_id.unwrap();

    tracing::info!(lfd_id = %lfd_id, server_id = %server_id, "server registered");
    let _ = gfd_tx.send(Body::AddReplica { message_data: vigil_types::ReplicaRef { server_id } });

    let (forward_tx, mut forward_rx) = mpsc::unbounded_channel();
    link.set(forward_tx).await;

    let result = heartbeat_loop(&mut conn, heartbeat_interval, &mut forward_rx).await;

    link.clear().await;
    let _ = gfd_tx.send(Body::RemoveReplica { message_data: vigil_types::ReplicaRef { server_id } });
    tracing::info!(lfd_id = %lfd_id, server_id = %server_id, "server removed from membership");

    result
}

async fn heartbeat_loop(
    conn: &mut Connection,
    heartbeat_interval: Duration,
    forward_rx: &mut mpsc::UnboundedReceiver<Body>,
) -> WireResult<()> {
    let mut ticker = tokio::time::interval(heartbeat_interval);
    loop {
        ticker.tick().await;
        conn.send(Body::Heartbeat).await?;

        // Forwarded directives (new_primary/new_reliable) can arrive at any
        // point; drain any pending ones so they are never delayed behind a
        // full heartbeat cycle.
        while let Ok(directive) = forward_rx.try_recv() {
            conn.send(directive).await?;
        }

        match conn.recv_timeout(heartbeat_interval).await {
            Ok(Some(envelope)) if envelope.body == Body::HeartbeatAck => {}
            Ok(Some(_other)) => {
                // Unexpected message in place of an ack; treat as a
                // protocol hiccup, not a dead server (§7: log and drop).
            }
            Ok(None) => return Ok(()),
            Err(e) => return Err(e),
        }
    }
}
