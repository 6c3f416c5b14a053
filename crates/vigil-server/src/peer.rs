use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use vigil_types::{Body, ReplicaId, Sequence};
use vigil_wire::{Connection, WireError, WireResult};

use crate::state::{Counter, PromotionState};

/// Serves the peer state-sync port (§4.1, §6): answers `request_state` with
/// the current counter and applies inbound `checkpoint`s when this replica
/// is not primary.
pub async fn run_peer_listener(
    listen_addr: SocketAddr,
    self_id: ReplicaId,
    counter: Arc<Counter>,
    promotion: Arc<PromotionState>,
) -> WireResult<()> {
    let listener = vigil_wire::bind(listen_addr).await?;
    tracing::info!(server_id = %self_id, addr = %listen_addr, "peer sync listener bound");

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let counter = Arc::clone(&counter);
        let promotion = Arc::clone(&promotion);
        tokio::spawn(async move {
            if let Err(e) = serve_peer_connection(stream, self_id, counter, promotion).await {
                tracing::debug!(%peer_addr, error = %e, "peer connection ended");
            }
        });
    }
}

async fn serve_peer_connection(
    stream: tokio::net::TcpStream,
    self_id: ReplicaId,
    counter: Arc<Counter>,
    promotion: Arc<PromotionState>,
) -> WireResult<()> {
    let mut conn = Connection::new(stream, self_id.to_string())?;
    loop {
        let Some(envelope) = conn.recv().await? else {
            return Ok(());
        };
        match envelope.body {
            Body::RequestState => {
                conn.send(Body::StateResponse { state: counter.get() }).await?;
            }
            Body::Checkpoint { state, sequence } => {
                if promotion.is_primary() {
                    tracing::debug!(server_id = %self_id, "dropping checkpoint received while primary");
                } else {
                    counter.apply_checkpoint(state, sequence);
                }
                conn.send(Body::CheckpointAck).await?;
            }
            other => {
                tracing::debug!(kind = other.kind_name(), "dropping unexpected peer message");
            }
        }
    }
}

/// Issues `request_state` to `addr`, bounded by `deadline` (§4.1's bounded
/// startup sync timeout).
pub async fn request_state(
    addr: SocketAddr,
    self_id: ReplicaId,
    deadline: Duration,
) -> WireResult<i64> {
    let mut conn = Connection::connect(addr, self_id.to_string(), deadline).await?;
    conn.send(Body::RequestState).await?;
    match conn.recv_timeout(deadline).await? {
        Some(envelope) => match envelope.body {
            Body::StateResponse { state } => Ok(state),
            _ => Err(WireError::Closed),
        },
        None => Err(WireError::Closed),
    }
}

/// Starts the primary's checkpoint loop (§4.1): every `interval`, opens a
/// fresh connection to each backup and sends the current state. A missed
/// ack is logged and retried next cadence — never escalated, never
/// blocking request handling (SPEC_FULL §11.5).
pub fn start_checkpoint_loop(
    peers: Vec<(ReplicaId, SocketAddr)>,
    interval_dur: Duration,
    counter: Arc<Counter>,
    promotion: Arc<PromotionState>,
) {
    tokio::spawn(async move {
        let mut ticker = interval(interval_dur);
        let mut sequence: Sequence = 0;
        loop {
            ticker.tick().await;
            if !promotion.is_primary() {
                continue;
            }
            sequence += 1;
            let state = counter.get();
            for (peer_id, addr) in &peers {
                if let Err(e) = send_checkpoint(*addr, state, sequence).await {
                    tracing::warn!(peer = %peer_id, error = %e, "checkpoint delivery failed, retrying next cadence");
                }
            }
        }
    });
}

async fn send_checkpoint(addr: SocketAddr, state: i64, sequence: Sequence) -> WireResult<()> {
    let mut conn = Connection::connect(addr, "checkpoint", Duration::from_secs(2)).await?;
    conn.send(Body::Checkpoint { state, sequence: Some(sequence) }).await?;
    match conn.recv_timeout(Duration::from_secs(2)).await? {
        Some(envelope) if envelope.body == Body::CheckpointAck => Ok(()),
        _ => Err(WireError::Closed),
    }
}
