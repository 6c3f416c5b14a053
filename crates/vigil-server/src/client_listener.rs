use std::net::SocketAddr;
use std::sync::Arc;

use vigil_types::{Body, ReplicaId, ReplicationMode};
use vigil_wire::{Connection, WireResult};

use crate::state::{Counter, PromotionState};

/// Serves the client-facing application port (§4.1, §6). Each connection is
/// handled by its own task; ordering within one connection is preserved
/// because that task reads and replies sequentially.
pub async fn run(
    listen_addr: SocketAddr,
    self_id: ReplicaId,
    mode: ReplicationMode,
    counter: Arc<Counter>,
    promotion: Arc<PromotionState>,
) -> WireResult<()> {
    let listener = vigil_wire::bind(listen_addr).await?;
    tracing::info!(server_id = %self_id, addr = %listen_addr, "client listener bound");

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let counter = Arc::clone(&counter);
        let promotion = Arc::clone(&promotion);
        tokio::spawn(async move {
            if let Err(e) = serve_client(stream, self_id, mode, counter, promotion).await {
                tracing::debug!(%peer_addr, error = %e, "client connection ended");
            }
        });
    }
}

async fn serve_client(
    stream: tokio::net::TcpStream,
    self_id: ReplicaId,
    mode: ReplicationMode,
    counter: Arc<Counter>,
    promotion: Arc<PromotionState>,
) -> WireResult<()> {
    let mut conn = Connection::new(stream, self_id.to_string())?;
    loop {
        let Some(envelope) = conn.recv().await? else {
            return Ok(());
        };

        let may_execute = match mode {
            ReplicationMode::Active => true,
            ReplicationMode::Passive => promotion.is_primary(),
        };

        match envelope.body {
            Body::Increase { request_number } if may_execute => {
                let state = counter.increase();
                conn.send(Body::StateIncreased { state, request_number }).await?;
            }
            Body::Decrease { request_number } if may_execute => {
                let state = counter.decrease();
                conn.send(Body::StateDecreased { state, request_number }).await?;
            }
            Body::Update { request_number } if may_execute => {
                // `update` is an alias for `increase` (SPEC_FULL §11.1).
                let state = counter.increase();
                conn.send(Body::StateUpdated { state, request_number }).await?;
            }
            Body::Ping { request_number } if may_execute => {
                conn.send(Body::Pong { request_number }).await?;
            }
            Body::Increase { .. } | Body::Decrease { .. } | Body::Update { .. } | Body::Ping { .. } => {
                log_ignored_backup_traffic(self_id, envelope.body);
            }
            Body::Exit => return Ok(()),
            other => {
                tracing::debug!(kind = other.kind_name(), "dropping unexpected client message");
            }
        }
    }
}

fn log_ignored_backup_traffic(self_id: ReplicaId, body: Body) {
    tracing::debug!(server_id = %self_id, kind = body.kind_name(), "backup ignoring client traffic");
}
