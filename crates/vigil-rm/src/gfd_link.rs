use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::broadcast;
use vigil_types::{Body, ReplicaId, ReplicationMode};
use vigil_wire::{Connection, WireResult};

use crate::state::RmState;

/// Accepts the GFD connection (§4.4: "accepts one GFD connection") and
/// serializes every `register`/`update_membership` event from it through
/// [`RmState`], emitting `recover_server` and `new_primary`/`new_reliable`
/// back to GFD and broadcasting designation changes to the client-facing
/// side over `designation_tx`.
pub async fn run(
    listen_addr: SocketAddr,
    mode: ReplicationMode,
    state: Arc<RmState>,
    designation_tx: broadcast::Sender<ReplicaId>,
) -> WireResult<()> {
    let listener = vigil_wire::bind(listen_addr).await?;
    tracing::info!(addr = %listen_addr, "rm gfd-listener bound");

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let state = Arc::clone(&state);
        let designation_tx = designation_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = serve_gfd(stream, mode, state, designation_tx).await {
                tracing::debug!(%peer_addr, error = %e, "gfd connection ended");
            }
        });
    }
}

async fn serve_gfd(
    stream: tokio::net::TcpStream,
    mode: ReplicationMode,
    state: Arc<RmState>,
    designation_tx: broadcast::Sender<ReplicaId>,
) -> WireResult<()> {
    let mut conn = Connection::new(stream, "RM")?;
    tracing::info!("gfd connected");

    loop {
        let Some(envelope) = conn.recv().await? else {
            return Ok(());
        };
        match envelope.body {
            Body::Register { member_count, .. } => {
                state.handle_register(member_count);
                tracing::info!(member_count = member_count.unwrap_or(0), "gfd registered");
            }
            Body::UpdateMembership { member_count, server_id } => {
                let action = state.handle_update_membership(member_count, server_id);

                if let Some(dead) = action.recover {
                    tracing::info!(server_id = %dead, "requesting recovery");
                    conn.send(Body::RecoverServer { server_id: dead }).await?;
                }
                if action.cleared {
                    tracing::warn!("{}", crate::error::RmError::NoCandidates);
                }

                if let Some(designated) = action.designated {
                    tracing::info!(server_id = %designated, mode = %mode, "new designation elected");
                    let directive = match mode {
                        ReplicationMode::Passive => Body::NewPrimary { server_id: designated },
                        ReplicationMode::Active => Body::NewReliable { server_id: designated },
                    };
                    conn.send(directive).await?;
                    let _ = designation_tx.send(designated);
                }
            }
            other => {
                tracing::debug!(kind = other.kind_name(), "dropping unexpected gfd message");
            }
        }
    }
}
