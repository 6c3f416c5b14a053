use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::broadcast;
use vigil_types::{Body, ReplicaId};
use vigil_wire::{Connection, WireResult};

use crate::state::RmState;

/// Accepts Client connections (passive mode only, §4.4, §4.5): sends the
/// current designation immediately on connect (SPEC_FULL §11.4), then
/// forwards every subsequent designation change until the client
/// disconnects. Clients never send anything RM needs to act on; a read
/// returning `None` (or erroring) is simply "client disconnected", dropped
/// silently (§4.4 failure semantics).
pub async fn run(
    listen_addr: SocketAddr,
    state: Arc<RmState>,
    designation_tx: broadcast::Sender<ReplicaId>,
) -> WireResult<()> {
    let listener = vigil_wire::bind(listen_addr).await?;
    tracing::info!(addr = %listen_addr, "rm client-listener bound");

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let state = Arc::clone(&state);
        let designation_rx = designation_tx.subscribe();
        tokio::spawn(async move {
            if let Err(e) = serve_client(stream, state, designation_rx).await {
                tracing::debug!(%peer_addr, error = %e, "client connection ended");
            }
        });
    }
}

async fn serve_client(
    stream: tokio::net::TcpStream,
    state: Arc<RmState>,
    mut designation_rx: broadcast::Receiver<ReplicaId>,
) -> WireResult<()> {
    let mut conn = Connection::new(stream, "RM")?;

    if let Some(current) = state.current_designation() {
        conn.send(Body::PrimaryServer { primary_server: current }).await?;
    }

    loop {
        tokio::select! {
            biased;

            designated = designation_rx.recv() => {
                match designated {
                    Ok(id) => conn.send(Body::PrimaryServer { primary_server: id }).await?,
                    Err(broadcast::error::RecvError::Lagged(_)) => {
                        if let Some(current) = state.current_designation() {
                            conn.send(Body::PrimaryServer { primary_server: current }).await?;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => return Ok(()),
                }
            }

            envelope = conn.recv() => {
                if envelope?.is_none() {
                    return Ok(());
                }
            }
        }
    }
}
