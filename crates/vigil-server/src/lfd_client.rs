use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use vigil_config::ServerConfig;
use vigil_types::{Body, ReplicationMode};
use vigil_wire::Connection;

use crate::peer::{request_state, start_checkpoint_loop};
use crate::state::{Counter, PromotionState};

/// Maintains this replica's single connection to its local LFD for the
/// lifetime of the process: sends `register` on connect, answers
/// `heartbeat`, and applies `new_primary`/`new_reliable` directives to the
/// promotion state machine (§4.1, §4.2).
///
/// A dropped LFD connection is reconnected after a short backoff rather
/// than treated as fatal — the replica keeps serving client traffic while
/// its membership status lapses, exactly as §4.1's failure semantics
/// describe ("losing the LFD connection is fatal to this replica's
/// membership ... but not to in-flight requests").
pub async fn run(
    config: Arc<ServerConfig>,
    counter: Arc<Counter>,
    promotion: Arc<PromotionState>,
) {
    loop {
        match connect_and_serve(&config, &counter, &promotion).await {
            Ok(()) => tracing::info!(server_id = %config.server_id, "lfd connection closed cleanly"),
            Err(e) => tracing::warn!(server_id = %config.server_id, error = %e, "lfd connection lost"),
        }
        sleep(Duration::from_secs(1)).await;
    }
}

async fn connect_and_serve(
    config: &ServerConfig,
    counter: &Arc<Counter>,
    promotion: &Arc<PromotionState>,
) -> Result<(), vigil_wire::WireError> {
    let mut conn = Connection::connect(
        config.lfd_addr,
        config.server_id.to_string(),
        Duration::from_secs(5),
    )
    .await?;

    let checkpoint = match config.mode {
        ReplicationMode::Passive => Some(config.checkpoint_interval.as_secs()),
        ReplicationMode::Active => None,
    };
    conn.send(Body::Register { member_count: None, checkpoint }).await?;
    tracing::info!(server_id = %config.server_id, mode = %config.mode, "registered with lfd");

    loop {
        let Some(envelope) = conn.recv().await? else {
            return Ok(());
        };
        match envelope.body {
            Body::Heartbeat => {
                conn.send(Body::HeartbeatAck).await?;
            }
            Body::NewPrimary { server_id } | Body::NewReliable { server_id } => {
                handle_designation(config, counter, promotion, server_id).await;
            }
            other => {
                tracing::debug!(kind = other.kind_name(), "dropping unexpected lfd message");
            }
        }
    }
}

async fn handle_designation(
    config: &ServerConfig,
    counter: &Arc<Counter>,
    promotion: &Arc<PromotionState>,
    designated: vigil_types::ReplicaId,
) {
    let became_primary = promotion.apply_designation(config.server_id, designated);

    if became_primary {
        tracing::info!(server_id = %config.server_id, "promoted to primary");
        if config.mode == ReplicationMode::Passive {
            start_checkpoint_loop(
                config.other_peer_addrs(),
                config.checkpoint_interval,
                Arc::clone(counter),
                Arc::clone(promotion),
            );
        }
        return;
    }

    if designated != config.server_id {
        tracing::info!(server_id = %config.server_id, primary = %designated, "following primary, attempting state sync");
        if let Some((_, peer_addr)) = config
            .other_peer_addrs()
            .into_iter()
            .find(|(id, _)| *id == designated)
        {
            match request_state(peer_addr, config.server_id, Duration::from_secs(3)).await {
                Ok(state) => {
                    counter.set(state);
                    tracing::info!(server_id = %config.server_id, state, "synchronized state from primary");
                }
                Err(e) => {
                    tracing::warn!(server_id = %config.server_id, error = %e, "state sync timed out, proceeding with current state");
                }
            }
        }
    }
}
