//! The Replication Manager (§4.4): elects the primary/reliable replica,
//! maintains the client-visible designation, and drives automatic recovery
//! attempts via GFD.

mod client_listener;
mod election;
mod error;
mod gfd_link;
mod state;

pub use error::{RmError, RmResult};
pub use state::{RmAction, RmState};

use std::sync::Arc;

use tokio::sync::broadcast;
use vigil_config::RmConfig;
use vigil_types::ReplicationMode;

/// Designation-change broadcast capacity. Generous relative to the handful
/// of fail-overs a 3-replica cluster can produce; a lagging client simply
/// re-reads the current designation via [`RmState::current_designation`]
/// rather than losing the update (see `client_listener`'s `Lagged` arm).
const DESIGNATION_CHANNEL_CAPACITY: usize = 16;

pub async fn run(config: RmConfig) -> RmResult<()> {
    let state = Arc::new(RmState::new());
    let (designation_tx, _) = broadcast::channel(DESIGNATION_CHANNEL_CAPACITY);

    tracing::info!(
        mode = %config.mode,
        gfd_addr = %config.gfd_listen_addr,
        client_addr = %config.client_listen_addr,
        "starting replication manager"
    );

    let gfd_task = tokio::spawn(gfd_link::run(
        config.gfd_listen_addr,
        config.mode,
        Arc::clone(&state),
        designation_tx.clone(),
    ));

    // Active-mode clients multicast directly to replicas and never talk to
    // RM (§4.5); the client-facing listener only has a reason to exist in
    // passive mode.
    if config.mode == ReplicationMode::Passive {
        let client_task = tokio::spawn(client_listener::run(
            config.client_listen_addr,
            Arc::clone(&state),
            designation_tx,
        ));
        tokio::select! {
            res = gfd_task => { res.expect("gfd link task panicked")?; },
            res = client_task => { res.expect("client listener task panicked")?; },
        }
    } else {
        gfd_task.await.expect("gfd link task panicked")?;
    }

    Ok(())
}
