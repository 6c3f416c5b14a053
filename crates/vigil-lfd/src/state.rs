use tokio::sync::{mpsc, Mutex};
use vigil_types::Body;

/// The one Server connection an LFD can have at a time, shared between the
/// accept/heartbeat task (which owns the socket) and the GFD-client task
/// (which forwards `recover_server`/`new_primary`/`new_reliable` onto it).
///
/// `None` means no Server is currently connected; directives addressed to
/// it are logged and dropped rather than queued, matching §7's "protocol
/// error: log and drop, never crash" for a message with nowhere to go.
#[derive(Default)]
pub struct ServerLink {
    tx: Mutex<Option<mpsc::UnboundedSender<Body>>>,
}

impl ServerLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, tx: mpsc::UnboundedSender<Body>) {
        *self.tx.lock().await = Some(tx);
    }

    pub async fn clear(&self) {
        *self.tx.lock().await = None;
    }

    /// Forwards `body` to the connected Server, if any. Returns `false` if
    /// there was nobody to forward to.
    pub async fn forward(&self, body: Body) -> bool {
        let guard = self.tx.lock().await;
        match guard.as_ref() {
            Some(tx) => tx.send(body).is_ok(),
            None => false,
        }
    }
}
