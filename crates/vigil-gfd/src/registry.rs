use std::collections::HashMap;

use tokio::sync::{mpsc, Mutex};
use vigil_types::{Body, ReplicaId};

/// Maps a connected LFD's identifier (`"LFD1"`, ...) to the channel its
/// connection task reads forwarded directives from, so RM-originated
/// `recover_server`/`new_primary`/`new_reliable` can be routed to "the LFD
/// whose identifier matches `LFD<suffix of server_id>`" (§4.3).
#[derive(Default)]
pub struct DirectiveRegistry {
    routes: Mutex<HashMap<String, mpsc::UnboundedSender<Body>>>,
}

impl DirectiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, lfd_id: String, tx: mpsc::UnboundedSender<Body>) {
        self.routes.lock().await.insert(lfd_id, tx);
    }

    pub async fn clear(&self, lfd_id: &str) {
        self.routes.lock().await.remove(lfd_id);
    }

    /// Routes `body` to the LFD owning `server_id`. Returns `false` if that
    /// LFD is not currently connected (logged and dropped by the caller,
    /// per §7's protocol-error policy).
    pub async fn route(&self, server_id: ReplicaId, body: Body) -> bool {
        let lfd_id = format!("LFD{}", server_id.number());
        let routes = self.routes.lock().await;
        match routes.get(&lfd_id) {
            Some(tx) => tx.send(body).is_ok(),
            None => false,
        }
    }
}
