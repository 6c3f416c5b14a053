use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::sleep;
use vigil_config::ClientConfig;
use vigil_types::{Body, Envelope, ReplicaId, RequestNumber};
use vigil_wire::{Connection, WireResult};

use crate::error::{ClientError, ClientResult};

const RECONNECT_INTERVAL: Duration = Duration::from_secs(3);
const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// The passive-mode Client (§4.5): listens to RM for the current primary
/// and maintains exactly one application connection, to whichever replica
/// is currently designated.
pub struct PassiveClient {
    client_id: String,
    request_counter: AtomicU64,
    /// `None` until the first `primary_server` notification arrives (§4.5:
    /// "wait for the first `primary_server` notification, and only then
    /// open a connection"). A `tokio::sync::Mutex` because the lock is
    /// held across the connect/send/recv `.await` points below.
    conn: Mutex<Option<Connection>>,
}

impl PassiveClient {
    /// Connects to RM and starts following the primary it designates. The
    /// returned client has no application connection yet; [`send_op`]
    /// returns [`ClientError::NoPrimaryKnown`] until one is established.
    pub fn connect(config: &ClientConfig) -> Arc<Self> {
        let client = Arc::new(Self {
            client_id: config.client_id.clone(),
            request_counter: AtomicU64::new(1),
            conn: Mutex::new(None),
        });

        tokio::spawn(follow_primary(
            Arc::clone(&client),
            config.rm_addr,
            config.server_addrs.clone(),
        ));

        client
    }

    /// Sends one operation on the current primary connection and awaits
    /// its reply. Unlike active mode there is nothing to deduplicate:
    /// exactly one replica (the primary) ever answers.
    pub async fn send_op(&self, make_body: impl Fn(RequestNumber) -> Body) -> ClientResult<Envelope> {
        let request_number = self.request_counter.fetch_add(1, Ordering::Relaxed);
        let mut guard = self.conn.lock().await;
        let conn = guard.as_mut().ok_or(ClientError::NoPrimaryKnown)?;

        conn.send(make_body(request_number)).await?;
        match conn.recv_timeout(REPLY_TIMEOUT).await {
            Ok(Some(envelope)) => Ok(envelope),
            Ok(None) => {
                *guard = None;
                Err(ClientError::NoPrimaryKnown)
            }
            Err(e) => {
                *guard = None;
                Err(e.into())
            }
        }
    }

    /// Best-effort `exit` on the current primary connection (§4.5).
    pub async fn send_exit(&self) {
        let mut guard = self.conn.lock().await;
        if let Some(conn) = guard.as_mut() {
            let _ = conn.send(Body::Exit).await;
        }
    }
}

async fn follow_primary(client: Arc<PassiveClient>, rm_addr: SocketAddr, server_addrs: Vec<(ReplicaId, SocketAddr)>) {
    loop {
        match connect_and_follow(&client, rm_addr, &server_addrs).await {
            Ok(()) => tracing::info!("rm connection closed cleanly"),
            Err(e) => tracing::warn!(error = %e, "rm connection lost"),
        }
        sleep(RECONNECT_INTERVAL).await;
    }
}

async fn connect_and_follow(
    client: &Arc<PassiveClient>,
    rm_addr: SocketAddr,
    server_addrs: &[(ReplicaId, SocketAddr)],
) -> WireResult<()> {
    let mut rm_conn = Connection::connect(rm_addr, client.client_id.clone(), Duration::from_secs(5)).await?;
    tracing::info!("connected to rm, waiting for primary_server");

    loop {
        let Some(envelope) = rm_conn.recv().await? else {
            return Ok(());
        };
        match envelope.body {
            Body::PrimaryServer { primary_server } => {
                follow(client, primary_server, server_addrs).await;
            }
            other => {
                tracing::debug!(kind = other.kind_name(), "dropping unexpected rm message");
            }
        }
    }
}

/// Opens a connection to the newly-designated primary and installs it as
/// the client's active connection, dropping (and thereby closing) whatever
/// was there before (§4.5).
async fn follow(client: &Arc<PassiveClient>, primary: ReplicaId, server_addrs: &[(ReplicaId, SocketAddr)]) {
    let Some(&(_, addr)) = server_addrs.iter().find(|(id, _)| *id == primary) else {
        tracing::warn!(primary = %primary, "rm named a replica with no known address");
        return;
    };

    match Connection::connect(addr, client.client_id.clone(), Duration::from_secs(5)).await {
        Ok(new_conn) => {
            tracing::info!(primary = %primary, "following new primary");
            *client.conn.lock().await = Some(new_conn);
        }
        Err(e) => {
            tracing::warn!(primary = %primary, error = %e, "failed to connect to newly designated primary");
        }
    }
}
