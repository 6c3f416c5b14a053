use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::sleep;
use vigil_config::ClientConfig;
use vigil_types::{Body, Envelope, ReplicaId, RequestNumber};
use vigil_wire::{Connection, WireResult};

use crate::dedup::ResponseTable;
use crate::error::{ClientError, ClientResult};

/// How long a dropped per-replica connection waits before retrying (§4.5:
/// "Reconnection to unreached replicas is attempted on a slow loop").
const RECONNECT_INTERVAL: Duration = Duration::from_secs(3);

/// How long [`ActiveClient::send_op`] waits for the first reply before
/// giving up (§8's scenarios all complete well within this).
const REPLY_TIMEOUT: Duration = Duration::from_secs(5);

/// The active-mode Client (§4.5): connects to all known replicas,
/// multicasts every operation, and delivers the first reply for each
/// `request_number` while silently discarding the rest.
pub struct ActiveClient {
    client_id: String,
    request_counter: AtomicU64,
    /// Currently-connected replicas' outbound channels. A replica is
    /// absent here while its connection task is between attempts (§4.5:
    /// "disconnected sockets are pruned").
    writers: Arc<Mutex<HashMap<ReplicaId, mpsc::UnboundedSender<Body>>>>,
    /// First-reply-wins bookkeeping (§3, §5: "owned by Client, accessed
    /// only by the Client's send/receive tasks").
    table: ResponseTable,
    /// One outstanding completion per in-flight `request_number`.
    pending: Mutex<HashMap<RequestNumber, oneshot::Sender<Envelope>>>,
}

impl ActiveClient {
    /// Connects to every replica named in `config.server_addrs` and starts
    /// this client's background connection-maintenance and reply-dispatch
    /// tasks. Replicas that are not reachable yet are retried in the
    /// background; `send_op` only ever targets whichever subset is
    /// connected at the moment it is called.
    pub fn connect(config: &ClientConfig) -> Arc<Self> {
        let writers = Arc::new(Mutex::new(HashMap::new()));
        let client = Arc::new(Self {
            client_id: config.client_id.clone(),
            request_counter: AtomicU64::new(1),
            writers: Arc::clone(&writers),
            table: ResponseTable::new(),
            pending: Mutex::new(HashMap::new()),
        });

        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();
        for &(id, addr) in &config.server_addrs {
            tokio::spawn(connection_loop(
                id,
                addr,
                client.client_id.clone(),
                incoming_tx.clone(),
                Arc::clone(&writers),
            ));
        }
        tokio::spawn(dispatch(Arc::clone(&client), incoming_rx));

        client
    }

    /// Sends one operation to every currently-connected replica and
    /// returns the first reply received for it. `make_body` is called once
    /// the `request_number` has been assigned, e.g.
    /// `|n| Body::Increase { request_number: n }`.
    pub async fn send_op(&self, make_body: impl Fn(RequestNumber) -> Body) -> ClientResult<Envelope> {
        let request_number = self.request_counter.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .expect("pending mutex is never poisoned")
            .insert(request_number, tx);

        let body = make_body(request_number);
        let senders: Vec<_> = self
            .writers
            .lock()
            .expect("writers mutex is never poisoned")
            .values()
            .cloned()
            .collect();
        for sender in &senders {
            // A send failing here means that replica's connection task is
            // mid-teardown; it will prune itself from `writers` shortly.
            let _ = sender.send(body.clone());
        }

        match tokio::time::timeout(REPLY_TIMEOUT, rx).await {
            Ok(Ok(envelope)) => Ok(envelope),
            _ => {
                self.pending
                    .lock()
                    .expect("pending mutex is never poisoned")
                    .remove(&request_number);
                Err(ClientError::NoReply)
            }
        }
    }

    /// Best-effort `exit` broadcast to every connected replica, for
    /// user-initiated cancellation (§4.5).
    pub fn send_exit(&self) {
        let senders: Vec<_> = self
            .writers
            .lock()
            .expect("writers mutex is never poisoned")
            .values()
            .cloned()
            .collect();
        for sender in senders {
            let _ = sender.send(Body::Exit);
        }
    }
}

async fn connection_loop(
    id: ReplicaId,
    addr: std::net::SocketAddr,
    client_id: String,
    incoming_tx: mpsc::UnboundedSender<(ReplicaId, Envelope)>,
    writers: Arc<Mutex<HashMap<ReplicaId, mpsc::UnboundedSender<Body>>>>,
) {
    loop {
        match Connection::connect(addr, client_id.clone(), Duration::from_secs(5)).await {
            Ok(mut conn) => {
                tracing::info!(replica = %id, "connected");
                let (tx, mut rx) = mpsc::unbounded_channel::<Body>();
                writers.lock().expect("writers mutex is never poisoned").insert(id, tx);

                let result = serve(&mut conn, &mut rx, id, &incoming_tx).await;

                writers.lock().expect("writers mutex is never poisoned").remove(&id);
                if let Err(e) = result {
                    tracing::warn!(replica = %id, error = %e, "connection lost");
                }
            }
            Err(e) => {
                tracing::debug!(replica = %id, error = %e, "connect failed, retrying");
            }
        }
        sleep(RECONNECT_INTERVAL).await;
    }
}

async fn serve(
    conn: &mut Connection,
    rx: &mut mpsc::UnboundedReceiver<Body>,
    id: ReplicaId,
    incoming_tx: &mpsc::UnboundedSender<(ReplicaId, Envelope)>,
) -> WireResult<()> {
    loop {
        tokio::select! {
            biased;

            outgoing = rx.recv() => {
                let Some(body) = outgoing else { return Ok(()) };
                conn.send(body).await?;
            }

            envelope = conn.recv() => {
                let Some(envelope) = envelope? else { return Ok(()) };
                let _ = incoming_tx.send((id, envelope));
            }
        }
    }
}

async fn dispatch(client: Arc<ActiveClient>, mut incoming_rx: mpsc::UnboundedReceiver<(ReplicaId, Envelope)>) {
    while let Some((replica_id, envelope)) = incoming_rx.recv().await {
        let Some(request_number) = request_number_of(&envelope.body) else {
            tracing::debug!(kind = envelope.body.kind_name(), "dropping reply with no request_number");
            continue;
        };

        let is_first = client.table.record(request_number, replica_id);
        if is_first {
            if let Some(tx) = client
                .pending
                .lock()
                .expect("pending mutex is never poisoned")
                .remove(&request_number)
            {
                let _ = tx.send(envelope);
            }
        } else {
            tracing::debug!(replica = %replica_id, request_number, "duplicate reply discarded");
        }
    }
}

fn request_number_of(body: &Body) -> Option<RequestNumber> {
    match *body {
        Body::StateIncreased { request_number, .. }
        | Body::StateDecreased { request_number, .. }
        | Body::StateUpdated { request_number, .. }
        | Body::Pong { request_number } => Some(request_number),
        _ => None,
    }
}
