use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};

use vigil_types::{Body, Envelope};

use crate::error::{WireError, WireResult};

/// One whole envelope per line. This is the frame boundary the original
/// prototype never had (its `recv(1024)` + best-effort `json.loads` is the
/// "unbounded recv with JSON decode" anti-pattern flagged in DESIGN NOTES
/// §9); newline-delimited framing guarantees every `recv` yields exactly one
/// parsed envelope or a clean error, never a partial one.
const MAX_FRAME_BYTES: usize = 64 * 1024;

/// A framed, bidirectional envelope connection over one TCP socket.
///
/// Every long-lived connection described in §5 (LFD→GFD, Server→LFD,
/// Client→Server, GFD→RM, Client→RM, primary→backup checkpoint) is backed by
/// one `Connection`, owned by exactly one task that serializes reads and
/// writes on it.
pub struct Connection {
    framed: Framed<TcpStream, LinesCodec>,
    /// This side's component id, used only for log lines.
    local_id: String,
    /// The peer's address, used only for log lines.
    peer: SocketAddr,
}

impl Connection {
    /// Wraps an already-connected socket.
    pub fn new(stream: TcpStream, local_id: impl Into<String>) -> WireResult<Self> {
        let peer = stream.peer_addr()?;
        let codec = LinesCodec::new_with_max_length(MAX_FRAME_BYTES);
        Ok(Self {
            framed: Framed::new(stream, codec),
            local_id: local_id.into(),
            peer,
        })
    }

    /// Connects to `addr`, bounded by `connect_timeout`.
    pub async fn connect(
        addr: SocketAddr,
        local_id: impl Into<String>,
        connect_timeout: Duration,
    ) -> WireResult<Self> {
        let stream = timeout(connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| WireError::Io(std::io::Error::new(std::io::ErrorKind::TimedOut, "connect timed out")))??;
        Self::new(stream, local_id)
    }

    /// The remote peer's socket address, for logging.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// Sends one envelope, logging it at `trace` level the way the
    /// original's `print_log` did for every sent message.
    pub async fn send(&mut self, body: Body) -> WireResult<()> {
        let envelope = Envelope::new(self.local_id.clone(), body);
        let line = serde_json::to_string(&envelope)?;
        tracing::trace!(
            component_id = %self.local_id,
            peer = %self.peer,
            kind = envelope.kind_name(),
            direction = "sent",
            "envelope"
        );
        self.framed.send(line).await.map_err(map_lines_error)?;
        Ok(())
    }

    /// Receives the next envelope, or `Ok(None)` if the peer closed the
    /// connection cleanly.
    pub async fn recv(&mut self) -> WireResult<Option<Envelope>> {
        match self.framed.next().await {
            None => Ok(None),
            Some(Err(e)) => Err(map_lines_error(e)),
            Some(Ok(line)) => {
                let envelope: Envelope = serde_json::from_str(&line)?;
                tracing::trace!(
                    component_id = %self.local_id,
                    peer = %self.peer,
                    kind = envelope.kind_name(),
                    direction = "received",
                    "envelope"
                );
                Ok(Some(envelope))
            }
        }
    }

    /// Receives the next envelope, bounded by `deadline`. Used for the
    /// heartbeat-loss detection in §4.2/§5 and the bounded peer state-sync
    /// timeout in §4.1.
    pub async fn recv_timeout(&mut self, deadline: Duration) -> WireResult<Option<Envelope>> {
        match timeout(deadline, self.recv()).await {
            Ok(result) => result,
            Err(_) => Err(WireError::Io(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                "timed out waiting for envelope",
            ))),
        }
    }
}

fn map_lines_error(e: LinesCodecError) -> WireError {
    match e {
        LinesCodecError::Io(io) => WireError::Io(io),
        LinesCodecError::MaxLineLengthExceeded => WireError::FrameTooLarge(MAX_FRAME_BYTES),
    }
}

/// Binds a listener on `addr`. A bind failure is a Configuration error per
/// §7: fatal at startup, surfaced directly to the caller.
pub async fn bind(addr: SocketAddr) -> WireResult<TcpListener> {
    Ok(TcpListener::bind(addr).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vigil_types::ReplicaId;

    async fn loopback_pair() -> (Connection, Connection) {
        let listener = bind("127.0.0.1:0".parse().unwrap()).await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accept = tokio::spawn(async move { listener.accept().await.unwrap().0 });
        let client = TcpStream::connect(addr).await.unwrap();
        let server = accept.await.unwrap();
        (
            Connection::new(client, "client").unwrap(),
            Connection::new(server, "server").unwrap(),
        )
    }

    #[tokio::test]
    async fn sends_and_receives_one_envelope() {
        let (mut a, mut b) = loopback_pair().await;
        a.send(Body::Heartbeat).await.unwrap();
        let received = b.recv().await.unwrap().unwrap();
        assert_eq!(received.body, Body::Heartbeat);
        assert_eq!(received.component_id, "client");
    }

    #[tokio::test]
    async fn recv_returns_none_on_clean_close() {
        let (a, mut b) = loopback_pair().await;
        drop(a);
        assert!(b.recv().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn preserves_order_on_one_connection() {
        let (mut a, mut b) = loopback_pair().await;
        a.send(Body::Increase { request_number: 1 }).await.unwrap();
        a.send(Body::Increase { request_number: 2 }).await.unwrap();
        a.send(Body::Increase { request_number: 3 }).await.unwrap();

        for expected in [1, 2, 3] {
            let env = b.recv().await.unwrap().unwrap();
            match env.body {
                Body::Increase { request_number } => assert_eq!(request_number, expected),
                other => panic!("unexpected body: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn recv_timeout_errors_when_peer_is_silent() {
        let (_a, mut b) = loopback_pair().await;
        let result = b.recv_timeout(Duration::from_millis(20)).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn roundtrips_replica_ref_payload() {
        let (mut a, mut b) = loopback_pair().await;
        a.send(Body::AddReplica {
            message_data: vigil_types::ReplicaRef {
                server_id: ReplicaId::new(2),
            },
        })
        .await
        .unwrap();
        let env = b.recv().await.unwrap().unwrap();
        match env.body {
            Body::AddReplica { message_data } => {
                assert_eq!(message_data.server_id, ReplicaId::new(2));
            }
            other => panic!("unexpected body: {other:?}"),
        }
    }
}
