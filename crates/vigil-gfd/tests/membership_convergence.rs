//! Integration test for the Global Fault Detector (§4.3, §8): drives a real
//! `vigil_gfd::run` against a simulated RM and simulated LFD connections,
//! all on ephemeral `127.0.0.1` ports, and checks that GFD's membership set
//! converges the way the round-trip law requires — each `add replica`
//! yields exactly one `update_membership` carrying the expected count, and
//! an LFD disconnect converges the count back down without a `remove
//! replica` ever being sent explicitly.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::net::TcpListener;

use vigil_config::GfdConfig;
use vigil_types::{Body, ReplicaId, ReplicaRef};
use vigil_wire::Connection;

const RECV_DEADLINE: Duration = Duration::from_secs(2);

async fn recv_body(conn: &mut Connection) -> Body {
    conn.recv_timeout(RECV_DEADLINE)
        .await
        .expect("wire error or timeout waiting for envelope")
        .expect("connection closed while waiting for envelope")
        .body
}

/// Binds and immediately releases a `127.0.0.1` port so it can be handed to
/// `vigil_gfd::run`'s own `listen_addr`, the way `GfdConfig::from_env` hands
/// it a configured port rather than binding it itself ahead of time.
async fn ephemeral_addr() -> SocketAddr {
    TcpListener::bind("127.0.0.1:0")
        .await
        .unwrap()
        .local_addr()
        .unwrap()
}

#[tokio::test]
async fn membership_converges_across_simulated_lfd_connections() {
    let rm_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let rm_addr = rm_listener.local_addr().unwrap();
    let gfd_listen_addr = ephemeral_addr().await;

    let config = GfdConfig {
        listen_addr: gfd_listen_addr,
        rm_addr,
        heartbeat_interval: Duration::from_millis(50),
    };
    tokio::spawn(vigil_gfd::run(config));

    let (rm_stream, _) = tokio::time::timeout(RECV_DEADLINE, rm_listener.accept())
        .await
        .expect("gfd never connected to rm")
        .unwrap();
    let mut rm_conn = Connection::new(rm_stream, "RM").unwrap();

    // GFD registers with RM before any replica has joined.
    assert_eq!(
        recv_body(&mut rm_conn).await,
        Body::Register { member_count: Some(0), checkpoint: None }
    );

    let mut lfd1 = Connection::connect(gfd_listen_addr, "LFD1", RECV_DEADLINE).await.unwrap();
    lfd1.send(Body::Register { member_count: None, checkpoint: None }).await.unwrap();
    lfd1.send(Body::AddReplica { message_data: ReplicaRef { server_id: ReplicaId::new(1) } })
        .await
        .unwrap();

    assert_eq!(
        recv_body(&mut rm_conn).await,
        Body::UpdateMembership { member_count: 1, server_id: ReplicaId::new(1) }
    );

    let mut lfd2 = Connection::connect(gfd_listen_addr, "LFD2", RECV_DEADLINE).await.unwrap();
    lfd2.send(Body::Register { member_count: None, checkpoint: None }).await.unwrap();
    lfd2.send(Body::AddReplica { message_data: ReplicaRef { server_id: ReplicaId::new(2) } })
        .await
        .unwrap();

    assert_eq!(
        recv_body(&mut rm_conn).await,
        Body::UpdateMembership { member_count: 2, server_id: ReplicaId::new(2) }
    );

    // Dropping LFD1's connection outright (no explicit `remove replica`)
    // still converges membership back down, via GFD's own disconnect
    // handling (§4.3: "On disconnect of an LFD, removes any replica
    // identifiers the GFD had associated with that LFD connection").
    drop(lfd1);

    assert_eq!(
        recv_body(&mut rm_conn).await,
        Body::UpdateMembership { member_count: 1, server_id: ReplicaId::new(1) }
    );

    // S2 is still registered, via a distinct LFD connection.
    drop(lfd2);
    assert_eq!(
        recv_body(&mut rm_conn).await,
        Body::UpdateMembership { member_count: 0, server_id: ReplicaId::new(2) }
    );
}
