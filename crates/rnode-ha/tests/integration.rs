use std::time::Duration;

use rnode_ha::{HaConfig, HaContext};
use rnode_proto::ObjectId;
use rnode_transport::testing::{spawn_mock_peer, PeerBehavior};
use rnode_transport::ZmqContext;

fn endpoint(name: &str) -> String {
    format!("ipc:///tmp/rnode-ha-test-{name}")
}

#[tokio::test]
async fn happy_path_request_completes_without_failover() {
    let ctx = ZmqContext::new();
    let ep = endpoint("happy");
    let peer = spawn_mock_peer(ctx.clone(), &ep, PeerBehavior::Echo);

    let ha = HaContext::connect(
        HaConfig::new(ep.clone()).with_request_timeout(Duration::from_secs(1)),
        ctx,
    );

    let (written, _dtl) = ha
        .send_write_request(ObjectId::from("vol-1"), 0, vec![0x11; 128])
        .await
        .expect("write completes");
    assert_eq!(written, 128);
    assert_eq!(ha.inflight_count(), 0);

    ha.shutdown().await;
    peer.abort();
}

#[tokio::test]
async fn failover_replays_inflight_writes_to_surviving_peer() {
    let ctx = ZmqContext::new();
    let ep_a = endpoint("failover-a");
    let ep_b = endpoint("failover-b");

    let peer_a = spawn_mock_peer(ctx.clone(), &ep_a, PeerBehavior::Silent);
    let peer_b = spawn_mock_peer(ctx.clone(), &ep_b, PeerBehavior::Echo);

    let ha = HaContext::connect(
        HaConfig::new(ep_a.clone())
            .with_request_timeout(Duration::from_millis(150))
            .with_seen_ring_capacity(1024),
        ctx,
    );
    ha.set_peer_list(vec![ep_a.clone(), ep_b.clone()]);

    let mut handles = Vec::new();
    for i in 0..5u64 {
        let ha = ha.clone();
        handles.push(tokio::spawn(async move {
            ha.send_write_request(ObjectId::from(format!("vol-{i}")), 0, vec![0x22; 64])
                .await
        }));
    }

    for h in handles {
        let (written, _dtl) = h
            .await
            .unwrap()
            .expect("write eventually completes against the surviving peer");
        assert_eq!(written, 64);
    }
    assert_eq!(ha.inflight_count(), 0);

    ha.shutdown().await;
    peer_a.abort();
    peer_b.abort();
}

#[tokio::test]
async fn ha_disabled_surfaces_timeout_directly_without_reconnecting() {
    let ctx = ZmqContext::new();
    let ep = endpoint("no-ha");
    let peer = spawn_mock_peer(ctx.clone(), &ep, PeerBehavior::Silent);

    let ha = HaContext::connect(
        HaConfig::new(ep.clone())
            .with_ha_enabled(false)
            .with_request_timeout(Duration::from_millis(100)),
        ctx,
    );

    let err = ha
        .send_read_request(ObjectId::from("vol-1"), 0, 4096)
        .await
        .expect_err("should surface the timeout rather than retry");
    assert!(matches!(err, rnode_proto::ClientError::RequestTimeout(_)));
    assert_eq!(ha.inflight_count(), 0);

    ha.shutdown().await;
    peer.abort();
}

/// The original peer is slow rather than silent: it still answers every
/// write, just late. A link-failure signal triggers failover and replay
/// before peer A's own answer arrives, so each request completes twice at
/// the transport layer. The second (stale) completion must be dropped
/// rather than delivered to the caller or double-counted as inflight.
#[tokio::test]
async fn late_reply_from_original_peer_is_suppressed_after_replay() {
    let ctx = ZmqContext::new();
    let ep_a = endpoint("dup-a");
    let ep_b = endpoint("dup-b");

    let peer_a = spawn_mock_peer(ctx.clone(), &ep_a, PeerBehavior::Delay(Duration::from_millis(600)));
    let peer_b = spawn_mock_peer(ctx.clone(), &ep_b, PeerBehavior::Echo);

    let ha = HaContext::connect(
        HaConfig::new(ep_a.clone())
            .with_request_timeout(Duration::from_secs(2))
            .with_seen_ring_capacity(1024),
        ctx,
    );
    ha.set_peer_list(vec![ep_a.clone(), ep_b.clone()]);

    let mut handles = Vec::new();
    for i in 0..5u64 {
        let ha = ha.clone();
        handles.push(tokio::spawn(async move {
            ha.send_write_request(ObjectId::from(format!("vol-dup-{i}")), 0, vec![0x33; 64])
                .await
        }));
    }

    // Give the writes time to land against peer A (which is still "working",
    // just slow) before announcing the link as bad and forcing a failover.
    tokio::time::sleep(Duration::from_millis(50)).await;
    ha.set_connection_error();

    for h in handles {
        let (written, _dtl) = h
            .await
            .unwrap()
            .expect("each write completes exactly once, via the surviving peer");
        assert_eq!(written, 64);
    }
    assert_eq!(ha.inflight_count(), 0);

    // Peer A's delayed replies land well after failover completed every
    // request; they must be silently dropped rather than resurrecting
    // already-finished entries.
    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(ha.inflight_count(), 0);

    ha.shutdown().await;
    peer_a.abort();
    peer_b.abort();
}
