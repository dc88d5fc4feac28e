use std::time::Duration;

use rnode_client::{ClientConfig, RemoteNodeClient};
use rnode_proto::{ClientError, ObjectId, ResponseType};
use rnode_transport::testing::{spawn_mock_peer, PeerBehavior};
use rnode_transport::ZmqContext;

fn endpoint(name: &str) -> String {
    format!("ipc:///tmp/rnode-client-test-{name}")
}

#[tokio::test]
async fn happy_read_returns_requested_bytes() {
    let ctx = ZmqContext::new();
    let ep = endpoint("happy-read");
    let peer = spawn_mock_peer(ctx.clone(), &ep, PeerBehavior::Echo);

    let client = RemoteNodeClient::connect(
        ClientConfig::new("node-a", ep.clone()).with_timeout(Duration::from_secs(1)),
        ctx,
    );

    let data = client
        .read(ObjectId::from("vol-1"), 4096, 4096)
        .await
        .expect("read should succeed");
    assert_eq!(data.len(), 4096);
    assert!(data.iter().all(|&b| b == 0xAB));

    client.shutdown().await;
    peer.abort();
}

#[tokio::test]
async fn write_reports_dtl_state_from_peer() {
    let ctx = ZmqContext::new();
    let ep = endpoint("write-dtl");
    let peer = spawn_mock_peer(ctx.clone(), &ep, PeerBehavior::Echo);

    let client = RemoteNodeClient::connect(ClientConfig::new("node-a", ep.clone()), ctx);
    let (written, dtl_in_sync) = client
        .write(ObjectId::from("vol-1"), 0, vec![0x5A; 4096])
        .await
        .expect("write should succeed");
    assert_eq!(written, 4096);
    assert!(dtl_in_sync);

    client.shutdown().await;
    peer.abort();
}

#[tokio::test]
async fn slow_peer_triggers_local_timeout_and_cleans_up_state() {
    let ctx = ZmqContext::new();
    let ep = endpoint("slow-timeout");
    let peer = spawn_mock_peer(ctx.clone(), &ep, PeerBehavior::Delay(Duration::from_millis(500)));

    let client = RemoteNodeClient::connect(
        ClientConfig::new("node-a", ep.clone()).with_timeout(Duration::from_millis(50)),
        ctx,
    );

    let err = client
        .read(ObjectId::from("vol-1"), 0, 4096)
        .await
        .expect_err("should time out locally");
    assert!(matches!(err, ClientError::RequestTimeout(_)));

    client.shutdown().await;
    peer.abort();
}

#[tokio::test]
async fn remote_object_not_here_maps_to_typed_error() {
    let ctx = ZmqContext::new();
    let ep = endpoint("not-here");
    let peer = spawn_mock_peer(
        ctx.clone(),
        &ep,
        PeerBehavior::RespondWith(ResponseType::ObjectNotRunningHere),
    );

    let client = RemoteNodeClient::connect(ClientConfig::new("node-a", ep.clone()), ctx);
    let err = client
        .read(ObjectId::from("vol-1"), 0, 4096)
        .await
        .expect_err("should surface typed error");
    assert!(matches!(err, ClientError::ObjectNotHere(_)));

    client.shutdown().await;
    peer.abort();
}

#[tokio::test]
async fn concurrent_requests_all_complete() {
    let ctx = ZmqContext::new();
    let ep = endpoint("concurrency");
    let peer = spawn_mock_peer(ctx.clone(), &ep, PeerBehavior::Echo);

    let client = RemoteNodeClient::connect(ClientConfig::new("node-a", ep.clone()), ctx);

    let mut handles = Vec::new();
    for i in 0..32u64 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client
                .read(ObjectId::from(format!("vol-{i}")), 0, 1024)
                .await
        }));
    }
    for h in handles {
        let data = h.await.unwrap().expect("each read completes");
        assert_eq!(data.len(), 1024);
    }

    client.shutdown().await;
    peer.abort();
}

#[tokio::test]
async fn reordered_replies_still_correlate_to_the_right_caller() {
    let ctx = ZmqContext::new();
    let ep = endpoint("reorder");
    let peer = spawn_mock_peer(ctx.clone(), &ep, PeerBehavior::Reorder { batch_size: 4 });

    let client = RemoteNodeClient::connect(ClientConfig::new("node-a", ep.clone()), ctx);

    let mut handles = Vec::new();
    for i in 0..4u64 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client.get_size(ObjectId::from(format!("vol-{i}"))).await
        }));
    }
    for h in handles {
        assert_eq!(h.await.unwrap().expect("get_size completes"), 1 << 30);
    }

    client.shutdown().await;
    peer.abort();
}
