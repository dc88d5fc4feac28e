//! In-process mock peers for exercising `rnode-client`/`rnode-ha` without a
//! real cluster node. Each binds a ROUTER socket and answers DEALER clients
//! connecting to it, in the style of the request/reply test doubles used to
//! exercise pipelining clients elsewhere in this codebase.

use std::time::Duration;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use rnode_proto::frame::{ReplyFrame, RequestFrame};
use rnode_proto::{ObjectId, ResponsePayload, ResponseType};
use tmq::{Context as ZmqContext, Multipart};

use crate::socket::create_router_and_bind;

fn to_response(frame: &RequestFrame) -> ReplyFrame {
    use rnode_proto::RequestParams::*;
    let tag = frame.tag;
    match &frame.params {
        Read { size, .. } => ReplyFrame::ok(
            tag,
            ResponsePayload::Read {
                data: vec![0xAB; *size as usize],
            },
        ),
        Write { data, .. } => ReplyFrame::ok(
            tag,
            ResponsePayload::Write {
                size_written: data.len() as u64,
                dtl_in_sync: true,
            },
        ),
        Sync { .. } => ReplyFrame::ok(tag, ResponsePayload::Sync { dtl_in_sync: true }),
        GetSize { .. } => ReplyFrame::ok(tag, ResponsePayload::Size { size: 1 << 30 }),
        GetClusterMultiplier { .. } => ReplyFrame::ok(
            tag,
            ResponsePayload::ClusterMultiplier { multiplier: 8 },
        ),
        GetCloneNamespaceMap { .. } => ReplyFrame::ok(
            tag,
            ResponsePayload::CloneNamespaceMap { entries: vec![] },
        ),
        GetPage { .. } => ReplyFrame::ok(
            tag,
            ResponsePayload::Page {
                data: vec![0; 4096],
            },
        ),
        Ping => ReplyFrame::ok(tag, ResponsePayload::Empty),
        Stat { .. } => ReplyFrame::ok(
            tag,
            ResponsePayload::Stat {
                size: 1 << 30,
                cluster_multiplier: 8,
            },
        ),
        ListSnapshots { .. } => {
            ReplyFrame::ok(tag, ResponsePayload::Snapshots { names: vec![] })
        }
        IsSnapshotSynced { .. } => {
            ReplyFrame::ok(tag, ResponsePayload::Bool { value: true })
        }
        ListVolumes => ReplyFrame::ok(
            tag,
            ResponsePayload::Volumes {
                names: vec!["vol-1".to_string()],
            },
        ),
        ListClusterNodeUri => ReplyFrame::ok(
            tag,
            ResponsePayload::ClusterUris {
                uris: vec!["tcp://127.0.0.1:9000".to_string()],
            },
        ),
        Resize { .. }
        | Unlink { .. }
        | Transfer { .. }
        | SnapshotCreate { .. }
        | SnapshotRemove { .. }
        | SnapshotRollback { .. }
        | OpenVolume { .. }
        | CreateVolume { .. }
        | RemoveVolume { .. }
        | TruncateVolume { .. } => ReplyFrame::ok(tag, ResponsePayload::Empty),
    }
}

/// Behavior a mock peer applies to every inbound request before replying.
#[derive(Clone, Copy, Debug)]
pub enum PeerBehavior {
    /// Reply immediately with a plausible success response.
    Echo,
    /// Sleep before replying, to exercise caller-side timeouts.
    Delay(Duration),
    /// Reply to requests in reverse completion order within each batch of
    /// `batch_size`, to exercise tag-based correlation under reordering.
    Reorder { batch_size: usize },
    /// Reply with a fixed `ResponseType` instead of `Ok`.
    RespondWith(ResponseType),
    /// Accept the request but never reply, to exercise a dead peer.
    Silent,
}

/// Bind a ROUTER socket at `endpoint` and answer every request according to
/// `behavior` until the returned task is aborted or the socket errors.
///
/// Returns the handle of the spawned task; callers in tests typically hold
/// it only to abort it deterministically at the end of a scenario.
pub fn spawn_mock_peer(
    ctx: ZmqContext,
    endpoint: &str,
    behavior: PeerBehavior,
) -> tokio::task::JoinHandle<()> {
    let endpoint = endpoint.to_string();
    tokio::spawn(async move {
        let mut socket = match create_router_and_bind(&ctx, &endpoint) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, endpoint = %endpoint, "mock peer failed to bind");
                return;
            }
        };

        let mut pending: Vec<(Bytes, RequestFrame)> = Vec::new();

        while let Some(received) = socket.next().await {
            let parts: Multipart = match received {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(error = %e, "mock peer recv error");
                    continue;
                }
            };
            let parts: Vec<Bytes> = parts.into_iter().map(|m| Bytes::copy_from_slice(&m)).collect();
            if parts.len() < 2 {
                continue;
            }
            let identity = parts[0].clone();
            let frame = match RequestFrame::from_parts(&parts[1..]) {
                Ok(f) => f,
                Err(e) => {
                    tracing::warn!(error = %e, "mock peer failed to decode request frame");
                    continue;
                }
            };

            match behavior {
                PeerBehavior::Silent => continue,
                PeerBehavior::Delay(d) => {
                    tokio::time::sleep(d).await;
                    if reply(&mut socket, &identity, &frame, None).await.is_err() {
                        break;
                    }
                }
                PeerBehavior::RespondWith(response_type) => {
                    if reply(&mut socket, &identity, &frame, Some(response_type))
                        .await
                        .is_err()
                    {
                        break;
                    }
                }
                PeerBehavior::Echo => {
                    if reply(&mut socket, &identity, &frame, None).await.is_err() {
                        break;
                    }
                }
                PeerBehavior::Reorder { batch_size } => {
                    pending.push((identity, frame));
                    if pending.len() >= batch_size.max(1) {
                        for (identity, frame) in pending.drain(..).rev() {
                            if reply(&mut socket, &identity, &frame, None).await.is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        }
    })
}

async fn reply(
    socket: &mut crate::socket::BoxedRouterSocket,
    identity: &Bytes,
    frame: &RequestFrame,
    force_response_type: Option<ResponseType>,
) -> Result<(), ()> {
    let reply = match force_response_type {
        Some(rt) => ReplyFrame::error(frame.tag, rt),
        None => to_response(frame),
    };
    let mut parts = reply.to_parts().map_err(|_| ())?;
    let mut out: Vec<Bytes> = Vec::with_capacity(parts.len() + 1);
    out.push(identity.clone());
    out.append(&mut parts);
    let multipart: Multipart = out.into_iter().map(|b| b.to_vec().into()).collect();
    socket.send(multipart).await.map_err(|_| ())
}

/// Convenience constructor for test requests against an object id.
pub fn test_object(name: &str) -> ObjectId {
    ObjectId::from(name)
}
