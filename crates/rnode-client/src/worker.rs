use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;

use bytes::Bytes;
use futures::{SinkExt, StreamExt};
use rnode_proto::frame::{FrameError, ReplyFrame, RequestFrame};
use rnode_proto::RequestTag;
use rnode_transport::{create_dealer_and_connect, BoxedDealerSocket, ZmqContext};
use tokio::sync::{oneshot, Notify};
use tokio::time::interval;

pub type CompletionTx = oneshot::Sender<Result<ReplyFrame, FrameError>>;

pub struct WorkItem {
    pub frame: RequestFrame,
    pub response_tx: CompletionTx,
    pub deadline: Instant,
}

/// SendQueue + InflightMap behind one lock, so the move of a tag from one
/// to the other is atomic and a tag is never observably present in both.
#[derive(Default)]
pub struct ClientState {
    pub queue: VecDeque<WorkItem>,
    pub inflight: HashMap<RequestTag, WorkItem>,
}

impl ClientState {
    /// Remove `tag` from whichever of queue/inflight holds it. Used by a
    /// caller whose wait expired, and by the worker's periodic sweep.
    pub fn drop_tag(&mut self, tag: RequestTag) -> Option<WorkItem> {
        if let Some(item) = self.inflight.remove(&tag) {
            return Some(item);
        }
        if let Some(pos) = self.queue.iter().position(|i| i.frame.tag == tag) {
            return self.queue.remove(pos);
        }
        None
    }
}

pub struct Shared {
    pub state: Mutex<ClientState>,
    pub wake: Notify,
    pub stop: AtomicBool,
}

impl Shared {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(ClientState::default()),
            wake: Notify::new(),
            stop: AtomicBool::new(false),
        }
    }
}

/// The single task that owns the socket: drains the send queue, parses
/// replies, correlates them to inflight work, and periodically sweeps
/// entries whose caller already gave up.
pub async fn reactor_task(
    shared: Arc<Shared>,
    ctx: ZmqContext,
    uri: String,
    cleanup_interval: std::time::Duration,
) {
    let mut socket = match create_dealer_and_connect(&ctx, &uri) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(uri = %uri, error = %e, "initial connect failed, worker exiting");
            fail_all(&shared, "initial connect failed");
            return;
        }
    };

    let mut cleanup = interval(cleanup_interval);

    loop {
        if shared.stop.load(Ordering::Acquire) {
            break;
        }

        tokio::select! {
            biased;

            _ = shared.wake.notified() => {
                if shared.stop.load(Ordering::Acquire) {
                    break;
                }
                if let Err(e) = drain_send_queue(&shared, &mut socket).await {
                    tracing::warn!(uri = %uri, error = %e, "send failed, resetting socket");
                    socket = match create_dealer_and_connect(&ctx, &uri) {
                        Ok(s) => s,
                        Err(e) => {
                            tracing::error!(uri = %uri, error = %e, "reconnect failed");
                            continue;
                        }
                    };
                }
            }

            received = socket.next() => {
                match received {
                    Some(Ok(parts)) => handle_reply(&shared, parts),
                    Some(Err(e)) => {
                        tracing::warn!(uri = %uri, error = %e, "socket error, resetting");
                        socket = match create_dealer_and_connect(&ctx, &uri) {
                            Ok(s) => s,
                            Err(e) => {
                                tracing::error!(uri = %uri, error = %e, "reconnect failed");
                                continue;
                            }
                        };
                    }
                    None => {
                        tracing::info!(uri = %uri, "transport stream ended, worker exiting");
                        break;
                    }
                }
            }

            _ = cleanup.tick() => {
                sweep_abandoned(&shared);
            }
        }
    }

    fail_all(&shared, "worker shutting down");
}

async fn drain_send_queue(shared: &Arc<Shared>, socket: &mut BoxedDealerSocket) -> Result<(), FrameError> {
    loop {
        let item = {
            let mut state = shared.state.lock().unwrap();
            state.queue.pop_front()
        };
        let Some(item) = item else { break };

        let tag = item.frame.tag;
        let parts = item.frame.to_parts()?;
        {
            let mut state = shared.state.lock().unwrap();
            state.inflight.insert(tag, item);
        }

        let multipart: rnode_transport::socket::RawMultipart =
            parts.into_iter().map(|b: Bytes| b.to_vec().into()).collect();
        if let Err(e) = socket.send(multipart).await {
            tracing::warn!(tag = %tag, error = %e, "send failed; leaving request inflight for caller timeout");
            return Err(FrameError::Transport(e.to_string()));
        }
    }
    Ok(())
}

fn handle_reply(shared: &Arc<Shared>, parts: rnode_transport::socket::RawMultipart) {
    let parts: Vec<Bytes> = parts.into_iter().map(|m| Bytes::copy_from_slice(&m)).collect();
    let reply = match ReplyFrame::from_parts(&parts) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(error = %e, "failed to decode reply frame, dropping");
            return;
        }
    };
    let item = {
        let mut state = shared.state.lock().unwrap();
        state.inflight.remove(&reply.tag)
    };
    match item {
        Some(item) => {
            let _ = item.response_tx.send(Ok(reply));
        }
        None => {
            tracing::debug!(tag = %reply.tag, "orphan response for unknown or already-dropped tag");
        }
    }
}

fn sweep_abandoned(shared: &Arc<Shared>) {
    let now = Instant::now();
    let mut state = shared.state.lock().unwrap();
    let expired_inflight: Vec<RequestTag> = state
        .inflight
        .iter()
        .filter(|(_, item)| item.response_tx.is_closed() && now >= item.deadline)
        .map(|(tag, _)| *tag)
        .collect();
    for tag in expired_inflight {
        state.inflight.remove(&tag);
    }
    state
        .queue
        .retain(|item| !(item.response_tx.is_closed() && now >= item.deadline));
}

fn fail_all(shared: &Shared, reason: &str) {
    let mut state = shared.state.lock().unwrap();
    for item in state.queue.drain(..) {
        let _ = item.response_tx.send(Err(FrameError::Transport(reason.to_string())));
    }
    for (_, item) in state.inflight.drain() {
        let _ = item.response_tx.send(Err(FrameError::Transport(reason.to_string())));
    }
}
