use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use rnode_proto::frame::RequestFrame;
use rnode_proto::{ClientError, ObjectId, RequestParams, ResponsePayload, ResponseType};
use rnode_transport::ZmqContext;
use tokio::sync::oneshot;

use crate::config::ClientConfig;
use crate::tag::TagAllocator;
use crate::worker::{reactor_task, Shared, WorkItem};

/// Pipelining client for a single remote volume node connection.
///
/// Owns one dedicated worker task (see [`crate::worker::reactor_task`]) that
/// multiplexes all outstanding requests over one DEALER socket. Safe to
/// share across tasks via `Clone` (cheap: an `Arc` around shared state) so
/// many callers can pipeline requests to the same peer concurrently.
#[derive(Clone)]
pub struct RemoteNodeClient {
    shared: Arc<Shared>,
    tags: Arc<TagAllocator>,
    default_timeout: Duration,
    worker: Arc<tokio::task::JoinHandle<()>>,
    node_id: String,
}

impl RemoteNodeClient {
    pub fn connect(config: ClientConfig, ctx: ZmqContext) -> Self {
        let shared = Arc::new(Shared::new());
        let tags = Arc::new(match config.tag_seed {
            Some(seed) => TagAllocator::with_seed(seed),
            None => TagAllocator::new(),
        });

        let worker_shared = shared.clone();
        let uri = config.uri.clone();
        let cleanup_interval = config.cleanup_interval;
        let handle = tokio::spawn(async move {
            reactor_task(worker_shared, ctx, uri, cleanup_interval).await;
        });

        tracing::info!(node_id = %config.node_id, uri = %config.uri, "remote node client connected");

        Self {
            shared,
            tags,
            default_timeout: config.default_timeout,
            worker: Arc::new(handle),
            node_id: config.node_id,
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    /// Submit a request and await its reply, or a timeout/protocol failure.
    pub async fn submit(
        &self,
        params: RequestParams,
        timeout: Option<Duration>,
    ) -> Result<ResponsePayload, ClientError> {
        if self.shared.stop.load(Ordering::Acquire) {
            return Err(ClientError::IOError("client shut down".to_string()));
        }

        let tag = self.tags.allocate();
        let timeout = timeout.unwrap_or(self.default_timeout);
        let deadline = Instant::now() + timeout;
        let (response_tx, response_rx) = oneshot::channel();
        let frame = RequestFrame::new(tag, params);

        {
            let mut state = self.shared.state.lock().unwrap();
            state.queue.push_back(WorkItem {
                frame,
                response_tx,
                deadline,
            });
        }
        self.shared.wake.notify_one();

        match tokio::time::timeout(timeout, response_rx).await {
            Ok(Ok(Ok(reply))) => {
                if reply.response_type == ResponseType::Ok {
                    Ok(reply.payload.unwrap_or(ResponsePayload::Empty))
                } else {
                    Err(ClientError::from_response_type(tag, reply.response_type))
                }
            }
            Ok(Ok(Err(frame_err))) => Err(ClientError::from(frame_err)),
            Ok(Err(_canceled)) => {
                tracing::error!(tag = %tag, "completion handle dropped without a send");
                self.drop_tag(tag);
                Err(ClientError::IOError("worker dropped request".to_string()))
            }
            Err(_elapsed) => {
                self.drop_tag(tag);
                Err(ClientError::RequestTimeout(tag))
            }
        }
    }

    fn drop_tag(&self, tag: rnode_proto::RequestTag) {
        let mut state = self.shared.state.lock().unwrap();
        state.drop_tag(tag);
    }

    pub async fn read(&self, object: ObjectId, offset: u64, size: u64) -> Result<Vec<u8>, ClientError> {
        match self
            .submit(RequestParams::Read { object, offset, size }, None)
            .await?
        {
            ResponsePayload::Read { data } => Ok(data),
            other => Err(unexpected_payload("Read", other)),
        }
    }

    pub async fn write(
        &self,
        object: ObjectId,
        offset: u64,
        data: Vec<u8>,
    ) -> Result<(u64, bool), ClientError> {
        match self
            .submit(RequestParams::Write { object, offset, data }, None)
            .await?
        {
            ResponsePayload::Write {
                size_written,
                dtl_in_sync,
            } => Ok((size_written, dtl_in_sync)),
            other => Err(unexpected_payload("Write", other)),
        }
    }

    pub async fn sync(&self, object: ObjectId) -> Result<bool, ClientError> {
        match self.submit(RequestParams::Sync { object }, None).await {
            Ok(ResponsePayload::Sync { dtl_in_sync }) => Ok(dtl_in_sync),
            // Older peers omit the trailing Sync reply body entirely; treat
            // a bare Ok with no payload as "not yet in sync" rather than an
            // error, matching the legacy client's tolerance for this case.
            Ok(ResponsePayload::Empty) => Ok(false),
            Ok(other) => Err(unexpected_payload("Sync", other)),
            Err(e) => Err(e),
        }
    }

    pub async fn resize(&self, object: ObjectId, size: u64) -> Result<(), ClientError> {
        self.submit(RequestParams::Resize { object, size }, None)
            .await
            .map(|_| ())
    }

    pub async fn unlink(&self, object: ObjectId) -> Result<(), ClientError> {
        self.submit(RequestParams::Unlink { object }, None)
            .await
            .map(|_| ())
    }

    pub async fn transfer(
        &self,
        object: ObjectId,
        target_node: String,
        sync_timeout: Duration,
    ) -> Result<(), ClientError> {
        let sync_timeout_ms = sync_timeout.as_millis() as u64;
        self.submit(
            RequestParams::Transfer {
                object,
                target_node,
                sync_timeout_ms,
            },
            Some(self.default_timeout + sync_timeout),
        )
        .await
        .map(|_| ())
    }

    pub async fn ping(&self) -> Result<(), ClientError> {
        self.submit(RequestParams::Ping, None).await.map(|_| ())
    }

    pub async fn get_size(&self, object: ObjectId) -> Result<u64, ClientError> {
        match self.submit(RequestParams::GetSize { object }, None).await? {
            ResponsePayload::Size { size } => Ok(size),
            other => Err(unexpected_payload("GetSize", other)),
        }
    }

    pub async fn get_cluster_multiplier(&self, object: ObjectId) -> Result<u32, ClientError> {
        match self
            .submit(RequestParams::GetClusterMultiplier { object }, None)
            .await?
        {
            ResponsePayload::ClusterMultiplier { multiplier } => Ok(multiplier),
            other => Err(unexpected_payload("GetClusterMultiplier", other)),
        }
    }

    pub async fn get_clone_namespace_map(
        &self,
        object: ObjectId,
    ) -> Result<Vec<(u32, String)>, ClientError> {
        match self
            .submit(RequestParams::GetCloneNamespaceMap { object }, None)
            .await?
        {
            ResponsePayload::CloneNamespaceMap { entries } => Ok(entries),
            other => Err(unexpected_payload("GetCloneNamespaceMap", other)),
        }
    }

    pub async fn get_page(&self, object: ObjectId, cluster_address: u64) -> Result<Vec<u8>, ClientError> {
        match self
            .submit(
                RequestParams::GetPage {
                    object,
                    cluster_address,
                },
                None,
            )
            .await?
        {
            ResponsePayload::Page { data } => Ok(data),
            other => Err(unexpected_payload("GetPage", other)),
        }
    }

    pub async fn stat(&self, object: ObjectId) -> Result<(u64, u32), ClientError> {
        match self.submit(RequestParams::Stat { object }, None).await? {
            ResponsePayload::Stat {
                size,
                cluster_multiplier,
            } => Ok((size, cluster_multiplier)),
            other => Err(unexpected_payload("Stat", other)),
        }
    }

    pub async fn list_snapshots(&self, object: ObjectId) -> Result<Vec<String>, ClientError> {
        match self
            .submit(RequestParams::ListSnapshots { object }, None)
            .await?
        {
            ResponsePayload::Snapshots { names } => Ok(names),
            other => Err(unexpected_payload("ListSnapshots", other)),
        }
    }

    pub async fn snapshot_create(
        &self,
        object: ObjectId,
        snapshot: String,
        timeout: Duration,
    ) -> Result<(), ClientError> {
        let timeout_ms = timeout.as_millis() as u64;
        self.submit(
            RequestParams::SnapshotCreate {
                object,
                snapshot,
                timeout_ms,
            },
            Some(self.default_timeout + timeout),
        )
        .await
        .map(|_| ())
    }

    pub async fn snapshot_remove(&self, object: ObjectId, snapshot: String) -> Result<(), ClientError> {
        self.submit(RequestParams::SnapshotRemove { object, snapshot }, None)
            .await
            .map(|_| ())
    }

    pub async fn snapshot_rollback(&self, object: ObjectId, snapshot: String) -> Result<(), ClientError> {
        self.submit(RequestParams::SnapshotRollback { object, snapshot }, None)
            .await
            .map(|_| ())
    }

    pub async fn is_snapshot_synced(&self, object: ObjectId, snapshot: String) -> Result<bool, ClientError> {
        match self
            .submit(RequestParams::IsSnapshotSynced { object, snapshot }, None)
            .await?
        {
            ResponsePayload::Bool { value } => Ok(value),
            other => Err(unexpected_payload("IsSnapshotSynced", other)),
        }
    }

    /// Gracefully stop the worker task, failing any still-pending requests
    /// with [`ClientError::IOError`] rather than leaking them.
    pub async fn shutdown(self) {
        self.shared.stop.store(true, Ordering::Release);
        self.shared.wake.notify_one();
        if let Ok(handle) = Arc::try_unwrap(self.worker) {
            let _ = handle.await;
        }
    }
}

impl Drop for RemoteNodeClient {
    fn drop(&mut self) {
        if Arc::strong_count(&self.shared) == 1 {
            self.shared.stop.store(true, Ordering::Release);
            self.shared.wake.notify_one();
        }
    }
}

fn unexpected_payload(op: &str, payload: ResponsePayload) -> ClientError {
    tracing::error!(op, ?payload, "remote node returned an unexpected payload shape");
    ClientError::IOError(format!("unexpected payload for {op}"))
}
