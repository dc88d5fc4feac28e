use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use arc_swap::ArcSwap;
use rand::Rng;
use rnode_client::{ClientConfig, RemoteNodeClient};
use rnode_proto::{ClientError, ObjectId, PeerUri, RequestId, RequestParams, ResponsePayload};
use rnode_transport::ZmqContext;
use tokio::sync::{oneshot, Notify};

use crate::config::HaConfig;
use crate::inflight::{HaRequestHandle, InflightTable};
use crate::seen_ring::SeenRing;

fn is_transport_failure(e: &ClientError) -> bool {
    matches!(e, ClientError::RequestTimeout(_) | ClientError::IOError(_))
}

struct HaShared {
    active: ArcSwap<RemoteNodeClient>,
    current_uri: Mutex<PeerUri>,
    peer_list: Mutex<Vec<PeerUri>>,
    next_request_id: AtomicU64,
    inflight: InflightTable,
    seen: Mutex<SeenRing>,
    connection_error: AtomicBool,
    wake: Notify,
    stop: AtomicBool,
    config: HaConfig,
    ctx: ZmqContext,
}

impl HaShared {
    fn next_id(&self) -> RequestId {
        RequestId(self.next_request_id.fetch_add(1, Ordering::Relaxed))
    }

    fn active(&self) -> Arc<RemoteNodeClient> {
        self.active.load_full()
    }

    fn mark_connection_error(&self) {
        if self.config.ha_enabled {
            self.connection_error.store(true, Ordering::Release);
            self.wake.notify_one();
        }
    }

    fn complete(&self, id: RequestId, result: Result<ResponsePayload, ClientError>) {
        if let Some(handle) = self.inflight.remove(id) {
            self.seen.lock().unwrap().insert(id);
            let _ = handle.tx.send(result);
        } else {
            tracing::trace!(id = %id, "duplicate completion ignored, request already finished");
        }
    }

    async fn dispatch(self: Arc<Self>, id: RequestId, params: RequestParams, timeout: Duration) {
        if self.seen.lock().unwrap().contains(id) {
            self.inflight.remove(id);
            return;
        }
        let client = self.active();
        let result = client.submit(params, Some(timeout)).await;
        match result {
            Ok(payload) => self.complete(id, Ok(payload)),
            Err(e) if self.config.ha_enabled && is_transport_failure(&e) => {
                tracing::warn!(id = %id, error = %e, "transport failure, scheduling reconnect");
                self.mark_connection_error();
            }
            Err(e) => self.complete(id, Err(e)),
        }
    }

    fn pick_peer_excluding(&self, exclude: &PeerUri) -> Option<PeerUri> {
        let list = self.peer_list.lock().unwrap();
        let candidates: Vec<&PeerUri> = list.iter().filter(|p| *p != exclude).collect();
        if candidates.is_empty() {
            return list.first().cloned();
        }
        let idx = rand::thread_rng().gen_range(0..candidates.len());
        Some(candidates[idx].clone())
    }

    async fn replay(self: &Arc<Self>) {
        let entries = self.inflight.snapshot();
        if entries.is_empty() {
            return;
        }
        tracing::info!(count = entries.len(), "replaying inflight requests after reconnect");
        for (id, params, timeout) in entries {
            let shared = Arc::clone(self);
            tokio::spawn(async move { shared.dispatch(id, params, timeout).await });
        }
    }

    fn fail_all_inflight(&self) {
        for (_, handle) in self.inflight.drain_all() {
            let _ = handle
                .tx
                .send(Err(ClientError::IOError("no reachable cluster peer".to_string())));
        }
    }
}

async fn reconnect_task(shared: Arc<HaShared>) {
    loop {
        shared.wake.notified().await;
        if shared.stop.load(Ordering::Acquire) {
            break;
        }
        if !shared.connection_error.load(Ordering::Acquire) {
            continue;
        }

        let mut reconnected = false;
        for attempt in 1..=shared.config.max_reconnect_attempts {
            let backoff = shared.config.backoff_for_attempt(attempt);
            if !backoff.is_zero() {
                tokio::time::sleep(backoff).await;
            }

            let current = shared.current_uri.lock().unwrap().clone();
            let Some(candidate) = shared.pick_peer_excluding(&current) else {
                tracing::warn!("no alternate cluster peer known, retrying");
                continue;
            };

            let candidate_config = ClientConfig::new("ha-probe", candidate.0.clone())
                .with_timeout(shared.config.request_timeout);
            let candidate_client = RemoteNodeClient::connect(candidate_config, shared.ctx.clone());

            match candidate_client.ping().await {
                Ok(()) => {
                    tracing::info!(uri = %candidate, attempt, "reconnected to cluster peer");
                    *shared.current_uri.lock().unwrap() = candidate;
                    let old = shared.active.swap(Arc::new(candidate_client));
                    drop(old);
                    reconnected = true;
                    break;
                }
                Err(e) => {
                    tracing::warn!(uri = %candidate, error = %e, attempt, "candidate peer failed liveness probe");
                    candidate_client.shutdown().await;
                }
            }
        }

        if reconnected {
            shared.connection_error.store(false, Ordering::Release);
            shared.replay().await;
        } else {
            // Leave `connection_error` set: the next failed dispatch (or a
            // future request once the peer list is repopulated) re-notifies
            // this loop rather than assuming the cluster has recovered.
            tracing::error!("exhausted reconnect attempts, failing inflight requests");
            shared.fail_all_inflight();
        }
    }
}

/// Fault-tolerant wrapper above a [`RemoteNodeClient`]: assigns request ids,
/// tracks inflight/seen ids, detects connection loss, and reconnects to a
/// different cluster peer, replaying inflight requests so each caller's I/O
/// completes exactly once.
#[derive(Clone)]
pub struct HaContext {
    shared: Arc<HaShared>,
    reconnect: Arc<tokio::task::JoinHandle<()>>,
}

impl HaContext {
    pub fn connect(config: HaConfig, ctx: ZmqContext) -> Self {
        let initial_uri = PeerUri(config.initial_uri.clone());
        let client_config = ClientConfig::new("ha", initial_uri.0.clone())
            .with_timeout(config.request_timeout);
        let initial_client = RemoteNodeClient::connect(client_config, ctx.clone());

        let shared = Arc::new(HaShared {
            active: ArcSwap::from_pointee(initial_client),
            current_uri: Mutex::new(initial_uri.clone()),
            peer_list: Mutex::new(vec![initial_uri]),
            next_request_id: AtomicU64::new(1),
            inflight: InflightTable::new(),
            seen: Mutex::new(SeenRing::new(config.seen_ring_capacity)),
            connection_error: AtomicBool::new(false),
            wake: Notify::new(),
            stop: AtomicBool::new(false),
            config,
            ctx,
        });

        let task_shared = shared.clone();
        let reconnect = tokio::spawn(reconnect_task(task_shared));

        Self {
            shared,
            reconnect: Arc::new(reconnect),
        }
    }

    pub fn is_ha_enabled(&self) -> bool {
        self.shared.config.ha_enabled
    }

    pub fn set_connection_error(&self) {
        self.shared.mark_connection_error();
    }

    pub fn inflight_count(&self) -> usize {
        self.shared.inflight.len()
    }

    /// Seed the reconnect candidate list from an externally-discovered
    /// cluster membership (e.g. a directory service), without waiting for
    /// an in-band `list_cluster_node_uri` round trip.
    pub fn set_peer_list(&self, uris: Vec<String>) {
        let mut list = self.shared.peer_list.lock().unwrap();
        *list = uris.into_iter().map(PeerUri).collect();
    }

    /// Submit one request and await its completion, transparently surviving
    /// a peer failure and reconnect in between.
    pub async fn request(
        &self,
        params: RequestParams,
        timeout: Option<Duration>,
    ) -> Result<ResponsePayload, ClientError> {
        if self.shared.stop.load(Ordering::Acquire) {
            return Err(ClientError::IOError("ha context shut down".to_string()));
        }

        let timeout = timeout.unwrap_or(self.shared.config.request_timeout);
        let id = self.shared.next_id();
        let (tx, rx) = oneshot::channel();
        self.shared.inflight.insert(
            id,
            HaRequestHandle {
                params: params.clone(),
                timeout,
                tx,
            },
        );

        Arc::clone(&self.shared).dispatch(id, params, timeout).await;

        match rx.await {
            Ok(result) => result,
            Err(_canceled) => Err(ClientError::IOError("ha context shut down".to_string())),
        }
    }

    pub async fn open_volume(&self, volume: ObjectId, oflag: i32) -> Result<(), ClientError> {
        self.request(RequestParams::OpenVolume { object: volume, oflag }, None)
            .await
            .map(|_| ())
    }

    pub fn close_volume(&self) {
        // Local bookkeeping only: releases no wire resources, matching the
        // legacy API's fire-and-forget close semantics.
    }

    pub async fn create_volume(&self, volume: ObjectId, size: u64) -> Result<(), ClientError> {
        self.request(RequestParams::CreateVolume { object: volume, size }, None)
            .await
            .map(|_| ())
    }

    pub async fn remove_volume(&self, volume: ObjectId) -> Result<(), ClientError> {
        self.request(RequestParams::RemoveVolume { object: volume }, None)
            .await
            .map(|_| ())
    }

    pub async fn truncate_volume(&self, volume: ObjectId, size: u64) -> Result<(), ClientError> {
        self.request(RequestParams::TruncateVolume { object: volume, size }, None)
            .await
            .map(|_| ())
    }

    pub async fn truncate(&self, volume: ObjectId, size: u64) -> Result<(), ClientError> {
        self.truncate_volume(volume, size).await
    }

    pub async fn snapshot_create(
        &self,
        volume: ObjectId,
        snapshot: String,
        timeout: Duration,
    ) -> Result<(), ClientError> {
        self.request(
            RequestParams::SnapshotCreate {
                object: volume,
                snapshot,
                timeout_ms: timeout.as_millis() as u64,
            },
            Some(timeout),
        )
        .await
        .map(|_| ())
    }

    pub async fn snapshot_rollback(&self, volume: ObjectId, snapshot: String) -> Result<(), ClientError> {
        self.request(
            RequestParams::SnapshotRollback { object: volume, snapshot },
            None,
        )
        .await
        .map(|_| ())
    }

    pub async fn snapshot_remove(&self, volume: ObjectId, snapshot: String) -> Result<(), ClientError> {
        self.request(RequestParams::SnapshotRemove { object: volume, snapshot }, None)
            .await
            .map(|_| ())
    }

    pub async fn list_snapshots(&self, volume: ObjectId) -> Result<Vec<String>, ClientError> {
        match self
            .request(RequestParams::ListSnapshots { object: volume }, None)
            .await?
        {
            ResponsePayload::Snapshots { names } => Ok(names),
            _ => Err(ClientError::IOError("unexpected payload for ListSnapshots".to_string())),
        }
    }

    pub async fn is_snapshot_synced(&self, volume: ObjectId, snapshot: String) -> Result<bool, ClientError> {
        match self
            .request(RequestParams::IsSnapshotSynced { object: volume, snapshot }, None)
            .await?
        {
            ResponsePayload::Bool { value } => Ok(value),
            _ => Err(ClientError::IOError("unexpected payload for IsSnapshotSynced".to_string())),
        }
    }

    pub async fn list_volumes(&self) -> Result<Vec<String>, ClientError> {
        match self.request(RequestParams::ListVolumes, None).await? {
            ResponsePayload::Volumes { names } => Ok(names),
            _ => Err(ClientError::IOError("unexpected payload for ListVolumes".to_string())),
        }
    }

    /// Fetch the current cluster member list from the active peer and
    /// refresh the local cache used to pick reconnect candidates.
    pub async fn list_cluster_node_uri(&self) -> Result<Vec<String>, ClientError> {
        match self.request(RequestParams::ListClusterNodeUri, None).await? {
            ResponsePayload::ClusterUris { uris } => {
                let mut list = self.shared.peer_list.lock().unwrap();
                *list = uris.iter().map(|u| PeerUri(u.clone())).collect();
                Ok(uris)
            }
            _ => Err(ClientError::IOError(
                "unexpected payload for ListClusterNodeUri".to_string(),
            )),
        }
    }

    pub async fn send_read_request(
        &self,
        volume: ObjectId,
        offset: u64,
        size: u64,
    ) -> Result<Vec<u8>, ClientError> {
        match self
            .request(RequestParams::Read { object: volume, offset, size }, None)
            .await?
        {
            ResponsePayload::Read { data } => Ok(data),
            _ => Err(ClientError::IOError("unexpected payload for Read".to_string())),
        }
    }

    pub async fn send_write_request(
        &self,
        volume: ObjectId,
        offset: u64,
        data: Vec<u8>,
    ) -> Result<(u64, bool), ClientError> {
        match self
            .request(RequestParams::Write { object: volume, offset, data }, None)
            .await?
        {
            ResponsePayload::Write { size_written, dtl_in_sync } => Ok((size_written, dtl_in_sync)),
            _ => Err(ClientError::IOError("unexpected payload for Write".to_string())),
        }
    }

    pub async fn send_flush_request(&self, volume: ObjectId) -> Result<bool, ClientError> {
        match self.request(RequestParams::Sync { object: volume }, None).await? {
            ResponsePayload::Sync { dtl_in_sync } => Ok(dtl_in_sync),
            ResponsePayload::Empty => Ok(false),
            _ => Err(ClientError::IOError("unexpected payload for Sync".to_string())),
        }
    }

    pub async fn stat_volume(&self, volume: ObjectId) -> Result<(u64, u32), ClientError> {
        match self.request(RequestParams::Stat { object: volume }, None).await? {
            ResponsePayload::Stat { size, cluster_multiplier } => Ok((size, cluster_multiplier)),
            _ => Err(ClientError::IOError("unexpected payload for Stat".to_string())),
        }
    }

    /// Local buffer allocation for I/O staging; never touches the wire.
    pub fn allocate(&self, size: usize) -> Vec<u8> {
        vec![0u8; size]
    }

    pub fn deallocate(&self, _buf: Vec<u8>) {}

    pub async fn shutdown(self) {
        self.shared.stop.store(true, Ordering::Release);
        self.shared.wake.notify_one();
        if let Ok(handle) = Arc::try_unwrap(self.reconnect) {
            let _ = handle.await;
        }
    }
}
