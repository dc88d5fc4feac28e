use std::time::Duration;

use dashmap::DashMap;
use rnode_proto::{ClientError, RequestId, RequestParams, ResponsePayload};
use tokio::sync::oneshot;

pub type Completion = oneshot::Sender<Result<ResponsePayload, ClientError>>;

/// Everything needed to both complete the original caller and, on
/// reconnect, resubmit the same logical request to a new peer.
pub struct HaRequestHandle {
    pub params: RequestParams,
    pub timeout: Duration,
    pub tx: Completion,
}

/// Per-id-independent map of requests the HA context has accepted but not
/// yet completed to the caller. Entries are removed only by whichever path
/// (original reply or replay) completes first.
#[derive(Default)]
pub struct InflightTable {
    inner: DashMap<RequestId, HaRequestHandle>,
}

impl InflightTable {
    pub fn new() -> Self {
        Self {
            inner: DashMap::new(),
        }
    }

    pub fn insert(&self, id: RequestId, handle: HaRequestHandle) {
        self.inner.insert(id, handle);
    }

    pub fn remove(&self, id: RequestId) -> Option<HaRequestHandle> {
        self.inner.remove(&id).map(|(_, v)| v)
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.inner.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Snapshot of (id, params, timeout) for every entry still inflight, to
    /// drive a replay pass without holding any single entry's reference
    /// across the resubmission.
    pub fn snapshot(&self) -> Vec<(RequestId, RequestParams, Duration)> {
        self.inner
            .iter()
            .map(|entry| (*entry.key(), entry.value().params.clone(), entry.value().timeout))
            .collect()
    }

    pub fn drain_all(&self) -> Vec<(RequestId, HaRequestHandle)> {
        let ids: Vec<RequestId> = self.inner.iter().map(|e| *e.key()).collect();
        ids.into_iter()
            .filter_map(|id| self.remove(id).map(|h| (id, h)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_remove_round_trip() {
        let table = InflightTable::new();
        let (tx, _rx) = oneshot::channel();
        table.insert(
            RequestId(1),
            HaRequestHandle {
                params: RequestParams::Ping,
                timeout: Duration::from_secs(1),
                tx,
            },
        );
        assert!(table.contains(RequestId(1)));
        assert!(table.remove(RequestId(1)).is_some());
        assert!(!table.contains(RequestId(1)));
    }

    #[test]
    fn snapshot_reflects_current_entries() {
        let table = InflightTable::new();
        let (tx, _rx) = oneshot::channel();
        table.insert(
            RequestId(5),
            HaRequestHandle {
                params: RequestParams::Ping,
                timeout: Duration::from_secs(1),
                tx,
            },
        );
        let snap = table.snapshot();
        assert_eq!(snap.len(), 1);
        assert_eq!(snap[0].0, RequestId(5));
    }
}
