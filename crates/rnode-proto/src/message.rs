use serde::{Deserialize, Serialize};

use crate::ids::ObjectId;
use crate::opcode::RequestType;

/// Opaque, MessagePack-encoded request body. Variant tags mirror
/// [`RequestType`] one-to-one; the wire's separate `RequestType` frame lets a
/// router dispatch without paying for this decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RequestParams {
    Read {
        object: ObjectId,
        offset: u64,
        size: u64,
    },
    Write {
        object: ObjectId,
        offset: u64,
        #[serde(with = "serde_bytes")]
        data: Vec<u8>,
    },
    Sync {
        object: ObjectId,
    },
    Resize {
        object: ObjectId,
        size: u64,
    },
    Unlink {
        object: ObjectId,
    },
    Transfer {
        object: ObjectId,
        target_node: String,
        sync_timeout_ms: u64,
    },
    GetSize {
        object: ObjectId,
    },
    GetClusterMultiplier {
        object: ObjectId,
    },
    GetCloneNamespaceMap {
        object: ObjectId,
    },
    GetPage {
        object: ObjectId,
        cluster_address: u64,
    },
    Ping,
    Stat {
        object: ObjectId,
    },
    ListSnapshots {
        object: ObjectId,
    },
    SnapshotCreate {
        object: ObjectId,
        snapshot: String,
        timeout_ms: u64,
    },
    SnapshotRemove {
        object: ObjectId,
        snapshot: String,
    },
    SnapshotRollback {
        object: ObjectId,
        snapshot: String,
    },
    IsSnapshotSynced {
        object: ObjectId,
        snapshot: String,
    },
    OpenVolume {
        object: ObjectId,
        oflag: i32,
    },
    CreateVolume {
        object: ObjectId,
        size: u64,
    },
    RemoveVolume {
        object: ObjectId,
    },
    TruncateVolume {
        object: ObjectId,
        size: u64,
    },
    ListVolumes,
    ListClusterNodeUri,
}

impl RequestParams {
    /// The [`RequestType`] this body corresponds to, for populating the
    /// wire's leading opcode frame.
    pub fn request_type(&self) -> RequestType {
        match self {
            Self::Read { .. } => RequestType::Read,
            Self::Write { .. } => RequestType::Write,
            Self::Sync { .. } => RequestType::Sync,
            Self::Resize { .. } => RequestType::Resize,
            Self::Unlink { .. } => RequestType::Unlink,
            Self::Transfer { .. } => RequestType::Transfer,
            Self::GetSize { .. } => RequestType::GetSize,
            Self::GetClusterMultiplier { .. } => RequestType::GetClusterMultiplier,
            Self::GetCloneNamespaceMap { .. } => RequestType::GetCloneNamespaceMap,
            Self::GetPage { .. } => RequestType::GetPage,
            Self::Ping => RequestType::Ping,
            Self::Stat { .. } => RequestType::Stat,
            Self::ListSnapshots { .. } => RequestType::ListSnapshots,
            Self::SnapshotCreate { .. } => RequestType::SnapshotCreate,
            Self::SnapshotRemove { .. } => RequestType::SnapshotRemove,
            Self::SnapshotRollback { .. } => RequestType::SnapshotRollback,
            Self::IsSnapshotSynced { .. } => RequestType::IsSnapshotSynced,
            Self::OpenVolume { .. } => RequestType::OpenVolume,
            Self::CreateVolume { .. } => RequestType::CreateVolume,
            Self::RemoveVolume { .. } => RequestType::RemoveVolume,
            Self::TruncateVolume { .. } => RequestType::TruncateVolume,
            Self::ListVolumes => RequestType::ListVolumes,
            Self::ListClusterNodeUri => RequestType::ListClusterNodeUri,
        }
    }
}

/// Successful reply body. Most operations return no trailing payload beyond
/// the dtl/size bookkeeping; `Read`/`GetPage` carry the raw bytes and
/// `ListSnapshots`/`GetCloneNamespaceMap` carry structured listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResponsePayload {
    Read {
        #[serde(with = "serde_bytes")]
        data: Vec<u8>,
    },
    Write {
        size_written: u64,
        dtl_in_sync: bool,
    },
    Sync {
        dtl_in_sync: bool,
    },
    Size {
        size: u64,
    },
    ClusterMultiplier {
        multiplier: u32,
    },
    CloneNamespaceMap {
        entries: Vec<(u32, String)>,
    },
    Page {
        #[serde(with = "serde_bytes")]
        data: Vec<u8>,
    },
    Snapshots {
        names: Vec<String>,
    },
    Bool {
        value: bool,
    },
    Stat {
        size: u64,
        cluster_multiplier: u32,
    },
    Volumes {
        names: Vec<String>,
    },
    ClusterUris {
        uris: Vec<String>,
    },
    /// No data beyond the response type: `Unlink`, `Resize`, `Transfer`,
    /// `Ping`, `SnapshotCreate`, `SnapshotRemove`, `SnapshotRollback`,
    /// `OpenVolume`, `CreateVolume`, `RemoveVolume`, `TruncateVolume`.
    Empty,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_type_matches_variant() {
        let p = RequestParams::Write {
            object: ObjectId::from("vol-1"),
            offset: 0,
            data: vec![0xAA; 16],
        };
        assert_eq!(p.request_type(), RequestType::Write);
    }

    #[test]
    fn msgpack_roundtrip_preserves_payload() {
        let p = RequestParams::Read {
            object: ObjectId::from("vol-7"),
            offset: 4096,
            size: 4096,
        };
        let bytes = rmp_serde::to_vec_named(&p).expect("encode");
        let back: RequestParams = rmp_serde::from_slice(&bytes).expect("decode");
        assert_eq!(p, back);
    }
}
