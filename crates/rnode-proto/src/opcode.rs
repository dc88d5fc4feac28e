/// Operation a [`Request`](crate::Request) asks the remote node to perform.
///
/// Encoded on the wire as a big-endian `u32` in its own frame, ahead of the
/// opaque body, so a router can dispatch without decoding the body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum RequestType {
    Read = 1,
    Write = 2,
    Sync = 3,
    Resize = 4,
    Unlink = 5,
    Transfer = 6,
    GetSize = 7,
    GetClusterMultiplier = 8,
    GetCloneNamespaceMap = 9,
    GetPage = 10,
    Ping = 11,
    Stat = 12,
    ListSnapshots = 13,
    SnapshotCreate = 14,
    SnapshotRemove = 15,
    SnapshotRollback = 16,
    IsSnapshotSynced = 17,
    OpenVolume = 18,
    CreateVolume = 19,
    RemoveVolume = 20,
    TruncateVolume = 21,
    ListVolumes = 22,
    ListClusterNodeUri = 23,
}

impl RequestType {
    pub fn to_u32(self) -> u32 {
        self as u32
    }

    pub fn from_u32(v: u32) -> Option<Self> {
        Some(match v {
            1 => Self::Read,
            2 => Self::Write,
            3 => Self::Sync,
            4 => Self::Resize,
            5 => Self::Unlink,
            6 => Self::Transfer,
            7 => Self::GetSize,
            8 => Self::GetClusterMultiplier,
            9 => Self::GetCloneNamespaceMap,
            10 => Self::GetPage,
            11 => Self::Ping,
            12 => Self::Stat,
            13 => Self::ListSnapshots,
            14 => Self::SnapshotCreate,
            15 => Self::SnapshotRemove,
            16 => Self::SnapshotRollback,
            17 => Self::IsSnapshotSynced,
            18 => Self::OpenVolume,
            19 => Self::CreateVolume,
            20 => Self::RemoveVolume,
            21 => Self::TruncateVolume,
            22 => Self::ListVolumes,
            23 => Self::ListClusterNodeUri,
            _ => return None,
        })
    }
}

/// Outcome a remote node reports for a [`Request`](crate::Request).
///
/// `Ok` carries an optional trailing payload (read data, stat body, ...);
/// every other variant is terminal and carries no trailing frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ResponseType {
    Ok = 0,
    UnknownRequest = 1,
    ObjectNotRunningHere = 2,
    IOError = 3,
    Timeout = 4,
    AccessBeyondEndOfVolume = 5,
    CannotShrinkVolume = 6,
    CannotGrowVolumeBeyondLimit = 7,
}

impl ResponseType {
    pub fn to_u32(self) -> u32 {
        self as u32
    }

    pub fn from_u32(v: u32) -> Option<Self> {
        Some(match v {
            0 => Self::Ok,
            1 => Self::UnknownRequest,
            2 => Self::ObjectNotRunningHere,
            3 => Self::IOError,
            4 => Self::Timeout,
            5 => Self::AccessBeyondEndOfVolume,
            6 => Self::CannotShrinkVolume,
            7 => Self::CannotGrowVolumeBeyondLimit,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_type_roundtrip_is_stable() {
        for v in 1..=23u32 {
            let rt = RequestType::from_u32(v).expect("known opcode");
            assert_eq!(rt.to_u32(), v);
        }
        assert!(RequestType::from_u32(0).is_none());
        assert!(RequestType::from_u32(24).is_none());
    }

    #[test]
    fn response_type_roundtrip_is_stable() {
        for v in 0..=7u32 {
            let rt = ResponseType::from_u32(v).expect("known response");
            assert_eq!(rt.to_u32(), v);
        }
        assert!(ResponseType::from_u32(8).is_none());
    }
}
