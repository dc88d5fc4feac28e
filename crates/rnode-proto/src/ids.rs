use std::fmt;

/// Client-side correlation id for matching a reply to its request on one
/// connection. Unique only within the lifetime of one [`RemoteNodeClient`]
/// connection; never persisted, never used for authentication.
///
/// [`RemoteNodeClient`]: https://docs.rs/rnode-client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestTag(pub u64);

impl RequestTag {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tag#{}", self.0)
    }
}

impl From<u64> for RequestTag {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Durable correlation id assigned by an HA context, carried across
/// reconnects so replayed requests can be deduplicated by the peer and by
/// the context's own seen-ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl RequestId {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "req#{}", self.0)
    }
}

impl From<u64> for RequestId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Stable identifier for a volume object, owned by at most one cluster
/// node at a time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct ObjectId(pub String);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ObjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Transport address of a cluster peer, e.g. `tcp://10.0.0.4:21321`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PeerUri(pub String);

impl fmt::Display for PeerUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PeerUri {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for PeerUri {
    fn from(s: String) -> Self {
        Self(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_display() {
        assert_eq!(RequestTag(7).to_string(), "tag#7");
    }

    #[test]
    fn id_ordering_is_numeric() {
        assert!(RequestId(1) < RequestId(2));
    }
}
