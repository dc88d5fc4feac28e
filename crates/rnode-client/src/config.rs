use std::time::Duration;

/// Construction parameters for a [`RemoteNodeClient`](crate::RemoteNodeClient).
///
/// Builder-style `with_*` setters over a couple of required fields, matching
/// the rest of this codebase's small config structs — there is no file or
/// env loading layer here, that stays the caller's responsibility.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub node_id: String,
    pub uri: String,
    pub default_timeout: Duration,
    pub cleanup_interval: Duration,
    /// Overrides the random initial tag seed; only ever set by tests that
    /// need deterministic tag sequences.
    pub tag_seed: Option<u64>,
}

impl ClientConfig {
    pub fn new(node_id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            uri: uri.into(),
            default_timeout: Duration::from_secs(30),
            cleanup_interval: Duration::from_secs(1),
            tag_seed: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    pub fn with_tag_seed(mut self, seed: u64) -> Self {
        self.tag_seed = Some(seed);
        self
    }
}
