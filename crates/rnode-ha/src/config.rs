use std::time::Duration;

/// Construction parameters for an [`HaContext`](crate::HaContext).
#[derive(Debug, Clone)]
pub struct HaConfig {
    pub initial_uri: String,
    /// Upper bound on asynchronous requests in flight at once; submissions
    /// beyond this are rejected rather than queued unbounded.
    pub net_client_qdepth: u64,
    pub ha_enabled: bool,
    pub seen_ring_capacity: usize,
    pub request_timeout: Duration,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    pub max_reconnect_attempts: u32,
}

impl HaConfig {
    pub fn new(initial_uri: impl Into<String>) -> Self {
        Self {
            initial_uri: initial_uri.into(),
            net_client_qdepth: 1024,
            ha_enabled: true,
            seen_ring_capacity: 65_536,
            request_timeout: Duration::from_secs(30),
            backoff_base: Duration::from_millis(100),
            backoff_max: Duration::from_secs(5),
            max_reconnect_attempts: 10,
        }
    }

    pub fn with_ha_enabled(mut self, enabled: bool) -> Self {
        self.ha_enabled = enabled;
        self
    }

    pub fn with_qdepth(mut self, qdepth: u64) -> Self {
        self.net_client_qdepth = qdepth;
        self
    }

    pub fn with_seen_ring_capacity(mut self, capacity: usize) -> Self {
        self.seen_ring_capacity = capacity;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Capped exponential backoff for the N-th reconnect attempt (1-based),
    /// matching this codebase's lazy-pirate-style retry schedule.
    pub fn backoff_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let shift = attempt.saturating_sub(1).min(16);
        let scaled = self.backoff_base.saturating_mul(1u32 << shift);
        scaled.min(self.backoff_max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_until_capped() {
        let cfg = HaConfig::new("tcp://127.0.0.1:1").with_request_timeout(Duration::from_secs(1));
        assert_eq!(cfg.backoff_for_attempt(1), Duration::from_millis(100));
        assert_eq!(cfg.backoff_for_attempt(2), Duration::from_millis(200));
        assert_eq!(cfg.backoff_for_attempt(3), Duration::from_millis(400));
        assert_eq!(cfg.backoff_for_attempt(7), Duration::from_secs(5));
        assert_eq!(cfg.backoff_for_attempt(20), Duration::from_secs(5));
    }
}
