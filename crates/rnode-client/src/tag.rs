use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use rnode_proto::RequestTag;

/// Monotonic, wraparound-tolerant tag allocator for one connection.
///
/// Seeded with an unpredictable initial value so that tags from two
/// freshly-started clients talking to the same peer are unlikely to
/// collide in the peer's own bookkeeping, even though correlation is only
/// ever required within one connection's lifetime.
pub struct TagAllocator {
    next: AtomicU64,
}

impl TagAllocator {
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(initial_seed()),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            next: AtomicU64::new(seed),
        }
    }

    pub fn allocate(&self) -> RequestTag {
        RequestTag(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for TagAllocator {
    fn default() -> Self {
        Self::new()
    }
}

fn initial_seed() -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    use std::hash::{Hash, Hasher};
    std::thread::current().id().hash(&mut hasher);
    nanos.hash(&mut hasher);
    hasher.finish()
}
