use std::collections::{HashSet, VecDeque};

use rnode_proto::RequestId;

/// Bounded record of recently-completed request ids, used to recognize and
/// discard a late/duplicate reply that arrives after the id has already
/// been replayed and completed by a different peer.
pub struct SeenRing {
    order: VecDeque<RequestId>,
    members: HashSet<RequestId>,
    capacity: usize,
}

impl SeenRing {
    pub fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity.min(1024)),
            members: HashSet::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    pub fn contains(&self, id: RequestId) -> bool {
        self.members.contains(&id)
    }

    pub fn insert(&mut self, id: RequestId) {
        if self.members.contains(&id) {
            return;
        }
        if self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
        self.order.push_back(id);
        self.members.insert(id);
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remembers_inserted_ids() {
        let mut ring = SeenRing::new(4);
        ring.insert(RequestId(1));
        assert!(ring.contains(RequestId(1)));
        assert!(!ring.contains(RequestId(2)));
    }

    #[test]
    fn evicts_oldest_past_capacity() {
        let mut ring = SeenRing::new(2);
        ring.insert(RequestId(1));
        ring.insert(RequestId(2));
        ring.insert(RequestId(3));
        assert!(!ring.contains(RequestId(1)));
        assert!(ring.contains(RequestId(2)));
        assert!(ring.contains(RequestId(3)));
        assert_eq!(ring.len(), 2);
    }

    #[test]
    fn duplicate_insert_does_not_evict() {
        let mut ring = SeenRing::new(2);
        ring.insert(RequestId(1));
        ring.insert(RequestId(2));
        ring.insert(RequestId(1));
        assert!(ring.contains(RequestId(1)));
        assert!(ring.contains(RequestId(2)));
    }
}
