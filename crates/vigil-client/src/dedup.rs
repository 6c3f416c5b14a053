use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use vigil_types::{ReplicaId, RequestNumber};

/// The per-client `server_responses` table (§3, §5): which replicas have
/// already replied for a given `request_number`. Owned exclusively by the
/// Client's send/receive tasks, guarded by one mutual-exclusion primitive.
///
/// The first reply for a `request_number` is the one delivered to the
/// user; every later reply for the same number is an expected duplicate
/// (§7: "Duplicate reply (active Client): expected; discard silently after
/// recording") — [`record`](Self::record) still records it here so a
/// testable audit trail exists, but returns `false` so the caller knows not
/// to act on it again.
#[derive(Default)]
pub struct ResponseTable {
    inner: Mutex<HashMap<RequestNumber, HashSet<ReplicaId>>>,
}

impl ResponseTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `replica` replied for `request_number`. Returns `true`
    /// the first time any replica replies for this number, `false` for
    /// every subsequent (duplicate) reply.
    pub fn record(&self, request_number: RequestNumber, replica: ReplicaId) -> bool {
        let mut guard = self.inner.lock().expect("response table mutex is never poisoned");
        let repliers = guard.entry(request_number).or_default();
        let is_first_ever = repliers.is_empty();
        repliers.insert(replica);
        is_first_ever
    }

    /// How many distinct replicas have replied for `request_number`, for
    /// tests and diagnostics.
    pub fn replier_count(&self, request_number: RequestNumber) -> usize {
        self.inner
            .lock()
            .expect("response table mutex is never poisoned")
            .get(&request_number)
            .map_or(0, HashSet::len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_reply_for_a_request_number_is_reported_as_first() {
        let table = ResponseTable::new();
        assert!(table.record(42, ReplicaId::new(1)));
    }

    #[test]
    fn later_replies_for_the_same_number_are_duplicates() {
        let table = ResponseTable::new();
        assert!(table.record(42, ReplicaId::new(1)));
        assert!(!table.record(42, ReplicaId::new(2)));
        assert!(!table.record(42, ReplicaId::new(3)));
        assert_eq!(table.replier_count(42), 3);
    }

    #[test]
    fn the_same_replica_replying_twice_is_still_a_duplicate() {
        let table = ResponseTable::new();
        assert!(table.record(1, ReplicaId::new(1)));
        assert!(!table.record(1, ReplicaId::new(1)));
    }

    #[test]
    fn distinct_request_numbers_are_independent() {
        let table = ResponseTable::new();
        assert!(table.record(1, ReplicaId::new(1)));
        assert!(table.record(2, ReplicaId::new(1)));
    }
}
