use std::sync::Mutex;

use vigil_types::{ReplicaId, Sequence};

/// The replicated counter plus the passive-mode checkpoint bookkeeping that
/// travels with it.
///
/// Guarded by a single `std::sync::Mutex` (§5: "Replica counter state ...
/// owned by the Server"); the critical section is pure arithmetic, never
/// held across an `.await`, so a blocking mutex is the right tool here
/// rather than `tokio::sync::Mutex`.
#[derive(Debug, Default)]
pub struct Counter {
    inner: Mutex<CounterInner>,
}

#[derive(Debug, Default)]
struct CounterInner {
    value: i64,
    /// Highest checkpoint sequence applied so far (backup role). `None`
    /// until the first checkpoint arrives.
    last_sequence: Option<Sequence>,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> i64 {
        self.inner.lock().expect("counter mutex is never poisoned").value
    }

    pub fn increase(&self) -> i64 {
        let mut guard = self.inner.lock().expect("counter mutex is never poisoned");
        guard.value += 1;
        guard.value
    }

    pub fn decrease(&self) -> i64 {
        let mut guard = self.inner.lock().expect("counter mutex is never poisoned");
        guard.value -= 1;
        guard.value
    }

    /// Sets the counter to an externally-supplied value (peer state sync).
    pub fn set(&self, value: i64) {
        self.inner.lock().expect("counter mutex is never poisoned").value = value;
    }

    /// Applies a checkpoint, idempotently discarding one that is not newer
    /// than the last one applied (§4.1: "last-writer-wins on sequence").
    /// A `None` sequence is always applied — it means the sender tracks no
    /// sequence at all, not that this one is stale.
    pub fn apply_checkpoint(&self, value: i64, sequence: Option<Sequence>) {
        let mut guard = self.inner.lock().expect("counter mutex is never poisoned");
        if let Some(seq) = sequence {
            if let Some(last) = guard.last_sequence {
                if seq <= last {
                    return;
                }
            }
            guard.last_sequence = Some(seq);
        }
        guard.value = value;
    }
}

/// The passive-mode promotion state machine (§4.1). Active mode ignores
/// this entirely — every replica always executes every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    /// Initial state, until the first membership/primary signal arrives.
    Joining,
    Backup,
    Primary,
}

/// Shared, mutex-guarded promotion state. The LFD-connection task is the
/// sole writer (§5); client and peer handler tasks only read it to decide
/// whether to apply traffic.
#[derive(Debug)]
pub struct PromotionState {
    inner: Mutex<Promotion>,
}

impl PromotionState {
    pub fn new() -> Self {
        Self { inner: Mutex::new(Promotion::Joining) }
    }

    pub fn get(&self) -> Promotion {
        *self.inner.lock().expect("promotion mutex is never poisoned")
    }

    pub fn is_primary(&self) -> bool {
        self.get() == Promotion::Primary
    }

    /// Applies a `new_primary`/`new_reliable` directive naming `designated`.
    /// Returns `true` if this replica just became primary for the first
    /// time (the caller should start the checkpoint loop exactly once).
    pub fn apply_designation(&self, self_id: ReplicaId, designated: ReplicaId) -> bool {
        let mut guard = self.inner.lock().expect("promotion mutex is never poisoned");
        if designated == self_id {
            let became_primary = *guard != Promotion::Primary;
            *guard = Promotion::Primary;
            became_primary
        } else {
            *guard = Promotion::Backup;
            false
        }
    }
}

impl Default for PromotionState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn increase_and_decrease_mutate_in_place() {
        let counter = Counter::new();
        assert_eq!(counter.increase(), 1);
        assert_eq!(counter.increase(), 2);
        assert_eq!(counter.decrease(), 1);
    }

    #[test]
    fn checkpoint_applies_strictly_increasing_sequence() {
        let counter = Counter::new();
        counter.apply_checkpoint(5, Some(1));
        counter.apply_checkpoint(12, Some(2));
        assert_eq!(counter.get(), 12);
        // stale checkpoint is a no-op
        counter.apply_checkpoint(99, Some(2));
        assert_eq!(counter.get(), 12);
        counter.apply_checkpoint(99, Some(1));
        assert_eq!(counter.get(), 12);
    }

    #[test]
    fn checkpoint_without_sequence_always_applies() {
        let counter = Counter::new();
        counter.apply_checkpoint(7, None);
        assert_eq!(counter.get(), 7);
        counter.apply_checkpoint(3, None);
        assert_eq!(counter.get(), 3);
    }

    /// The promotion state machine's transition table (§4.1): each case
    /// replays `steps` (a `(designated, expect_became_primary,
    /// expect_state)` triple per `apply_designation` call) against a fresh
    /// `PromotionState` for a replica named `self_id`.
    #[test_case(
        1, &[(1, true, Promotion::Primary), (1, false, Promotion::Primary)];
        "designation_naming_self_promotes_to_primary_once"
    )]
    #[test_case(
        1, &[(2, false, Promotion::Backup)];
        "designation_naming_other_demotes_to_backup"
    )]
    fn apply_designation_transition_table(self_id: u16, steps: &[(u16, bool, Promotion)]) {
        let state = PromotionState::new();
        let self_id = ReplicaId::new(self_id);

        for &(designated, expect_became_primary, expect_state) in steps {
            let became_primary = state.apply_designation(self_id, ReplicaId::new(designated));
            assert_eq!(became_primary, expect_became_primary);
            assert_eq!(state.get(), expect_state);
        }
    }
}
