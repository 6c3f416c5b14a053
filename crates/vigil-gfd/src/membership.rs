use std::collections::HashSet;
use std::sync::Mutex;

use vigil_types::ReplicaId;

/// The authoritative replica-membership set (§4.3), guarded by one
/// mutual-exclusion primitive as §5 requires ("membership set & member
/// count — owned by GFD; guarded by one mutual-exclusion primitive;
/// written only by the LFD-message handler tasks").
#[derive(Default)]
pub struct Membership {
    inner: Mutex<HashSet<ReplicaId>>,
}

impl Membership {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `(changed, member_count_after)`.
    pub fn add(&self, id: ReplicaId) -> (bool, u32) {
        let mut set = self.inner.lock().expect("membership mutex is never poisoned");
        let changed = set.insert(id);
        (changed, set.len() as u32)
    }

    /// Returns `(changed, member_count_after)`.
    pub fn remove(&self, id: ReplicaId) -> (bool, u32) {
        let mut set = self.inner.lock().expect("membership mutex is never poisoned");
        let changed = set.remove(&id);
        (changed, set.len() as u32)
    }

    pub fn count(&self) -> u32 {
        self.inner.lock().expect("membership mutex is never poisoned").len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_idempotent_for_the_same_id() {
        let m = Membership::new();
        let s1 = ReplicaId::new(1);
        assert_eq!(m.add(s1), (true, 1));
        assert_eq!(m.add(s1), (false, 1));
    }

    #[test]
    fn remove_then_add_restores_count() {
        let m = Membership::new();
        let s1 = ReplicaId::new(1);
        let s2 = ReplicaId::new(2);
        m.add(s1);
        m.add(s2);
        assert_eq!(m.count(), 2);
        assert_eq!(m.remove(s1), (true, 1));
        assert_eq!(m.add(s1), (true, 2));
        assert_eq!(m.count(), 2);
    }
}
