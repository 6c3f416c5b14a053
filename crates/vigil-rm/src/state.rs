use std::collections::HashSet;
use std::sync::Mutex;

use vigil_types::ReplicaId;

use crate::election::elect;

/// Side effects the caller (the GFD-connection task) must carry out after
/// applying an inbound event. Kept separate from [`RmState`]'s mutation so
/// the election/membership rules stay unit-testable without any
/// networking, mirroring the pure-function style `vigil-gfd::Membership`
/// uses for its own add/remove bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RmAction {
    /// Send `recover_server` for this replica back to GFD.
    pub recover: Option<ReplicaId>,
    /// The designation changed to this replica; emit `new_primary` /
    /// `new_reliable` to GFD and (passive mode) broadcast `primary_server`
    /// to clients.
    pub designated: Option<ReplicaId>,
    /// The designation holder departed and no candidate remained to
    /// replace it (§8 boundary behavior: "if all replicas are absent, RM
    /// holds no designation and emits no `primary_server` notifications").
    /// Distinguished from a plain no-op so the caller can log it without
    /// guessing from `designated` being `None`.
    pub cleared: bool,
}

/// The active-set and primary/reliable designation (§3, §4.4), owned
/// exclusively by RM and guarded by one mutual-exclusion primitive (§5:
/// "Active-set & primary designation — owned by RM; single task serializes
/// GFD messages and client notifications" — here that single-task
/// discipline is enforced by routing every GFD event through this one
/// guarded structure rather than a dedicated actor task, the same
/// trade-off `vigil-gfd::Membership` and `vigil-server::state::Counter`
/// make for their own owned state).
#[derive(Default)]
pub struct RmState {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    active: HashSet<ReplicaId>,
    /// RM's shadow copy of GFD's member count, compared against each
    /// incoming `update_membership` to classify it as an increase,
    /// decrease, or no-op (§4.4).
    shadow_count: u32,
    designation: Option<ReplicaId>,
}

impl RmState {
    pub fn new() -> Self {
        Self::default()
    }

    /// `register` from GFD (§4.4): records the initial member count without
    /// changing designation.
    pub fn handle_register(&self, member_count: Option<u32>) {
        let mut guard = self.inner.lock().expect("rm state mutex is never poisoned");
        guard.shadow_count = member_count.unwrap_or(0);
    }

    /// `update_membership` from GFD (§4.4). Returns the actions the caller
    /// must carry out.
    pub fn handle_update_membership(&self, member_count: u32, server_id: ReplicaId) -> RmAction {
        let mut guard = self.inner.lock().expect("rm state mutex is never poisoned");

        if member_count < guard.shadow_count {
            guard.shadow_count = member_count;
            guard.active.remove(&server_id);

            let was_designation_holder = guard.designation == Some(server_id);
            let designated = if was_designation_holder {
                let winner = elect(&guard.active);
                guard.designation = winner;
                winner
            } else {
                None
            };
            let cleared = was_designation_holder && designated.is_none();

            return RmAction { recover: Some(server_id), designated, cleared };
        }

        if member_count > guard.shadow_count {
            guard.shadow_count = member_count;
            guard.active.insert(server_id);

            let designated = if guard.designation.is_none() {
                let winner = elect(&guard.active);
                guard.designation = winner;
                winner
            } else {
                None
            };

            return RmAction { recover: None, designated, cleared: false };
        }

        guard.shadow_count = member_count;
        RmAction::default()
    }

    /// The current designation, for a newly-connected client (SPEC_FULL
    /// §11.4: RM sends the current primary to a new client immediately,
    /// before waiting for the next membership event).
    pub fn current_designation(&self) -> Option<ReplicaId> {
        self.inner.lock().expect("rm state mutex is never poisoned").designation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn register_records_count_without_electing() {
        let rm = RmState::new();
        rm.handle_register(Some(0));
        assert_eq!(rm.current_designation(), None);
    }

    /// The `update_membership` transition table (§4.4): each case replays
    /// `steps` (a `(member_count, server_id)` pair per call) against a fresh
    /// `RmState` registered at `initial_count`, then checks the action
    /// returned by the *last* step and the designation it leaves behind.
    #[test_case(
        0, &[(1, 2)],
        RmAction { recover: None, designated: Some(ReplicaId::new(2)), cleared: false },
        Some(ReplicaId::new(2));
        "first_join_elects_immediately"
    )]
    #[test_case(
        0, &[(1, 2), (2, 1)],
        RmAction { recover: None, designated: None, cleared: false },
        Some(ReplicaId::new(2));
        "better_priority_join_does_not_preempt_current_designation"
    )]
    #[test_case(
        0, &[(1, 1), (2, 2), (1, 1)],
        RmAction { recover: Some(ReplicaId::new(1)), designated: Some(ReplicaId::new(2)), cleared: false },
        Some(ReplicaId::new(2));
        "departure_of_designation_holder_triggers_reelection"
    )]
    #[test_case(
        0, &[(1, 1), (2, 2), (1, 2)],
        RmAction { recover: Some(ReplicaId::new(2)), designated: None, cleared: false },
        Some(ReplicaId::new(1));
        "departure_of_non_designation_holder_does_not_reelect"
    )]
    #[test_case(
        0, &[(1, 1), (0, 1)],
        RmAction { recover: Some(ReplicaId::new(1)), designated: None, cleared: true },
        None;
        "losing_the_last_candidate_clears_the_designation"
    )]
    #[test_case(
        1, &[(1, 1)],
        RmAction::default(),
        None;
        "unchanged_member_count_is_a_no_op"
    )]
    fn update_membership_transition_table(
        initial_count: u32,
        steps: &[(u32, u16)],
        expected_last_action: RmAction,
        expected_designation: Option<ReplicaId>,
    ) {
        let rm = RmState::new();
        rm.handle_register(Some(initial_count));

        let mut last_action = RmAction::default();
        for &(member_count, server_id) in steps {
            last_action = rm.handle_update_membership(member_count, ReplicaId::new(server_id));
        }

        assert_eq!(last_action, expected_last_action);
        assert_eq!(rm.current_designation(), expected_designation);
    }
}
