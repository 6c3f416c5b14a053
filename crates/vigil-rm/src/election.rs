use std::collections::HashSet;

use vigil_types::ReplicaId;

/// The election rule (§3, §4.4): the lowest-priority-numbered identifier in
/// the active set (`S1` beats `S2` beats `S3`). Pure and total over any
/// active-set contents, so the promotion/fail-over behavior it drives is
/// testable without any networking.
pub fn elect(active: &HashSet<ReplicaId>) -> Option<ReplicaId> {
    active.iter().copied().min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(&[2, 3, 1], Some(1); "picks_the_lowest_numbered_replica")]
    #[test_case(&[], None; "empty_active_set_elects_nobody")]
    #[test_case(&[2], Some(2); "single_candidate_is_elected")]
    fn elects_lowest_priority_candidate(ids: &[u16], expected: Option<u16>) {
        let active: HashSet<ReplicaId> = ids.iter().copied().map(ReplicaId::new).collect();
        assert_eq!(elect(&active), expected.map(ReplicaId::new));
    }
}
