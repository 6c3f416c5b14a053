use thiserror::Error;

/// Errors the Replication Manager can hit. Transport/timeout errors are
/// caught at the task boundary that raises them (§7) and never reach
/// `main` — this enum exists for the handful of cases that are fatal to
/// the whole process, plus `NoCandidates` for the (non-fatal, logged)
/// election-finds-nobody case.
#[derive(Debug, Error)]
pub enum RmError {
    #[error(transparent)]
    Config(#[from] vigil_config::ConfigError),

    #[error(transparent)]
    Wire(#[from] vigil_wire::WireError),

    /// Election was attempted but the active-set is empty. Not fatal: RM
    /// simply holds no designation until the next `add replica` (§8
    /// boundary behavior, "if all replicas are absent, RM holds no
    /// designation and emits no `primary_server` notifications").
    #[error("no candidate replicas to elect")]
    NoCandidates,
}

pub type RmResult<T> = std::result::Result<T, RmError>;
