use thiserror::Error;

/// The error taxonomy shared by every crate in the workspace.
///
/// Kinds, not types: each variant groups a class of failure the way the
/// core's callers are expected to react to it, rather than mirroring the
/// internal cause. See the crate docs for how each kind propagates.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SkirosError {
    #[error("unknown parameter `{0}`")]
    UnknownParam(String),

    #[error("unknown skill `{0}`")]
    UnknownSkill(String),

    #[error("unknown element `{0}`")]
    UnknownElement(String),

    #[error("precondition unmet: {0}")]
    PreconditionUnmet(String),

    #[error("world-model or planner transport error: {0}")]
    RpcFailure(String),

    #[error("task preempted during run")]
    PreemptedDuringRun,

    #[error("planner returned no feasible plan")]
    PlannerInfeasible,

    #[error("internal invariant violated: {0}")]
    InternalInvariant(String),
}

pub type Result<T> = std::result::Result<T, SkirosError>;
