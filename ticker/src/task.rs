use std::time::Instant;

use skiros_bt::{BehaviorTreeNode, ExecuteVisitor, ProgressSnapshot};

/// A registered, independently-ticked behavior tree run.
///
/// Each task owns a dedicated [`ExecuteVisitor`] rather than sharing one
/// across the registry: the visitor's preempt flag is sticky for the life of
/// a run, and a shared instance would let preempting one task bleed into
/// every other task driven by the same tick.
pub struct Task {
    pub uid: i32,
    pub root: BehaviorTreeNode,
    pub visitor: ExecuteVisitor,
    pub start_time: Instant,
    pub last_snapshot: ProgressSnapshot,
}

impl Task {
    pub fn new(uid: i32, root: BehaviorTreeNode) -> Self {
        Task {
            uid,
            root,
            visitor: ExecuteVisitor::new(),
            start_time: Instant::now(),
            last_snapshot: ProgressSnapshot::new(),
        }
    }
}
