//! Traversal strategies over a [`crate::node::BehaviorTreeNode`].
//!
//! Every visitor shares the same `traverse` entry point; what differs is
//! what each variant-specific hook does with a node once it is reached.

mod execute;
mod print;
mod progress;
mod simulate;

pub use execute::ExecuteVisitor;
pub use print::PrintVisitor;
pub use progress::{ProgressEvent, ProgressSnapshot, ProgressVisitor};
pub use simulate::ReversibleSimulator;

use skiros_model::WorldModel;

use crate::node::BehaviorTreeNode;
use crate::skill::State;

/// A traversal strategy. `traverse` recurses depth-first, left-to-right.
pub trait Visitor {
    fn traverse(&mut self, node: &mut BehaviorTreeNode, wm: &dyn WorldModel) -> State;

    /// Sets a sticky cancellation flag checked on the next `traverse`. A
    /// no-op for visitors with nothing to cancel (everything but
    /// [`ExecuteVisitor`]).
    fn preempt(&mut self) {}
}

pub(crate) fn sequence_state(children: &[State]) -> State {
    if children.iter().any(|s| *s == State::Failure) {
        State::Failure
    } else if children.iter().all(|s| *s == State::Success) {
        State::Success
    } else {
        State::Running
    }
}

pub(crate) fn selector_state(children: &[State]) -> State {
    if children.iter().any(|s| *s == State::Success) {
        State::Success
    } else if children.iter().all(|s| *s == State::Failure) {
        State::Failure
    } else {
        State::Running
    }
}

pub(crate) fn parallel_state(children: &[State], required_successes: usize) -> State {
    let successes = children.iter().filter(|s| **s == State::Success).count();
    let failures = children.iter().filter(|s| **s == State::Failure).count();
    if successes >= required_successes {
        State::Success
    } else if failures > children.len().saturating_sub(required_successes) {
        State::Failure
    } else {
        State::Running
    }
}
