use skiros_conditions::Condition;
use skiros_model::ParamHandler;

use crate::skill::{Skill, State};

/// How many of a [`Parallel`](BehaviorTreeNode::Parallel) node's children must
/// succeed for the node itself to succeed.
#[derive(Debug, Clone, Copy)]
pub struct ParallelPolicy {
    pub required_successes: usize,
}

#[derive(Clone)]
pub enum DecoratorKind {
    Negate,
    Repeat { limit: u32, count: u32 },
    While(Box<Condition>),
}

/// A node in a behavior tree.
///
/// Parent→child ownership is tree-shaped (a `Vec` of owned children); there
/// is deliberately no child→parent back-reference. The source design calls
/// for one non-owning weak pointer used only during keyspace remapping, but
/// `remap` here is a top-down recursive rewrite that never needs to walk
/// upward, so the pointer would be dead weight.
pub enum BehaviorTreeNode {
    Root {
        params: ParamHandler,
        state: State,
        child: Box<BehaviorTreeNode>,
    },
    Sequence {
        params: ParamHandler,
        state: State,
        children: Vec<BehaviorTreeNode>,
    },
    Selector {
        params: ParamHandler,
        state: State,
        children: Vec<BehaviorTreeNode>,
    },
    Parallel {
        params: ParamHandler,
        state: State,
        policy: ParallelPolicy,
        children: Vec<BehaviorTreeNode>,
    },
    Decorator {
        params: ParamHandler,
        state: State,
        kind: DecoratorKind,
        child: Box<BehaviorTreeNode>,
    },
    SkillWrapper { skill: Skill },
}

impl BehaviorTreeNode {
    pub fn root(params: ParamHandler, child: BehaviorTreeNode) -> Self {
        BehaviorTreeNode::Root {
            params,
            state: State::Idle,
            child: Box::new(child),
        }
    }

    pub fn sequence(params: ParamHandler, children: Vec<BehaviorTreeNode>) -> Self {
        BehaviorTreeNode::Sequence {
            params,
            state: State::Idle,
            children,
        }
    }

    pub fn selector(params: ParamHandler, children: Vec<BehaviorTreeNode>) -> Self {
        BehaviorTreeNode::Selector {
            params,
            state: State::Idle,
            children,
        }
    }

    pub fn parallel(params: ParamHandler, required_successes: usize, children: Vec<BehaviorTreeNode>) -> Self {
        BehaviorTreeNode::Parallel {
            params,
            state: State::Idle,
            policy: ParallelPolicy { required_successes },
            children,
        }
    }

    pub fn decorator(params: ParamHandler, kind: DecoratorKind, child: BehaviorTreeNode) -> Self {
        BehaviorTreeNode::Decorator {
            params,
            state: State::Idle,
            kind,
            child: Box::new(child),
        }
    }

    pub fn skill(skill: Skill) -> Self {
        BehaviorTreeNode::SkillWrapper { skill }
    }

    pub fn state(&self) -> State {
        match self {
            BehaviorTreeNode::Root { state, .. }
            | BehaviorTreeNode::Sequence { state, .. }
            | BehaviorTreeNode::Selector { state, .. }
            | BehaviorTreeNode::Parallel { state, .. }
            | BehaviorTreeNode::Decorator { state, .. } => *state,
            BehaviorTreeNode::SkillWrapper { skill } => skill.state(),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            BehaviorTreeNode::Root { .. } => "Root",
            BehaviorTreeNode::Sequence { .. } => "Sequence",
            BehaviorTreeNode::Selector { .. } => "Selector",
            BehaviorTreeNode::Parallel { .. } => "Parallel",
            BehaviorTreeNode::Decorator { kind, .. } => match kind {
                DecoratorKind::Negate => "Negate",
                DecoratorKind::Repeat { .. } => "Repeat",
                DecoratorKind::While(_) => "While",
            },
            BehaviorTreeNode::SkillWrapper { skill } => skill.label.as_str(),
        }
    }

    pub(crate) fn set_state(&mut self, new_state: State) {
        match self {
            BehaviorTreeNode::Root { state, .. }
            | BehaviorTreeNode::Sequence { state, .. }
            | BehaviorTreeNode::Selector { state, .. }
            | BehaviorTreeNode::Parallel { state, .. }
            | BehaviorTreeNode::Decorator { state, .. } => *state = new_state,
            BehaviorTreeNode::SkillWrapper { skill } => skill.set_state(new_state),
        }
    }

    /// Folds `old_key`'s bindings into `new_key` across this node's own
    /// params, any attached conditions, and recursively into children —
    /// used when a child's parameter keyspace is merged into its parent's
    /// at tree-assembly time.
    pub fn remap(&mut self, old_key: &str, new_key: &str) {
        match self {
            BehaviorTreeNode::Root { params, child, .. } => {
                params.remap(old_key, new_key);
                child.remap(old_key, new_key);
            }
            BehaviorTreeNode::Sequence { params, children, .. } | BehaviorTreeNode::Selector { params, children, .. } => {
                params.remap(old_key, new_key);
                for child in children {
                    child.remap(old_key, new_key);
                }
            }
            BehaviorTreeNode::Parallel { params, children, .. } => {
                params.remap(old_key, new_key);
                for child in children {
                    child.remap(old_key, new_key);
                }
            }
            BehaviorTreeNode::Decorator { params, kind, child, .. } => {
                params.remap(old_key, new_key);
                if let DecoratorKind::While(condition) = kind {
                    condition.remap(old_key, new_key);
                }
                child.remap(old_key, new_key);
            }
            BehaviorTreeNode::SkillWrapper { skill } => {
                skill.params.remap(old_key, new_key);
                for condition in skill
                    .preconditions
                    .iter_mut()
                    .chain(skill.postconditions.iter_mut())
                    .chain(skill.hold_conditions.iter_mut())
                {
                    condition.remap(old_key, new_key);
                }
            }
        }
    }
}
