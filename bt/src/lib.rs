//! The behavior-tree core: leaf [`Skill`]s driven through `on_start`/
//! `on_step`/`on_end`, composite [`BehaviorTreeNode`]s that fold their
//! children's states, and the [`visitor`] traversals that drive, print,
//! simulate or snapshot a tree.

pub mod library;
pub mod node;
pub mod skill;
pub mod visitor;

pub use node::{BehaviorTreeNode, DecoratorKind, ParallelPolicy};
pub use skill::{Skill, SkillBody, State};
pub use visitor::{ExecuteVisitor, PrintVisitor, ProgressEvent, ProgressSnapshot, ProgressVisitor, ReversibleSimulator, Visitor};
