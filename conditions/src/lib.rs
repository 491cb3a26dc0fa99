//! Condition algebra evaluated against a [`skiros_model::ParamHandler`] and a
//! [`skiros_model::WorldModel`]: the predicates a skill's preconditions,
//! hold-conditions and postconditions are built from.

pub mod compare;
pub mod condition;
pub mod snapshot;

pub use compare::CompareOp;
pub use condition::{
    AbstractRelationCondition, Condition, ConditionFn, FunctionCondition, GenerateCondition, HasPropertyCondition, IsSpecifiedCondition,
    OnTypeCondition, OrCondition, PropertyCondition, RelationCondition,
};
pub use snapshot::Snapshot;
