use skiros_model::{Element, Relation};

/// Rollback state captured by `Condition::set_true` and consumed exactly
/// once by `Condition::revert`.
///
/// The source system keeps this as a `_cache` side channel mutated in place
/// on the condition object; here it is a plain typed field (`Option<Snapshot>`)
/// so a revert with nothing to undo is a type-level `None`, not a runtime flag.
#[derive(Debug, Clone)]
pub enum Snapshot {
    /// The subject element's state prior to a property/existence mutation.
    Element(Element),
    /// Relations touching the object endpoint prior to `set_relation`, so a
    /// revert can both flip the new relation back and restore whichever
    /// conflicting edges it displaced.
    Relations(Vec<Relation>),
    /// `IsSpecified`/`Generate`: the subject's binding before the mutation,
    /// plus whether a fresh world element was grounded and must be removed.
    Binding { original: Element, grounded_id: Option<String> },
}
