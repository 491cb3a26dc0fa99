use std::sync::Arc;

use skiros_model::world_model::OntologyQuery;
use skiros_model::{Element, ParamHandler, Scalar, Value, WorldModel, WILDCARD};

use crate::compare::CompareOp;
use crate::snapshot::Snapshot;

/// A predicate over parameters and world state.
///
/// Every variant implements the same seven-operation contract (`evaluate`,
/// `set_true`, `revert`, `set_desired_state`, `to_element`, `is_equal`,
/// `has_conflict`) through the inherent methods below — a closed sum type
/// stands in for the source system's abstract-base-class dispatch, since the
/// set of condition kinds is fixed and known at compile time.
#[derive(Debug, Clone)]
pub enum Condition {
    Property(PropertyCondition),
    HasProperty(HasPropertyCondition),
    Relation(RelationCondition),
    AbstractRelation(AbstractRelationCondition),
    IsSpecified(IsSpecifiedCondition),
    Generate(GenerateCondition),
    OnType(OnTypeCondition),
    Function(FunctionCondition),
    Or(OrCondition),
}

#[derive(Debug, Clone)]
pub struct PropertyCondition {
    pub label: String,
    pub key: String,
    pub prop: String,
    pub op: CompareOp,
    pub value: Scalar,
    pub desired: bool,
    cache: Option<Snapshot>,
}

#[derive(Debug, Clone)]
pub struct HasPropertyCondition {
    pub label: String,
    pub key: String,
    pub prop: String,
    pub desired: bool,
    cache: Option<Snapshot>,
}

#[derive(Debug, Clone)]
pub struct RelationCondition {
    pub label: String,
    pub subj: String,
    pub obj: String,
    pub predicate: String,
    pub desired: bool,
    cache: Option<Snapshot>,
}

#[derive(Debug, Clone)]
pub struct AbstractRelationCondition {
    pub label: String,
    pub subj: String,
    pub obj: String,
    pub predicate: String,
    pub desired: bool,
}

#[derive(Debug, Clone)]
pub struct IsSpecifiedCondition {
    pub label: String,
    pub key: String,
    pub desired: bool,
    cache: Option<Snapshot>,
}

#[derive(Debug, Clone)]
pub struct GenerateCondition {
    pub label: String,
    pub key: String,
    pub desired: bool,
    /// The element type to ground when `set_true` creates a new one.
    pub value_type: String,
    /// Id of the world element a freshly-generated element is parented under.
    pub scene_root: String,
    cache: Option<Snapshot>,
}

#[derive(Debug, Clone)]
pub struct OnTypeCondition {
    pub label: String,
    pub key: String,
    pub type_iri: String,
}

pub type ConditionFn = Arc<dyn Fn(&[Value]) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct FunctionCondition {
    pub label: String,
    pub keys: Vec<String>,
    pub f: ConditionFn,
    pub desired: bool,
}

impl std::fmt::Debug for FunctionCondition {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fmt.debug_struct("FunctionCondition")
            .field("label", &self.label)
            .field("keys", &self.keys)
            .field("desired", &self.desired)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct OrCondition {
    pub desired: bool,
    pub children: Vec<Condition>,
}

impl Condition {
    pub fn property(key: impl Into<String>, prop: impl Into<String>, op: CompareOp, value: impl Into<Scalar>, desired: bool) -> Self {
        Condition::Property(PropertyCondition {
            label: "Property".to_string(),
            key: key.into(),
            prop: prop.into(),
            op,
            value: value.into(),
            desired,
            cache: None,
        })
    }

    pub fn has_property(key: impl Into<String>, prop: impl Into<String>, desired: bool) -> Self {
        Condition::HasProperty(HasPropertyCondition {
            label: "HasProperty".to_string(),
            key: key.into(),
            prop: prop.into(),
            desired,
            cache: None,
        })
    }

    pub fn relation(subj: impl Into<String>, obj: impl Into<String>, predicate: impl Into<String>, desired: bool) -> Self {
        Condition::Relation(RelationCondition {
            label: "Relation".to_string(),
            subj: subj.into(),
            obj: obj.into(),
            predicate: predicate.into(),
            desired,
            cache: None,
        })
    }

    pub fn abstract_relation(subj: impl Into<String>, obj: impl Into<String>, predicate: impl Into<String>, desired: bool) -> Self {
        Condition::AbstractRelation(AbstractRelationCondition {
            label: "AbstractRelation".to_string(),
            subj: subj.into(),
            obj: obj.into(),
            predicate: predicate.into(),
            desired,
        })
    }

    pub fn is_specified(key: impl Into<String>, desired: bool) -> Self {
        Condition::IsSpecified(IsSpecifiedCondition {
            label: "IsSpecified".to_string(),
            key: key.into(),
            desired,
            cache: None,
        })
    }

    pub fn generate(key: impl Into<String>, value_type: impl Into<String>, scene_root: impl Into<String>, desired: bool) -> Self {
        Condition::Generate(GenerateCondition {
            label: "Generate".to_string(),
            key: key.into(),
            desired,
            value_type: value_type.into(),
            scene_root: scene_root.into(),
            cache: None,
        })
    }

    pub fn on_type(key: impl Into<String>, type_iri: impl Into<String>) -> Self {
        Condition::OnType(OnTypeCondition {
            label: "OnType".to_string(),
            key: key.into(),
            type_iri: type_iri.into(),
        })
    }

    pub fn function(keys: Vec<String>, f: ConditionFn, desired: bool) -> Self {
        Condition::Function(FunctionCondition {
            label: "Function".to_string(),
            keys,
            f,
            desired,
        })
    }

    pub fn or(desired: bool, children: Vec<Condition>) -> Self {
        Condition::Or(OrCondition { desired, children })
    }

    /// The parameter keys this condition reads or mutates.
    pub fn keys(&self) -> Vec<String> {
        match self {
            Condition::Property(c) => vec![c.key.clone()],
            Condition::HasProperty(c) => vec![c.key.clone()],
            Condition::Relation(c) => vec![c.subj.clone(), c.obj.clone()],
            Condition::AbstractRelation(c) => vec![c.subj.clone(), c.obj.clone()],
            Condition::IsSpecified(c) => vec![c.key.clone()],
            Condition::Generate(c) => vec![c.key.clone()],
            Condition::OnType(c) => vec![c.key.clone()],
            Condition::Function(c) => c.keys.clone(),
            Condition::Or(c) => c.children.iter().flat_map(Condition::keys).collect(),
        }
    }

    /// Rewrites every key matching `old_key` to `new_key`, used when a
    /// child's conditions are folded into its parent's keyspace.
    pub fn remap(&mut self, old_key: &str, new_key: &str) {
        let swap = |k: &mut String| {
            if k == old_key {
                *k = new_key.to_string();
            }
        };
        match self {
            Condition::Property(c) => swap(&mut c.key),
            Condition::HasProperty(c) => swap(&mut c.key),
            Condition::Relation(c) => {
                swap(&mut c.subj);
                swap(&mut c.obj);
            }
            Condition::AbstractRelation(c) => {
                swap(&mut c.subj);
                swap(&mut c.obj);
            }
            Condition::IsSpecified(c) => swap(&mut c.key),
            Condition::Generate(c) => swap(&mut c.key),
            Condition::OnType(c) => swap(&mut c.key),
            Condition::Function(c) => c.keys.iter_mut().for_each(|k| swap(k)),
            Condition::Or(c) => c.children.iter_mut().for_each(|child| child.remap(old_key, new_key)),
        }
    }

    pub fn description(&self) -> String {
        match self {
            Condition::Property(c) => format!("[{}] {}-{}-{}{} ({})", c.label, c.key, c.prop, c.op, c.value, c.desired),
            Condition::HasProperty(c) => format!("[{}] {}-{} ({})", c.label, c.key, c.prop, c.desired),
            Condition::Relation(c) => format!("[{}] {}-{}-{} ({})", c.label, c.subj, c.predicate, c.obj, c.desired),
            Condition::AbstractRelation(c) => format!("[{}] {}-{}-{} ({})", c.label, c.subj, c.predicate, c.obj, c.desired),
            Condition::IsSpecified(c) => format!("[{}] {} ({})", c.label, c.key, c.desired),
            Condition::Generate(c) => format!("[{}] {} ({})", c.label, c.key, c.desired),
            Condition::OnType(c) => format!("[{}] {} is of type {}", c.label, c.key, c.type_iri),
            Condition::Function(c) => format!("[{}] {:?} respects function", c.label, c.keys),
            Condition::Or(c) => format!(
                "[or] ( {} )",
                c.children.iter().map(Condition::description).collect::<Vec<_>>().join(" ")
            ),
        }
    }

    pub fn evaluate(&self, ph: &ParamHandler, wm: &dyn WorldModel) -> bool {
        match self {
            Condition::Property(c) => {
                let Ok(subj) = ph.get_element(&c.key) else { return false };
                if c.op == CompareOp::Eq {
                    subj.has_property_value(&c.prop, &c.value) == c.desired
                } else {
                    match subj.property_value(&c.prop) {
                        Some(v) => c.op.apply(v, &c.value) == c.desired,
                        None => false,
                    }
                }
            }
            Condition::HasProperty(c) => {
                let Ok(subj) = ph.get_element(&c.key) else { return false };
                if subj.is_abstract() {
                    return ph.get_param(&c.key).is_ok_and(|p| p.param_type == skiros_model::ParamType::Optional);
                }
                if subj.has_property(&c.prop) {
                    subj.is_specified(&c.prop) == c.desired
                } else {
                    !c.desired
                }
            }
            Condition::Relation(c) => {
                let Ok(subj) = ph.get_element(&c.subj) else { return false };
                let Ok(obj) = ph.get_element(&c.obj) else { return false };
                let found = if !subj.is_abstract() && !obj.is_abstract() {
                    !wm.get_relations(&subj.id, &c.predicate, &obj.id).is_empty()
                } else {
                    !wm.query_ontology(&OntologyQuery::RelationLookup {
                        subj: (!subj.is_abstract()).then(|| subj.id.clone()),
                        subj_type: subj.is_abstract().then(|| subj.type_.clone()),
                        predicate: c.predicate.clone(),
                        obj: (!obj.is_abstract()).then(|| obj.id.clone()),
                        obj_type: obj.is_abstract().then(|| obj.type_.clone()),
                    })
                    .is_empty()
                };
                found == c.desired
            }
            Condition::AbstractRelation(c) => {
                let Ok(subj) = ph.get_element(&c.subj) else { return false };
                let Ok(obj) = ph.get_element(&c.obj) else { return false };
                let found = !wm
                    .query_ontology(&OntologyQuery::AbstractRelationLookup {
                        subj_type: subj.type_.clone(),
                        predicate: c.predicate.clone(),
                        obj_type: obj.type_.clone(),
                    })
                    .is_empty();
                found == c.desired
            }
            Condition::IsSpecified(c) => {
                let Ok(subj) = ph.get_element(&c.key) else { return false };
                (subj.id_number() >= 0) == c.desired
            }
            Condition::Generate(c) => {
                let Ok(subj) = ph.get_element(&c.key) else { return false };
                (subj.id_number() >= 0) == c.desired
            }
            Condition::OnType(c) => {
                let Ok(subj) = ph.get_element(&c.key) else { return false };
                let mut types = wm.get_sub_classes(&subj.type_);
                types.push(subj.type_.clone());
                types.contains(&c.type_iri) || subj.type_ == c.type_iri
            }
            Condition::Function(c) => {
                let Ok(values) = c.keys.iter().map(|k| ph.get_param_value(k).map(Clone::clone)).collect::<Result<Vec<_>, _>>() else {
                    return false;
                };
                (c.f)(&values) == c.desired
            }
            Condition::Or(c) => {
                if c.children.iter().any(|child| child.evaluate(ph, wm)) {
                    c.desired
                } else {
                    !c.desired
                }
            }
        }
    }

    /// Mutates `ph`/`wm` so `evaluate` would return true, stashing rollback
    /// state in the condition's own `cache` field. Returns whether the
    /// mutation applied; a precondition miss (e.g. a still-abstract subject
    /// a relation needs grounded) leaves no cache and returns `false`.
    pub fn set_true(&mut self, ph: &mut ParamHandler, wm: &dyn WorldModel) -> bool {
        match self {
            Condition::Property(c) => {
                let Ok(subj) = ph.get_element(&c.key) else { return false };
                if subj.is_abstract() {
                    return false;
                }
                let cache = Snapshot::Element(subj.clone());
                let mut subj = subj.clone();
                if c.desired {
                    if !subj.has_property_value(&c.prop, &c.value) {
                        subj.append_property(c.prop.clone(), c.value.clone());
                    }
                } else {
                    subj.remove_property_value(&c.prop, &c.value);
                }
                if ph.specify(&c.key, subj.clone()).is_err() || wm.update_element(&subj).is_err() {
                    return false;
                }
                c.cache = Some(cache);
                true
            }
            Condition::HasProperty(c) => {
                let Ok(subj) = ph.get_element(&c.key) else { return false };
                if subj.is_abstract() {
                    return false;
                }
                let cache = Snapshot::Element(subj.clone());
                let mut subj = subj.clone();
                if c.desired {
                    if !subj.has_property(&c.prop) {
                        subj.set_property(c.prop.clone(), "");
                    }
                } else {
                    subj.remove_property(&c.prop);
                }
                if ph.specify(&c.key, subj.clone()).is_err() || wm.update_element(&subj).is_err() {
                    return false;
                }
                c.cache = Some(cache);
                true
            }
            Condition::Relation(c) => {
                let (Ok(subj), Ok(obj)) = (ph.get_element(&c.subj), ph.get_element(&c.obj)) else {
                    return false;
                };
                if subj.is_abstract() || obj.is_abstract() {
                    return false;
                }
                let (subj_id, obj_id) = (subj.id.clone(), obj.id.clone());
                let displaced = wm.get_relations(WILDCARD, "", &obj_id);
                if !wm.set_relation(&subj_id, &c.predicate, &obj_id, c.desired).unwrap_or(false) {
                    return false;
                }
                c.cache = Some(Snapshot::Relations(displaced));
                true
            }
            Condition::AbstractRelation(_) => false,
            Condition::IsSpecified(c) => {
                let Ok(subj) = ph.get_element(&c.key) else { return false };
                let subj = subj.clone();
                let cache = Snapshot::Binding {
                    original: subj.clone(),
                    grounded_id: None,
                };
                if subj.id_number() < 0 && c.desired {
                    let fake = Element::grounded(":==fake==-1", subj.type_.clone(), subj.label.clone());
                    if ph.specify(&c.key, fake).is_err() {
                        return false;
                    }
                } else if subj.id_number() >= 0 && !c.desired {
                    let mut unbound = subj;
                    unbound.id.clear();
                    if ph.specify(&c.key, unbound).is_err() {
                        return false;
                    }
                }
                c.cache = Some(cache);
                true
            }
            Condition::Generate(c) => {
                let Ok(subj) = ph.get_element(&c.key) else { return false };
                let subj = subj.clone();
                if subj.id_number() < 0 && c.desired {
                    let fresh = Element::new(c.value_type.clone(), subj.label.clone());
                    let Ok(grounded) = wm.add_element(&fresh, &c.scene_root, "skiros:contain") else {
                        return false;
                    };
                    let cache = Snapshot::Binding {
                        original: subj,
                        grounded_id: Some(grounded.id.clone()),
                    };
                    if ph.specify(&c.key, grounded).is_err() {
                        return false;
                    }
                    c.cache = Some(cache);
                } else if subj.id_number() >= 0 && !c.desired {
                    if wm.remove_element(&subj.id).is_err() {
                        return false;
                    }
                    let mut unbound = subj.clone();
                    unbound.id.clear();
                    let cache = Snapshot::Binding {
                        original: subj,
                        grounded_id: None,
                    };
                    if ph.specify(&c.key, unbound).is_err() {
                        return false;
                    }
                    c.cache = Some(cache);
                } else {
                    c.cache = Some(Snapshot::Binding {
                        original: subj,
                        grounded_id: None,
                    });
                }
                true
            }
            Condition::OnType(_) | Condition::Function(_) => true,
            Condition::Or(c) => {
                let mut applied = 0;
                for child in c.children.iter_mut() {
                    if child.set_true(ph, wm) {
                        applied += 1;
                    } else {
                        for child in c.children.iter_mut().take(applied) {
                            child.revert(ph, wm);
                        }
                        return false;
                    }
                }
                true
            }
        }
    }

    /// Undoes whatever mutation `set_true` applied, consuming the internal
    /// cache. Idempotent: a condition with nothing cached (never set, or
    /// already reverted) leaves world/params untouched and returns `false`.
    pub fn revert(&mut self, ph: &mut ParamHandler, wm: &dyn WorldModel) -> bool {
        match self {
            Condition::Property(c) => match c.cache.take() {
                Some(Snapshot::Element(cached)) => {
                    let _ = ph.specify(&c.key, cached.clone());
                    wm.update_element(&cached).is_ok()
                }
                _ => false,
            },
            Condition::HasProperty(c) => match c.cache.take() {
                Some(Snapshot::Element(cached)) => {
                    let _ = ph.specify(&c.key, cached.clone());
                    wm.update_element(&cached).is_ok()
                }
                _ => false,
            },
            Condition::Relation(c) => match c.cache.take() {
                Some(Snapshot::Relations(displaced)) => {
                    let (Ok(subj), Ok(obj)) = (ph.get_element(&c.subj), ph.get_element(&c.obj)) else {
                        return false;
                    };
                    let (subj_id, obj_id) = (subj.id.clone(), obj.id.clone());
                    let _ = wm.set_relation(&subj_id, &c.predicate, &obj_id, !c.desired);
                    for edge in displaced {
                        let _ = wm.set_relation(&edge.src, &edge.predicate, &edge.dst, true);
                    }
                    true
                }
                _ => false,
            },
            Condition::AbstractRelation(_) | Condition::OnType(_) | Condition::Function(_) => false,
            Condition::IsSpecified(c) => match c.cache.take() {
                Some(Snapshot::Binding { original, .. }) => ph.specify(&c.key, original).is_ok(),
                _ => false,
            },
            Condition::Generate(c) => match c.cache.take() {
                Some(Snapshot::Binding { original, grounded_id }) => {
                    if let Some(id) = grounded_id {
                        let _ = wm.remove_element(&id);
                    } else if original.id_number() >= 0 {
                        let _ = wm.add_element(&original, &c.scene_root, "skiros:contain");
                    }
                    ph.specify(&c.key, original).is_ok()
                }
                _ => false,
            },
            Condition::Or(c) => {
                let mut any = false;
                for child in c.children.iter_mut() {
                    any |= child.revert(ph, wm);
                }
                any
            }
        }
    }

    pub fn set_desired_state(&self, ph: &mut ParamHandler) {
        match self {
            Condition::Property(c) => {
                if let Ok(e) = ph.get_element(&c.key) {
                    if e.id_number() >= 0 {
                        return;
                    }
                    let mut e = e.clone();
                    if c.desired {
                        if !e.has_property_value(&c.prop, &c.value) {
                            e.append_property(c.prop.clone(), c.value.clone());
                        }
                    } else {
                        e.remove_property_value(&c.prop, &c.value);
                    }
                    let _ = ph.specify(&c.key, e);
                }
            }
            Condition::HasProperty(c) => {
                if let Ok(e) = ph.get_element(&c.key) {
                    if e.id_number() >= 0 {
                        return;
                    }
                    let mut e = e.clone();
                    if c.desired {
                        if !e.has_property(&c.prop) {
                            e.set_property(c.prop.clone(), "");
                        }
                    } else {
                        e.remove_property(&c.prop);
                    }
                    let _ = ph.specify(&c.key, e);
                }
            }
            Condition::Relation(c) => {
                if let Ok(subj) = ph.get_element(&c.subj) {
                    if subj.id_number() < 0 {
                        let mut subj = subj.clone();
                        if !subj.has_relation(WILDCARD, &c.predicate, &c.obj, c.desired) {
                            subj.add_relation(WILDCARD, c.predicate.clone(), c.obj.clone(), c.desired, false);
                        }
                        let _ = ph.specify(&c.subj, subj);
                        return;
                    }
                }
                if let Ok(obj) = ph.get_element(&c.obj) {
                    if obj.id_number() < 0 {
                        let mut obj = obj.clone();
                        if !obj.has_relation(&c.subj, &c.predicate, WILDCARD, c.desired) {
                            obj.add_relation(c.subj.clone(), c.predicate.clone(), WILDCARD, c.desired, false);
                        }
                        let _ = ph.specify(&c.obj, obj);
                    }
                }
            }
            Condition::AbstractRelation(c) => {
                if let Ok(subj) = ph.get_element(&c.subj) {
                    if subj.id_number() < 0 {
                        let mut subj = subj.clone();
                        if !subj.has_relation(WILDCARD, &c.predicate, &c.obj, c.desired) {
                            subj.add_relation(WILDCARD, c.predicate.clone(), c.obj.clone(), c.desired, true);
                        }
                        let _ = ph.specify(&c.subj, subj);
                    }
                }
                if let Ok(obj) = ph.get_element(&c.obj) {
                    if obj.id_number() < 0 {
                        let mut obj = obj.clone();
                        if !obj.has_relation(&c.subj, &c.predicate, WILDCARD, c.desired) {
                            obj.add_relation(c.subj.clone(), c.predicate.clone(), WILDCARD, c.desired, true);
                        }
                        let _ = ph.specify(&c.obj, obj);
                    }
                }
            }
            Condition::OnType(c) => {
                if let Ok(e) = ph.get_element(&c.key) {
                    if e.id_number() >= 0 {
                        return;
                    }
                    let mut e = e.clone();
                    e.type_ = c.type_iri.clone();
                    let _ = ph.specify(&c.key, e);
                }
            }
            Condition::IsSpecified(_) | Condition::Generate(_) | Condition::Function(_) => {}
            Condition::Or(c) => {
                for child in &c.children {
                    child.set_desired_state(ph);
                }
            }
        }
    }

    pub fn to_element(&self) -> Element {
        let class = match self {
            Condition::Property(_) => "skiros:ConditionProperty",
            Condition::HasProperty(_) => "skiros:ConditionHasProperty",
            Condition::Relation(_) => "skiros:ConditionRelation",
            Condition::AbstractRelation(_) => "skiros:AbstractConditionRelation",
            Condition::IsSpecified(_) => "skiros:ConditionIsSpecified",
            Condition::Generate(_) => "skiros:ConditionGenerate",
            Condition::OnType(_) => "skiros:ConditionOnType",
            Condition::Function(_) => "skiros:ConditionFunction",
            Condition::Or(_) => "skiros:ConditionOr",
        };
        let mut e = Element::new(class, self.label());
        match self {
            Condition::Property(c) => {
                e.set_property("skiros:hasSubject", c.key.clone());
                e.set_property("skiros:appliedOnType", c.prop.clone());
                e.set_property("skiros:operator", c.op.symbol());
                e.set_property("skiros:desiredValue", c.value.clone());
                e.set_property("skiros:desiredState", c.desired);
            }
            Condition::HasProperty(c) => {
                e.set_property("skiros:hasSubject", c.key.clone());
                e.set_property("skiros:appliedOnType", c.prop.clone());
                e.set_property("skiros:desiredState", c.desired);
            }
            Condition::Relation(c) => {
                e.set_property("skiros:hasSubject", c.subj.clone());
                e.set_property("skiros:hasObject", c.obj.clone());
                e.set_property("skiros:appliedOnType", c.predicate.clone());
                e.set_property("skiros:desiredState", c.desired);
            }
            Condition::AbstractRelation(c) => {
                e.set_property("skiros:hasSubject", c.subj.clone());
                e.set_property("skiros:hasObject", c.obj.clone());
                e.set_property("skiros:appliedOnType", c.predicate.clone());
                e.set_property("skiros:desiredState", c.desired);
            }
            Condition::IsSpecified(c) => {
                e.set_property("skiros:hasSubject", c.key.clone());
                e.set_property("skiros:desiredState", c.desired);
            }
            Condition::Generate(c) => {
                e.set_property("skiros:hasSubject", c.key.clone());
                e.set_property("skiros:desiredState", c.desired);
            }
            Condition::OnType(c) => {
                e.set_property("skiros:hasSubject", c.key.clone());
                e.set_property("skiros:desiredValue", c.type_iri.clone());
            }
            Condition::Function(c) => {
                e.set_property("skiros:desiredState", c.desired);
            }
            Condition::Or(c) => {
                e.set_property("skiros:desiredState", c.desired);
            }
        }
        e
    }

    fn label(&self) -> String {
        match self {
            Condition::Property(c) => c.label.clone(),
            Condition::HasProperty(c) => c.label.clone(),
            Condition::Relation(c) => c.label.clone(),
            Condition::AbstractRelation(c) => c.label.clone(),
            Condition::IsSpecified(c) => c.label.clone(),
            Condition::Generate(c) => c.label.clone(),
            Condition::OnType(c) => c.label.clone(),
            Condition::Function(c) => c.label.clone(),
            Condition::Or(_) => "or".to_string(),
        }
    }

    pub fn is_equal(&self, other: &Condition) -> bool {
        match (self, other) {
            (Condition::Property(a), Condition::Property(b)) => {
                a.key == b.key && a.op == b.op && a.prop == b.prop && a.value == b.value && a.desired == b.desired
            }
            (Condition::HasProperty(a), Condition::HasProperty(b)) => a.key == b.key && a.prop == b.prop && a.desired == b.desired,
            (Condition::Relation(a), Condition::Relation(b)) => {
                a.subj == b.subj && a.predicate == b.predicate && a.obj == b.obj && a.desired == b.desired
            }
            // Variant-exact, unlike the source system (see Design Notes item 3): an
            // AbstractRelation never compares equal to a concrete Relation.
            (Condition::AbstractRelation(a), Condition::AbstractRelation(b)) => {
                a.subj == b.subj && a.predicate == b.predicate && a.obj == b.obj && a.desired == b.desired
            }
            (Condition::IsSpecified(a), Condition::IsSpecified(b)) => a.key == b.key && a.desired == b.desired,
            (Condition::Generate(a), Condition::Generate(b)) => a.key == b.key && a.desired == b.desired,
            (Condition::OnType(a), Condition::OnType(b)) => a.key == b.key && a.type_iri == b.type_iri,
            (Condition::Function(a), Condition::Function(b)) => a.keys == b.keys && a.desired == b.desired && Arc::ptr_eq(&a.f, &b.f),
            (Condition::Or(a), Condition::Or(b)) => {
                a.desired == b.desired
                    && a.children.len() == b.children.len()
                    && a.children.iter().zip(&b.children).all(|(x, y)| x.is_equal(y))
            }
            _ => false,
        }
    }

    pub fn has_conflict(&self, other: &Condition) -> bool {
        match (self, other) {
            (Condition::Property(a), Condition::Property(b)) => {
                a.prop == b.prop && a.value == b.value && a.desired != b.desired && a.key == b.key
            }
            (Condition::HasProperty(a), Condition::HasProperty(b)) => a.prop == b.prop && a.desired != b.desired && a.key == b.key,
            (Condition::Relation(a), Condition::Relation(b)) => {
                a.predicate == b.predicate && a.desired != b.desired && a.subj == b.subj && a.obj == b.obj
            }
            (Condition::AbstractRelation(a), Condition::AbstractRelation(b)) => {
                a.predicate == b.predicate && a.desired != b.desired && a.subj == b.subj && a.obj == b.obj
            }
            (Condition::IsSpecified(a), Condition::IsSpecified(b)) => a.key == b.key && a.desired != b.desired,
            (Condition::Generate(a), Condition::Generate(b)) => a.key == b.key && a.desired != b.desired,
            (Condition::OnType(a), Condition::OnType(b)) => a.key == b.key && a.type_iri != b.type_iri,
            (Condition::Function(a), Condition::Function(b)) => a.keys == b.keys,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skiros_model::{Element, InMemoryWorldModel, ParamType};

    fn handler_with(key: &str, elem: Element, ptype: ParamType) -> ParamHandler {
        let mut ph = ParamHandler::new();
        ph.add_param(key, elem, ptype);
        ph
    }

    #[test]
    fn has_property_optional_unbound_is_true() {
        let ph = handler_with("Target", Element::new("skiros:Object", "Target"), ParamType::Optional);
        let wm = InMemoryWorldModel::new();
        let c = Condition::has_property("Target", "skiros:done", true);
        assert!(c.evaluate(&ph, &wm));
    }

    #[test]
    fn has_property_required_unbound_is_false() {
        let ph = handler_with("Target", Element::new("skiros:Object", "Target"), ParamType::Required);
        let wm = InMemoryWorldModel::new();
        let c = Condition::has_property("Target", "skiros:done", true);
        assert!(!c.evaluate(&ph, &wm));
    }

    #[test]
    fn property_set_true_and_revert_round_trip() {
        let wm = InMemoryWorldModel::new();
        let grounded = wm.add_element(&Element::new("skiros:Object", "Target"), "", "").unwrap();
        let mut ph = handler_with("Target", grounded.clone(), ParamType::Required);
        let mut c = Condition::property("Target", "skiros:weight", CompareOp::Eq, 3i64, true);
        assert!(!c.evaluate(&ph, &wm));
        assert!(c.set_true(&mut ph, &wm), "grounded subject can be mutated");
        assert!(c.evaluate(&ph, &wm));
        assert!(c.revert(&mut ph, &wm));
        assert!(!c.revert(&mut ph, &wm), "revert is idempotent once the cache is consumed");
        assert!(!c.evaluate(&ph, &wm));
        assert_eq!(wm.get_element(&grounded.id).unwrap(), grounded);
    }

    #[test]
    fn conflicting_property_conditions() {
        let a = Condition::property("K", "skiros:p", CompareOp::Eq, "v", true);
        let b = Condition::property("K", "skiros:p", CompareOp::Eq, "v", false);
        assert!(a.has_conflict(&b));
        assert!(!a.is_equal(&b));
    }

    #[test]
    fn or_evaluates_like_any_with_desired_polarity() {
        let ph = handler_with("K", Element::grounded(":o-1", "skiros:Object", "K"), ParamType::Required);
        let wm = InMemoryWorldModel::new();
        let true_child = Condition::is_specified("K", true);
        let false_child = Condition::is_specified("K", false);
        assert!(Condition::or(true, vec![false_child.clone(), true_child.clone()]).evaluate(&ph, &wm));
        assert!(!Condition::or(true, vec![false_child]).evaluate(&ph, &wm));
    }

    #[test]
    fn abstract_relation_set_true_always_fails() {
        let mut ph = handler_with("S", Element::new("skiros:Object", "S"), ParamType::Required);
        let wm = InMemoryWorldModel::new();
        let mut c = Condition::abstract_relation("S", "O", "skiros:hasA", true);
        ph.add_param("O", Element::new("skiros:Object", "O"), ParamType::Required);
        assert!(!c.set_true(&mut ph, &wm));
    }
}
