use std::collections::HashSet;
use std::sync::Mutex;

use indexmap::IndexMap;

use crate::element::{Element, Relation, WILDCARD};
use crate::error::{Result, SkirosError};

/// A SPARQL query is, in the source system, an opaque string handed to the
/// triple store. The store itself is out of scope here, and conditions only
/// ever issue two structurally fixed query shapes, so the boundary is typed
/// instead of stringly: a relation lookup with optionally-unbound, optionally
/// class-restricted endpoints, and the subclass/OWL-restriction walk
/// `AbstractRelation` needs.
#[derive(Debug, Clone)]
pub enum OntologyQuery {
    RelationLookup {
        subj: Option<String>,
        subj_type: Option<String>,
        predicate: String,
        obj: Option<String>,
        obj_type: Option<String>,
    },
    AbstractRelationLookup {
        subj_type: String,
        predicate: String,
        obj_type: String,
    },
}

pub type Binding = IndexMap<String, String>;

/// Ground truth for elements, properties, relations and the subclass graph.
///
/// Synchronous and thread-safe: implementations take `&self` and perform
/// their own internal synchronization, mirroring the RPC-backed facade the
/// source system wraps around the real ontology store. Lookup methods return
/// empty/`None` for absence; only transport errors (modelled here as
/// [`SkirosError::RpcFailure`]) propagate as `Err`.
pub trait WorldModel: Send + Sync {
    fn resolve_element(&self, template: &Element) -> Option<Element>;
    fn instantiate(&self, template_id: &str, recursive: bool, relations: &[Relation]) -> Result<Element>;
    fn get_element(&self, id: &str) -> Option<Element>;
    /// Every grounded element currently in the store — the "world snapshot"
    /// the PDDL compiler groups into problem-file objects.
    fn list_elements(&self) -> Vec<Element>;
    fn update_element(&self, element: &Element) -> Result<()>;
    fn add_element(&self, element: &Element, parent_id: &str, predicate: &str) -> Result<Element>;
    fn remove_element(&self, id: &str) -> Result<()>;
    fn get_relations(&self, src: &str, predicate: &str, dst: &str) -> Vec<Relation>;
    fn set_relation(&self, src: &str, predicate: &str, dst: &str, truth: bool) -> Result<bool>;
    fn query_ontology(&self, query: &OntologyQuery) -> Vec<Binding>;
    fn get_sub_classes(&self, type_iri: &str) -> Vec<String>;
    fn get_type(&self, iri: &str) -> Option<String>;
    fn add_class(&self, iri: &str, parent: &str) -> Result<()>;
}

#[derive(Default)]
struct Store {
    elements: IndexMap<String, Element>,
    relations: HashSet<Relation>,
    /// OWL restrictions powering `AbstractRelationLookup`: (subj_type, predicate, obj_type).
    restrictions: HashSet<(String, String, String)>,
    subclasses: IndexMap<String, Vec<String>>,
    next_id: u64,
}

/// In-memory reference implementation of [`WorldModel`].
///
/// Makes the core runnable and testable without a real ontology store; it is
/// not a substitute for one. `query_ontology` does not parse SPARQL — it
/// answers the two [`OntologyQuery`] shapes directly against its own maps.
pub struct InMemoryWorldModel {
    store: Mutex<Store>,
}

impl Default for InMemoryWorldModel {
    fn default() -> Self {
        InMemoryWorldModel {
            store: Mutex::new(Store {
                next_id: 1,
                ..Default::default()
            }),
        }
    }
}

impl InMemoryWorldModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a template element directly, bypassing `add_element`'s
    /// id-allocation (used to seed abstract templates for `instantiate`).
    pub fn add_template(&self, template_id: &str, element: Element) {
        let mut store = self.store.lock().unwrap();
        store.elements.insert(template_id.to_string(), element);
    }

    pub fn declare_restriction(&self, subj_type: &str, predicate: &str, obj_type: &str) {
        let mut store = self.store.lock().unwrap();
        store
            .restrictions
            .insert((subj_type.to_string(), predicate.to_string(), obj_type.to_string()));
    }

    fn types_of(store: &Store, type_iri: &str) -> Vec<String> {
        // ancestors: types for which `type_iri` is a (transitive) subclass.
        let mut ancestors = vec![type_iri.to_string()];
        let mut frontier = vec![type_iri.to_string()];
        while let Some(t) = frontier.pop() {
            for (parent, children) in store.subclasses.iter() {
                if children.contains(&t) && !ancestors.contains(parent) {
                    ancestors.push(parent.clone());
                    frontier.push(parent.clone());
                }
            }
        }
        ancestors
    }
}

impl WorldModel for InMemoryWorldModel {
    fn resolve_element(&self, template: &Element) -> Option<Element> {
        let store = self.store.lock().unwrap();
        store
            .elements
            .values()
            .find(|e| !e.is_abstract() && e.type_ == template.type_ && e.label == template.label)
            .cloned()
    }

    fn instantiate(&self, template_id: &str, recursive: bool, relations: &[Relation]) -> Result<Element> {
        let mut store = self.store.lock().unwrap();
        let template = store
            .elements
            .get(template_id)
            .cloned()
            .ok_or_else(|| SkirosError::UnknownElement(template_id.to_string()))?;
        let id = format!(":{}-{}", template.type_.trim_start_matches("skiros:").to_lowercase(), store.next_id);
        store.next_id += 1;
        let mut grounded = template;
        grounded.id = id.clone();
        grounded.relations.extend_from_slice(relations);
        if recursive {
            // recurse over `hasA` composition edges on the template, instantiating children too.
            let children: Vec<Relation> = grounded
                .relations
                .iter()
                .filter(|r| r.predicate == "skiros:hasA")
                .cloned()
                .collect();
            drop(store);
            for child_rel in children {
                let _ = self.instantiate(&child_rel.dst, true, &[]);
            }
            let mut store = self.store.lock().unwrap();
            store.elements.insert(id.clone(), grounded.clone());
            return Ok(grounded);
        }
        store.elements.insert(id.clone(), grounded.clone());
        Ok(grounded)
    }

    fn get_element(&self, id: &str) -> Option<Element> {
        self.store.lock().unwrap().elements.get(id).cloned()
    }

    fn list_elements(&self) -> Vec<Element> {
        self.store.lock().unwrap().elements.values().filter(|e| !e.is_abstract()).cloned().collect()
    }

    fn update_element(&self, element: &Element) -> Result<()> {
        let mut store = self.store.lock().unwrap();
        if !store.elements.contains_key(&element.id) {
            return Err(SkirosError::UnknownElement(element.id.clone()));
        }
        store.elements.insert(element.id.clone(), element.clone());
        Ok(())
    }

    fn add_element(&self, element: &Element, parent_id: &str, predicate: &str) -> Result<Element> {
        let mut store = self.store.lock().unwrap();
        let id = if element.id.is_empty() {
            let id = format!(":{}-{}", element.type_.trim_start_matches("skiros:").to_lowercase(), store.next_id);
            store.next_id += 1;
            id
        } else {
            element.id.clone()
        };
        let mut grounded = element.clone();
        grounded.id = id.clone();
        store.elements.insert(id.clone(), grounded.clone());
        if !parent_id.is_empty() {
            store.relations.insert(Relation::new(parent_id, predicate, &id, true));
        }
        Ok(grounded)
    }

    fn remove_element(&self, id: &str) -> Result<()> {
        let mut store = self.store.lock().unwrap();
        store
            .elements
            .shift_remove(id)
            .ok_or_else(|| SkirosError::UnknownElement(id.to_string()))?;
        store.relations.retain(|r| r.src != id && r.dst != id);
        Ok(())
    }

    fn get_relations(&self, src: &str, predicate: &str, dst: &str) -> Vec<Relation> {
        let store = self.store.lock().unwrap();
        store
            .relations
            .iter()
            .filter(|r| {
                (src == WILDCARD || r.src == src) && (predicate.is_empty() || predicate == WILDCARD || r.predicate == predicate) && (dst == WILDCARD || r.dst == dst)
            })
            .cloned()
            .collect()
    }

    fn set_relation(&self, src: &str, predicate: &str, dst: &str, truth: bool) -> Result<bool> {
        let mut store = self.store.lock().unwrap();
        if !store.elements.contains_key(src) {
            return Err(SkirosError::UnknownElement(src.to_string()));
        }
        if !store.elements.contains_key(dst) {
            return Err(SkirosError::UnknownElement(dst.to_string()));
        }
        if truth {
            store.relations.insert(Relation::new(src, predicate, dst, true));
        } else {
            store.relations.retain(|r| !(r.src == src && r.predicate == predicate && r.dst == dst));
        }
        Ok(true)
    }

    fn query_ontology(&self, query: &OntologyQuery) -> Vec<Binding> {
        let store = self.store.lock().unwrap();
        match query {
            OntologyQuery::RelationLookup {
                subj,
                subj_type,
                predicate,
                obj,
                obj_type,
            } => store
                .relations
                .iter()
                .filter(|r| r.predicate == *predicate)
                .filter(|r| subj.as_deref().map_or(true, |s| s == r.src))
                .filter(|r| obj.as_deref().map_or(true, |o| o == r.dst))
                .filter(|r| {
                    subj_type.as_ref().map_or(true, |t| {
                        store
                            .elements
                            .get(&r.src)
                            .is_some_and(|e| Self::types_of(&store, &e.type_).contains(t))
                    })
                })
                .filter(|r| {
                    obj_type.as_ref().map_or(true, |t| {
                        store
                            .elements
                            .get(&r.dst)
                            .is_some_and(|e| Self::types_of(&store, &e.type_).contains(t))
                    })
                })
                .map(|r| {
                    let mut binding = Binding::new();
                    binding.insert("x".to_string(), r.src.clone());
                    binding.insert("y".to_string(), r.dst.clone());
                    binding
                })
                .collect(),
            OntologyQuery::AbstractRelationLookup {
                subj_type,
                predicate,
                obj_type,
            } => {
                let subj_types = Self::types_of(&store, subj_type);
                let obj_types = Self::types_of(&store, obj_type);
                let mut out = Vec::new();
                for (rs, rp, ro) in store.restrictions.iter() {
                    if rp != predicate {
                        continue;
                    }
                    if subj_types.contains(rs) && obj_types.contains(ro) {
                        let mut binding = Binding::new();
                        binding.insert("ytypes".to_string(), ro.clone());
                        out.push(binding);
                    }
                }
                out
            }
        }
    }

    fn get_sub_classes(&self, type_iri: &str) -> Vec<String> {
        let store = self.store.lock().unwrap();
        let mut out = Vec::new();
        let mut frontier = vec![type_iri.to_string()];
        while let Some(t) = frontier.pop() {
            if let Some(children) = store.subclasses.get(&t) {
                for c in children {
                    if !out.contains(c) {
                        out.push(c.clone());
                        frontier.push(c.clone());
                    }
                }
            }
        }
        out
    }

    fn get_type(&self, iri: &str) -> Option<String> {
        let store = self.store.lock().unwrap();
        store.elements.get(iri).map(|e| e.type_.clone()).or_else(|| {
            store
                .subclasses
                .iter()
                .find(|(parent, children)| *parent == iri || children.iter().any(|c| c == iri))
                .map(|_| iri.to_string())
        })
    }

    fn add_class(&self, iri: &str, parent: &str) -> Result<()> {
        let mut store = self.store.lock().unwrap();
        let children = store.subclasses.entry(parent.to_string()).or_default();
        if !children.iter().any(|c| c == iri) {
            children.push(iri.to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_get_element_round_trips() {
        let wm = InMemoryWorldModel::new();
        let e = Element::new("skiros:Object", "Apple");
        let grounded = wm.add_element(&e, "", "").unwrap();
        assert!(!grounded.is_abstract());
        assert_eq!(wm.get_element(&grounded.id).unwrap(), grounded);
    }

    #[test]
    fn set_relation_toggles_and_wildcards_read() {
        let wm = InMemoryWorldModel::new();
        let a = wm.add_element(&Element::new("skiros:Object", "A"), "", "").unwrap();
        let b = wm.add_element(&Element::new("skiros:Location", "B"), "", "").unwrap();
        assert!(wm.set_relation(&a.id, "skiros:at", &b.id, true).unwrap());
        assert_eq!(wm.get_relations(&a.id, "skiros:at", WILDCARD).len(), 1);
        assert!(wm.set_relation(&a.id, "skiros:at", &b.id, false).unwrap());
        assert!(wm.get_relations(&a.id, "skiros:at", WILDCARD).is_empty());
    }

    #[test]
    fn list_elements_only_returns_grounded_ones() {
        let wm = InMemoryWorldModel::new();
        wm.add_template("tmpl", Element::new("skiros:Object", "Template"));
        let grounded = wm.add_element(&Element::new("skiros:Object", "Apple"), "", "").unwrap();
        let listed = wm.list_elements();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, grounded.id);
    }

    #[test]
    fn subclass_lookup_is_transitive() {
        let wm = InMemoryWorldModel::new();
        wm.add_class("skiros:Apple", "skiros:Fruit").unwrap();
        wm.add_class("skiros:Fruit", "skiros:Object").unwrap();
        let subs = wm.get_sub_classes("skiros:Object");
        assert!(subs.contains(&"skiros:Fruit".to_string()));
        assert!(subs.contains(&"skiros:Apple".to_string()));
    }
}
