use std::fs;
use std::io;
use std::path::Path;

use indexmap::IndexMap;
use skiros_bt::Skill;
use skiros_conditions::Condition;
use skiros_model::{Element, ParamHandler, Scalar, WorldModel, WILDCARD};

use crate::action::Action;
use crate::plan::{self, PlanStep};
use crate::predicate::{GroundPredicate, ParamRole, Predicate, PredicateParam, PredicateSource};
use crate::types::{type_name, PddlTypes};

fn strip(iri: &str) -> String {
    iri.trim_start_matches("skiros:").to_lowercase()
}

/// Builds the [`Predicate`] a single condition contributes, or `None` for
/// condition kinds that describe parameter binding rather than world state
/// (`IsSpecified`, `Generate`, `OnType`, `Function`, `Or`) — those never made
/// it into the source system's element-backed condition representation
/// either, so the compiler never sees them as PDDL literals.
fn predicate_for(condition: &Condition, ph: &ParamHandler) -> Option<Predicate> {
    match condition {
        Condition::Relation(c) => {
            let subj_type = ph.get_param(&c.subj).ok()?.value_type.clone();
            let obj_type = ph.get_param(&c.obj).ok()?.value_type.clone();
            Some(Predicate {
                name: strip(&c.predicate),
                params: vec![
                    PredicateParam { role: ParamRole::Subject, key: c.subj.clone(), value_type: type_name(&subj_type) },
                    PredicateParam { role: ParamRole::Object, key: c.obj.clone(), value_type: type_name(&obj_type) },
                ],
                negated: !c.desired,
                operator: None,
                value: None,
                source: PredicateSource::Relation { predicate: c.predicate.clone() },
            })
        }
        Condition::AbstractRelation(c) => {
            let subj_type = ph.get_param(&c.subj).ok()?.value_type.clone();
            let obj_type = ph.get_param(&c.obj).ok()?.value_type.clone();
            Some(Predicate {
                name: strip(&c.predicate),
                params: vec![
                    PredicateParam { role: ParamRole::Subject, key: c.subj.clone(), value_type: type_name(&subj_type) },
                    PredicateParam { role: ParamRole::Object, key: c.obj.clone(), value_type: type_name(&obj_type) },
                ],
                negated: !c.desired,
                operator: None,
                value: None,
                source: PredicateSource::Relation { predicate: c.predicate.clone() },
            })
        }
        Condition::Property(c) => {
            let subj_type = ph.get_param(&c.key).ok()?.value_type.clone();
            Some(Predicate {
                name: strip(&c.prop),
                params: vec![PredicateParam { role: ParamRole::Subject, key: c.key.clone(), value_type: type_name(&subj_type) }],
                negated: !c.desired,
                operator: Some(c.op.symbol()),
                value: Some(c.value.clone()),
                source: PredicateSource::Property { prop: c.prop.clone() },
            })
        }
        Condition::HasProperty(c) => {
            let subj_type = ph.get_param(&c.key).ok()?.value_type.clone();
            Some(Predicate {
                name: strip(&c.prop),
                params: vec![PredicateParam { role: ParamRole::Subject, key: c.key.clone(), value_type: type_name(&subj_type) }],
                negated: !c.desired,
                operator: None,
                value: None,
                source: PredicateSource::HasProperty { prop: c.prop.clone() },
            })
        }
        Condition::IsSpecified(_) | Condition::Generate(_) | Condition::OnType(_) | Condition::Function(_) | Condition::Or(_) => None,
    }
}

fn label_of(elements: &[Element], id: &str) -> Option<String> {
    elements.iter().find(|e| e.id == id).map(|e| e.label.clone())
}

/// Compiles a set of [`Skill`] descriptions into a PDDL domain, and a world
/// snapshot plus a goal into the matching problem. One instance per domain;
/// call [`PddlInterface::add_action`] once per distinct skill before reading
/// `domain_pddl`.
#[derive(Debug, Clone)]
pub struct PddlInterface {
    title: String,
    types: PddlTypes,
    predicates: Vec<Predicate>,
    functions: Vec<Predicate>,
    actions: Vec<Action>,
    objects: IndexMap<String, Vec<String>>,
    init_state: Vec<GroundPredicate>,
    goal: Vec<GroundPredicate>,
}

impl PddlInterface {
    pub fn new(title: impl Into<String>) -> Self {
        PddlInterface {
            title: title.into(),
            types: PddlTypes::new(),
            predicates: Vec::new(),
            functions: Vec::new(),
            actions: Vec::new(),
            objects: IndexMap::new(),
            init_state: Vec::new(),
            goal: Vec::new(),
        }
    }

    /// Resets everything but the title, so one interface can compile several
    /// domains across a process's lifetime.
    pub fn clear(&mut self) {
        let title = std::mem::take(&mut self.title);
        *self = PddlInterface::new(title);
    }

    fn register(&mut self, predicate: Predicate) {
        let PddlInterface { predicates, functions, types, .. } = self;
        let list = if predicate.is_function() { functions } else { predicates };
        if let Some(existing) = list.iter_mut().find(|p| p.same_name(&predicate)) {
            existing.merge_types(&predicate, types);
        } else {
            list.push(predicate);
        }
    }

    /// Compiles one skill into a durative action and registers its
    /// predicates/functions/types. A skill with no compilable precondition or
    /// no compilable effect contributes nothing (it cannot ground an
    /// action), and an action name already present is skipped.
    pub fn add_action(&mut self, skill: &Skill) {
        let preconditions: Vec<Predicate> = skill.preconditions.iter().filter_map(|c| predicate_for(c, &skill.params)).collect();
        let effects: Vec<Predicate> = skill.postconditions.iter().filter_map(|c| predicate_for(c, &skill.params)).collect();
        if preconditions.is_empty() || effects.is_empty() {
            return;
        }

        let mut params = IndexMap::new();
        for (key, p) in skill.params.get_param_map() {
            params.insert(key.clone(), type_name(&p.value_type));
        }
        let action = Action {
            name: skill.label.to_lowercase(),
            params,
            preconditions: preconditions.clone(),
            effects: effects.clone(),
        };
        if self.actions.iter().any(|a| a.same_name(&action)) {
            return;
        }
        for ty in action.params.values() {
            self.types.add(ty.clone(), "thing");
        }
        for p in preconditions {
            self.register(p);
        }
        for e in effects {
            self.register(e);
        }
        self.actions.push(action);
    }

    pub fn set_objects(&mut self, objects: IndexMap<String, Vec<String>>) {
        self.objects = objects;
    }

    pub fn set_init_state(&mut self, init: Vec<GroundPredicate>) {
        self.init_state = init;
    }

    pub fn add_goal(&mut self, goal: GroundPredicate) {
        self.goal.push(goal);
    }

    /// Groups `wm`'s grounded elements into problem-file objects by type, and
    /// derives the ground predicates/functions that currently hold, for
    /// every predicate/function this interface's compiled actions use.
    pub fn snapshot_problem(&self, wm: &dyn WorldModel) -> (IndexMap<String, Vec<String>>, Vec<GroundPredicate>) {
        let elements = wm.list_elements();
        let mut objects: IndexMap<String, Vec<String>> = IndexMap::new();
        for e in &elements {
            objects.entry(type_name(&e.type_)).or_default().push(e.label.clone());
        }

        let mut init = Vec::new();
        for predicate in self.predicates.iter().chain(self.functions.iter()) {
            match &predicate.source {
                PredicateSource::Relation { predicate: raw } => {
                    for rel in wm.get_relations(WILDCARD, raw, WILDCARD) {
                        if !rel.truth {
                            continue;
                        }
                        let (Some(src), Some(dst)) = (label_of(&elements, &rel.src), label_of(&elements, &rel.dst)) else { continue };
                        init.push(GroundPredicate::predicate(predicate.name.clone(), vec![src, dst]));
                    }
                }
                PredicateSource::HasProperty { prop } => {
                    for e in &elements {
                        if e.has_property(prop) {
                            init.push(GroundPredicate::predicate(predicate.name.clone(), vec![e.label.clone()]));
                        }
                    }
                }
                PredicateSource::Property { prop } => {
                    for e in &elements {
                        let Some(value) = e.property_value(prop) else { continue };
                        if predicate.is_function() {
                            init.push(GroundPredicate::function(predicate.name.clone(), vec![e.label.clone()], value.clone()));
                        } else if let Scalar::Str(s) = value {
                            init.push(GroundPredicate::predicate(s.clone(), vec![e.label.clone()]));
                        }
                    }
                }
            }
        }
        (objects, init)
    }

    pub fn domain_pddl(&self) -> String {
        let mut out = format!("(define (domain {})\n", self.title);
        out.push_str("(:requirements :typing :fluents :universal-preconditions)\n");
        out.push_str(&self.types.to_pddl());
        out.push('\n');
        out.push_str("(:predicates\n");
        for p in &self.predicates {
            out.push_str(&format!("\t{}\n", p.to_ungrounded_pddl()));
        }
        out.push_str(")\n");
        out.push_str("(:functions\n");
        for f in &self.functions {
            out.push_str(&format!("\t{}\n", f.to_ungrounded_pddl()));
        }
        out.push_str(")\n");
        for a in &self.actions {
            out.push_str(&a.to_pddl());
            out.push('\n');
        }
        out.push_str(")\n");
        out
    }

    pub fn problem_pddl(&self) -> String {
        let mut out = format!("(define (problem p01) (:domain {})\n", self.title);
        out.push_str("(:objects\n");
        for (ty, objs) in &self.objects {
            if !objs.is_empty() {
                out.push_str(&format!("\t{} - {}\n", objs.join(" "), ty));
            }
        }
        out.push_str(")\n");
        out.push_str("(:init\n");
        for fact in &self.init_state {
            out.push_str(&format!("\t{}\n", fact.to_pddl()));
        }
        out.push_str(")\n");
        out.push_str("(:goal (and\n");
        for g in &self.goal {
            out.push_str(&format!("\t{}\n", g.to_pddl()));
        }
        out.push_str("))\n");
        out.push_str(")\n");
        out
    }

    /// Writes `domain.pddl` and `p01.pddl` into `workspace`.
    pub fn write_to_workspace(&self, workspace: &Path) -> io::Result<()> {
        fs::create_dir_all(workspace)?;
        fs::write(workspace.join("domain.pddl"), self.domain_pddl())?;
        fs::write(workspace.join("p01.pddl"), self.problem_pddl())?;
        Ok(())
    }

    /// Resolves a planner's plan text against this interface's compiled
    /// actions and `wm`'s current elements, producing the skill-bound
    /// sequence a ticker can execute.
    pub fn resolve_plan(&self, plan_text: &str, wm: &dyn WorldModel) -> skiros_model::Result<Vec<PlanStep>> {
        plan::resolve(plan_text, &self.actions, &wm.list_elements())
    }
}
