use skiros_model::Scalar;

/// Which slot of a relation-shaped condition a parameter fills; also the
/// suffix used to name a synthetic supertype when two skills disagree on
/// that slot's type (`atx`, `aty`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamRole {
    Subject,
    Object,
}

impl ParamRole {
    fn suffix(self) -> char {
        match self {
            ParamRole::Subject => 'x',
            ParamRole::Object => 'y',
        }
    }

    fn declared_var(self) -> &'static str {
        match self {
            ParamRole::Subject => "x",
            ParamRole::Object => "y",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PredicateParam {
    pub role: ParamRole,
    /// The action parameter key this slot is bound to (`?Target`, not `?x`)
    /// when printed inside an action's condition/effect block.
    pub key: String,
    pub value_type: String,
}

/// Where a [`Predicate`] came from, so the compiler can later enumerate
/// which world facts ground it.
#[derive(Debug, Clone)]
pub enum PredicateSource {
    Relation { predicate: String },
    Property { prop: String },
    HasProperty { prop: String },
}

/// An *unground* predicate or function, derived from one skill's condition.
///
/// `name` equality only (ignoring params and value) is deliberate: it is the
/// key used to recognise "the same predicate, used with different subject
/// types by another skill" and trigger the synthetic-supertype merge in
/// [`crate::compiler::PddlInterface::add_action`].
#[derive(Debug, Clone)]
pub struct Predicate {
    pub name: String,
    pub params: Vec<PredicateParam>,
    pub negated: bool,
    pub operator: Option<&'static str>,
    pub value: Option<Scalar>,
    pub source: PredicateSource,
}

impl Predicate {
    pub fn is_function(&self) -> bool {
        self.operator.is_some() && !matches!(self.value, Some(Scalar::Str(_)))
    }

    pub fn same_name(&self, other: &Predicate) -> bool {
        self.name == other.name
    }

    /// The literal head used on the wire: a string-valued property is
    /// modelled as a flag predicate named after its value (`(red ?x)`), not
    /// after the property (`color`); everything else keeps its own name.
    fn head(&self) -> String {
        match &self.value {
            Some(Scalar::Str(s)) => s.clone(),
            _ => self.name.clone(),
        }
    }

    /// Grounded text for an action's `:condition`/`:effect` block, referencing
    /// the action's own parameter keys.
    pub fn to_action_pddl(&self) -> String {
        let mut out = String::new();
        if self.negated {
            out.push_str("(not ");
        }
        if self.is_function() {
            out.push_str(&format!("({} ", self.operator.unwrap()));
        }
        out.push_str(&format!("({}", self.head()));
        for p in &self.params {
            out.push_str(&format!(" ?{}", p.key));
        }
        out.push(')');
        if self.is_function() {
            out.push_str(&format!(" {}", self.value.as_ref().unwrap()));
            out.push(')');
        }
        if self.negated {
            out.push(')');
        }
        out
    }

    /// Declaration text for the domain's `:predicates`/`:functions` block,
    /// using generic role variables (`?x`, `?y`) rather than any one
    /// action's parameter names.
    pub fn to_ungrounded_pddl(&self) -> String {
        let mut out = format!("({}", self.head());
        for p in &self.params {
            out.push_str(&format!(" ?{} - {}", p.role.declared_var(), p.value_type));
        }
        out.push(')');
        out
    }

    /// Merges `incoming`'s param types into `self`'s, synthesising a shared
    /// supertype per mismatched slot. Used when the same predicate name is
    /// declared a second time with different subject/object types.
    pub fn merge_types(&mut self, incoming: &Predicate, types: &mut super::types::PddlTypes) {
        for (existing, new) in self.params.iter_mut().zip(&incoming.params) {
            if existing.value_type != new.value_type {
                let supertype = format!("{}{}", self.name, existing.role.suffix());
                types.add(existing.value_type.clone(), supertype.clone());
                types.add(new.value_type.clone(), supertype.clone());
                existing.value_type = supertype;
            }
        }
    }
}

/// A fully-grounded predicate or function instance, as it appears in a
/// problem file's `:init`/`:goal` block.
#[derive(Debug, Clone)]
pub struct GroundPredicate {
    pub name: String,
    pub args: Vec<String>,
    pub operator: Option<&'static str>,
    pub value: Option<Scalar>,
}

impl GroundPredicate {
    pub fn predicate(name: impl Into<String>, args: Vec<String>) -> Self {
        GroundPredicate {
            name: name.into(),
            args,
            operator: None,
            value: None,
        }
    }

    pub fn function(name: impl Into<String>, args: Vec<String>, value: Scalar) -> Self {
        GroundPredicate {
            name: name.into(),
            args,
            operator: Some("="),
            value: Some(value),
        }
    }

    pub fn is_function(&self) -> bool {
        self.operator.is_some() && !matches!(self.value, Some(Scalar::Str(_)))
    }

    pub fn to_pddl(&self) -> String {
        let mut out = String::new();
        if self.is_function() {
            out.push_str(&format!("({} ", self.operator.unwrap()));
        }
        let head = match &self.value {
            Some(Scalar::Str(s)) => s.clone(),
            _ => self.name.clone(),
        };
        out.push_str(&format!("({head}"));
        for a in &self.args {
            out.push_str(&format!(" {a}"));
        }
        out.push(')');
        if self.is_function() {
            out.push_str(&format!(" {}", self.value.as_ref().unwrap()));
            out.push(')');
        }
        out
    }
}

/// A pre-rendered PDDL fragment, used for universally-quantified init/goal
/// facts that don't fit the ground-predicate shape (e.g. `(forall (?o -
/// object) (at ?o depot))`). The compiler never produces these itself; a
/// caller building a problem by hand may need one.
#[derive(Debug, Clone)]
pub struct ForallPredicate(pub String);

impl ForallPredicate {
    pub fn to_pddl(&self) -> String {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PddlTypes;

    fn relation_predicate(name: &str, subj_type: &str, obj_type: &str) -> Predicate {
        Predicate {
            name: name.to_string(),
            params: vec![
                PredicateParam {
                    role: ParamRole::Subject,
                    key: "Obj".to_string(),
                    value_type: subj_type.to_string(),
                },
                PredicateParam {
                    role: ParamRole::Object,
                    key: "Loc".to_string(),
                    value_type: obj_type.to_string(),
                },
            ],
            negated: false,
            operator: None,
            value: None,
            source: PredicateSource::Relation { predicate: "skiros:at".to_string() },
        }
    }

    #[test]
    fn ungrounded_uses_role_vars_grounded_uses_param_keys() {
        let p = relation_predicate("at", "object", "location");
        assert_eq!(p.to_ungrounded_pddl(), "(at ?x - object ?y - location)");
        assert_eq!(p.to_action_pddl(), "(at ?Obj ?Loc)");
    }

    #[test]
    fn negated_function_wraps_both_operator_and_not() {
        let p = Predicate {
            name: "weight".to_string(),
            params: vec![PredicateParam {
                role: ParamRole::Subject,
                key: "Obj".to_string(),
                value_type: "object".to_string(),
            }],
            negated: true,
            operator: Some("="),
            value: Some(Scalar::Int(3)),
            source: PredicateSource::Property { prop: "skiros:weight".to_string() },
        };
        assert_eq!(p.to_action_pddl(), "(not (= (weight ?Obj) 3))");
    }

    #[test]
    fn string_valued_property_is_named_after_its_value() {
        let p = Predicate {
            name: "color".to_string(),
            params: vec![PredicateParam {
                role: ParamRole::Subject,
                key: "Obj".to_string(),
                value_type: "object".to_string(),
            }],
            negated: false,
            operator: Some("="),
            value: Some(Scalar::Str("red".to_string())),
            source: PredicateSource::Property { prop: "skiros:color".to_string() },
        };
        assert!(!p.is_function());
        assert_eq!(p.to_action_pddl(), "(red ?Obj)");
    }

    #[test]
    fn mismatched_subject_types_get_a_synthetic_supertype() {
        let mut types = PddlTypes::new();
        let mut first = relation_predicate("at", "object", "location");
        let second = relation_predicate("at", "robot", "location");
        first.merge_types(&second, &mut types);
        assert_eq!(first.params[0].value_type, "atx");
        assert!(types.to_pddl().contains("object") && types.to_pddl().contains("robot"));
        // the object-position type matched, so no `aty` supertype is introduced.
        assert_eq!(first.params[1].value_type, "location");
    }
}
