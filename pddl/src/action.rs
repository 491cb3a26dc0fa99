use indexmap::IndexMap;

use crate::predicate::Predicate;

/// A durative action compiled from one [`skiros_bt::Skill`]'s parameters,
/// preconditions and postconditions. Every action has duration 1: the core
/// does not model skill timing, only ordering.
#[derive(Debug, Clone)]
pub struct Action {
    pub name: String,
    /// Parameter key -> PDDL type name, in declaration order.
    pub params: IndexMap<String, String>,
    pub preconditions: Vec<Predicate>,
    pub effects: Vec<Predicate>,
}

impl Action {
    pub fn same_name(&self, other: &Action) -> bool {
        self.name == other.name
    }

    pub fn to_pddl(&self) -> String {
        let mut out = format!("(:durative-action {}\n", self.name);
        out.push_str("\t:parameters (");
        for (key, ty) in &self.params {
            out.push_str(&format!("?{key} - {ty} "));
        }
        out.push_str(")\n");
        out.push_str("\t:duration (= ?duration 1)\n");
        out.push_str("\t:condition (and\n");
        for p in &self.preconditions {
            out.push_str(&format!("\t\t(at start {})\n", p.to_action_pddl()));
        }
        out.push_str("\t)\n");
        out.push_str("\t:effect (and\n");
        for e in &self.effects {
            out.push_str(&format!("\t\t(at end {})\n", e.to_action_pddl()));
        }
        out.push_str("\t)\n");
        out.push_str(")\n");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::{ParamRole, PredicateParam, PredicateSource};

    #[test]
    fn duration_and_parameter_block_are_rendered() {
        let mut params = IndexMap::new();
        params.insert("Obj".to_string(), "object".to_string());
        params.insert("Src".to_string(), "location".to_string());
        params.insert("Dst".to_string(), "location".to_string());
        let pre = Predicate {
            name: "at".to_string(),
            params: vec![
                PredicateParam { role: ParamRole::Subject, key: "Obj".to_string(), value_type: "object".to_string() },
                PredicateParam { role: ParamRole::Object, key: "Src".to_string(), value_type: "location".to_string() },
            ],
            negated: false,
            operator: None,
            value: None,
            source: PredicateSource::Relation { predicate: "skiros:at".to_string() },
        };
        let mut eff = pre.clone();
        eff.params[1].key = "Dst".to_string();
        let action = Action {
            name: "moveto".to_string(),
            params,
            preconditions: vec![pre],
            effects: vec![eff],
        };
        let text = action.to_pddl();
        assert!(text.starts_with("(:durative-action moveto\n"));
        assert!(text.contains(":duration (= ?duration 1)"));
        assert!(text.contains("(at start (at ?Obj ?Src))"));
        assert!(text.contains("(at end (at ?Obj ?Dst))"));
    }
}
