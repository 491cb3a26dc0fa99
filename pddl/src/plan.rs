use std::collections::HashMap;

use indexmap::IndexMap;

use skiros_model::{Element, Result, SkirosError};

use crate::action::Action;

/// One grounded action from a planner's output, with its PDDL object
/// arguments resolved back to the world elements they named.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanStep {
    pub action: String,
    /// Action parameter key -> the element bound to it, in declaration order.
    pub bindings: IndexMap<String, Element>,
}

/// Parses a planner's plan text (one grounded action per line, blank lines
/// and `;`-prefixed cost comments ignored) against the actions this
/// interface compiled and the world snapshot's objects.
///
/// An action name the compiler never registered, or an object label absent
/// from `elements`, means the planner and the compiled domain have drifted
/// apart — reported as an error rather than produced as a silently-broken
/// plan step.
pub fn resolve(plan_text: &str, actions: &[Action], elements: &[Element]) -> Result<Vec<PlanStep>> {
    let by_label: HashMap<&str, &Element> = elements.iter().map(|e| (e.label.as_str(), e)).collect();
    let mut steps = Vec::new();
    for line in plan_text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }
        let line = line.trim_start_matches('(').trim_end_matches(')');
        let mut tokens = line.split_whitespace();
        let name = tokens
            .next()
            .ok_or_else(|| SkirosError::InternalInvariant(format!("empty plan line: `{line}`")))?;
        let action = actions
            .iter()
            .find(|a| a.name == name)
            .ok_or_else(|| SkirosError::UnknownSkill(name.to_string()))?;

        let mut bindings = IndexMap::new();
        for key in action.params.keys() {
            let label = tokens
                .next()
                .ok_or_else(|| SkirosError::InternalInvariant(format!("plan step `{name}` is missing an argument for `{key}`")))?;
            let element = by_label.get(label).ok_or_else(|| SkirosError::UnknownElement(label.to_string()))?;
            bindings.insert(key.clone(), (*element).clone());
        }
        steps.push(PlanStep { action: action.name.clone(), bindings });
    }
    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skiros_model::Element;

    fn sample_action() -> Action {
        let mut params = IndexMap::new();
        params.insert("Obj".to_string(), "object".to_string());
        params.insert("Src".to_string(), "location".to_string());
        params.insert("Dst".to_string(), "location".to_string());
        Action { name: "moveto".to_string(), params, preconditions: Vec::new(), effects: Vec::new() }
    }

    fn sample_elements() -> Vec<Element> {
        vec![
            Element::grounded(":o-1", "skiros:Object", "b"),
            Element::grounded(":l-1", "skiros:Location", "room1"),
            Element::grounded(":l-2", "skiros:Location", "room2"),
        ]
    }

    #[test]
    fn resolves_a_grounded_action_line_to_its_bound_elements() {
        let actions = vec![sample_action()];
        let elements = sample_elements();
        let steps = resolve("(moveto b room1 room2)\n; cost = 1 (unit cost)\n", &actions, &elements).unwrap();
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].action, "moveto");
        assert_eq!(steps[0].bindings["Obj"].label, "b");
        assert_eq!(steps[0].bindings["Dst"].label, "room2");
    }

    #[test]
    fn blank_lines_are_skipped() {
        let actions = vec![sample_action()];
        let elements = sample_elements();
        let steps = resolve("\n(moveto b room1 room2)\n\n", &actions, &elements).unwrap();
        assert_eq!(steps.len(), 1);
    }

    #[test]
    fn unknown_action_name_is_an_error_not_a_panic() {
        let actions = vec![sample_action()];
        let elements = sample_elements();
        let err = resolve("(flyto b room1 room2)\n", &actions, &elements).unwrap_err();
        assert!(matches!(err, SkirosError::UnknownSkill(name) if name == "flyto"));
    }

    #[test]
    fn unknown_object_label_is_an_error_not_a_panic() {
        let actions = vec![sample_action()];
        let elements = sample_elements();
        let err = resolve("(moveto b room1 room9)\n", &actions, &elements).unwrap_err();
        assert!(matches!(err, SkirosError::UnknownElement(label) if label == "room9"));
    }
}
