use indexmap::IndexMap;

/// Derives a PDDL type name from a world-model type IRI: `skiros:Location` becomes `location`.
pub fn type_name(type_iri: &str) -> String {
    type_iri.trim_start_matches("skiros:").to_lowercase()
}

/// The `:types` block: a forest of supertype to direct-subtype edges, built
/// up as actions and predicates are registered rather than computed once.
#[derive(Debug, Clone, Default)]
pub struct PddlTypes {
    children: IndexMap<String, Vec<String>>,
}

impl PddlTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares `name` a subtype of `supertype`. A self-edge is a no-op.
    pub fn add(&mut self, name: impl Into<String>, supertype: impl Into<String>) {
        let (name, supertype) = (name.into(), supertype.into());
        if name == supertype {
            return;
        }
        let entry = self.children.entry(supertype).or_default();
        if !entry.contains(&name) {
            entry.push(name);
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.children.values().any(|subs| subs.iter().any(|s| s == name)) || self.children.contains_key(name)
    }

    pub fn to_pddl(&self) -> String {
        let mut out = String::from("(:types\n");
        for (supertype, names) in &self.children {
            out.push_str(&format!("\t{} - {}\n", names.join(" "), supertype));
        }
        out.push(')');
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn self_edges_are_ignored() {
        let mut types = PddlTypes::new();
        types.add("thing", "thing");
        assert!(!types.contains("thing"));
    }

    #[test]
    fn repeated_subtype_is_not_duplicated() {
        let mut types = PddlTypes::new();
        types.add("gripper", "thing");
        types.add("gripper", "thing");
        assert_eq!(types.to_pddl().matches("gripper").count(), 1);
    }
}
