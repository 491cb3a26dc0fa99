use skiros_model::WorldModel;

use crate::node::BehaviorTreeNode;
use crate::skill::State;

use super::Visitor;

/// Renders a tree with its parameter state; side-effect-free.
#[derive(Default)]
pub struct PrintVisitor {
    out: String,
}

impl PrintVisitor {
    pub fn new() -> Self {
        PrintVisitor::default()
    }

    pub fn into_string(self) -> String {
        self.out
    }

    fn render(&mut self, node: &BehaviorTreeNode, depth: usize) {
        let indent = "  ".repeat(depth);
        match node {
            BehaviorTreeNode::Root { params, state, child } => {
                self.out.push_str(&format!("{indent}Root [{state:?}] {}\n", params.print_state()));
                self.render(child, depth + 1);
            }
            BehaviorTreeNode::Sequence { params, state, children } => {
                self.out.push_str(&format!("{indent}Sequence [{state:?}] {}\n", params.print_state()));
                for child in children {
                    self.render(child, depth + 1);
                }
            }
            BehaviorTreeNode::Selector { params, state, children } => {
                self.out.push_str(&format!("{indent}Selector [{state:?}] {}\n", params.print_state()));
                for child in children {
                    self.render(child, depth + 1);
                }
            }
            BehaviorTreeNode::Parallel { params, state, children, .. } => {
                self.out.push_str(&format!("{indent}Parallel [{state:?}] {}\n", params.print_state()));
                for child in children {
                    self.render(child, depth + 1);
                }
            }
            BehaviorTreeNode::Decorator { params, state, child, .. } => {
                self.out.push_str(&format!("{indent}{} [{state:?}] {}\n", node.label(), params.print_state()));
                self.render(child, depth + 1);
            }
            BehaviorTreeNode::SkillWrapper { skill } => {
                self.out.push_str(&format!(
                    "{indent}Skill({}) [{:?}] {}\n",
                    skill.type_iri,
                    skill.state(),
                    skill.params.print_state()
                ));
            }
        }
    }
}

impl Visitor for PrintVisitor {
    fn traverse(&mut self, node: &mut BehaviorTreeNode, _wm: &dyn WorldModel) -> State {
        self.render(node, 0);
        node.state()
    }
}
