use skiros_model::WorldModel;

use crate::node::BehaviorTreeNode;
use crate::skill::{Skill, State};

use super::Visitor;

enum Which {
    Pre,
    Post,
}

/// Applies every precondition, then every postcondition, of every skill in
/// the tree — in preorder — then reverts all of it in the opposite order.
///
/// Invariant: `wm` and every skill's `ParamHandler` are byte-equal before
/// and after `traverse`. Skills are never actually ticked; only their
/// declared conditions are exercised, so this never calls `on_start`/
/// `on_step`/`on_end`.
#[derive(Default)]
pub struct ReversibleSimulator;

impl ReversibleSimulator {
    pub fn new() -> Self {
        ReversibleSimulator
    }
}

fn collect_skills_mut<'a>(node: &'a mut BehaviorTreeNode, out: &mut Vec<&'a mut Skill>) {
    match node {
        BehaviorTreeNode::Root { child, .. } | BehaviorTreeNode::Decorator { child, .. } => collect_skills_mut(child, out),
        BehaviorTreeNode::Sequence { children, .. } | BehaviorTreeNode::Selector { children, .. } | BehaviorTreeNode::Parallel { children, .. } => {
            for child in children.iter_mut() {
                collect_skills_mut(child, out);
            }
        }
        BehaviorTreeNode::SkillWrapper { skill } => out.push(skill),
    }
}

impl Visitor for ReversibleSimulator {
    fn traverse(&mut self, node: &mut BehaviorTreeNode, wm: &dyn WorldModel) -> State {
        let mut skills = Vec::new();
        collect_skills_mut(node, &mut skills);

        let mut applied = Vec::new();
        for (skill_idx, skill) in skills.iter_mut().enumerate() {
            for (cond_idx, condition) in skill.preconditions.iter_mut().enumerate() {
                if condition.set_true(&mut skill.params, wm) {
                    applied.push((skill_idx, Which::Pre, cond_idx));
                }
            }
            for (cond_idx, condition) in skill.postconditions.iter_mut().enumerate() {
                if condition.set_true(&mut skill.params, wm) {
                    applied.push((skill_idx, Which::Post, cond_idx));
                }
            }
        }

        for (skill_idx, which, cond_idx) in applied.into_iter().rev() {
            let skill = &mut skills[skill_idx];
            let condition = match which {
                Which::Pre => &mut skill.preconditions[cond_idx],
                Which::Post => &mut skill.postconditions[cond_idx],
            };
            condition.revert(&mut skill.params, wm);
        }

        node.state()
    }
}
