use skiros_model::WorldModel;
use tracing::warn;

use crate::node::{BehaviorTreeNode, DecoratorKind};
use crate::skill::{Skill, State};

use super::{parallel_state, selector_state, sequence_state, Visitor};

/// Drives skills through their `on_start`/`on_step`/`on_end` hooks.
///
/// `preempt` sets a sticky flag checked on the next `traverse`: once set,
/// every descent short-circuits to `Failure`, calling `on_end` for any skill
/// still `Running` so cleanup always happens exactly once per run.
#[derive(Default)]
pub struct ExecuteVisitor {
    preempted: bool,
}

impl ExecuteVisitor {
    pub fn new() -> Self {
        ExecuteVisitor::default()
    }

    pub fn preempt(&mut self) {
        self.preempted = true;
    }

    fn short_circuit(&mut self, node: &mut BehaviorTreeNode, wm: &dyn WorldModel) -> State {
        match node {
            BehaviorTreeNode::SkillWrapper { skill } => {
                if skill.state() == State::Running {
                    skill.body.on_end(&mut skill.params, wm);
                }
                skill.set_state(State::Failure);
            }
            BehaviorTreeNode::Root { child, .. } | BehaviorTreeNode::Decorator { child, .. } => {
                self.short_circuit(child, wm);
            }
            BehaviorTreeNode::Sequence { children, .. }
            | BehaviorTreeNode::Selector { children, .. }
            | BehaviorTreeNode::Parallel { children, .. } => {
                for child in children.iter_mut() {
                    self.short_circuit(child, wm);
                }
            }
        }
        node.set_state(State::Failure);
        State::Failure
    }

    fn visit(&mut self, node: &mut BehaviorTreeNode, wm: &dyn WorldModel) -> State {
        let state = match node {
            BehaviorTreeNode::Root { child, .. } => self.visit(child, wm),
            BehaviorTreeNode::Sequence { children, .. } => {
                let states: Vec<State> = children.iter_mut().map(|c| self.visit(c, wm)).collect();
                sequence_state(&states)
            }
            BehaviorTreeNode::Selector { children, .. } => {
                let states: Vec<State> = children.iter_mut().map(|c| self.visit(c, wm)).collect();
                selector_state(&states)
            }
            BehaviorTreeNode::Parallel { children, policy, .. } => {
                let states: Vec<State> = children.iter_mut().map(|c| self.visit(c, wm)).collect();
                parallel_state(&states, policy.required_successes)
            }
            BehaviorTreeNode::Decorator { params, kind, child, .. } => match kind {
                DecoratorKind::Negate => match self.visit(child, wm) {
                    State::Success => State::Failure,
                    State::Failure => State::Success,
                    other => other,
                },
                DecoratorKind::Repeat { limit, count } => match self.visit(child, wm) {
                    State::Success => {
                        *count += 1;
                        if *count >= *limit {
                            State::Success
                        } else {
                            State::Running
                        }
                    }
                    State::Failure => {
                        *count = 0;
                        State::Failure
                    }
                    other => other,
                },
                DecoratorKind::While(condition) => {
                    if condition.evaluate(params, wm) {
                        self.visit(child, wm)
                    } else {
                        State::Failure
                    }
                }
            },
            BehaviorTreeNode::SkillWrapper { skill } => visit_skill(skill, wm),
        };
        node.set_state(state);
        state
    }
}

fn visit_skill(skill: &mut Skill, wm: &dyn WorldModel) -> State {
    if skill.state() == State::Idle {
        if !skill.preconditions_met(wm) {
            warn!(skill = %skill.label, "precondition unmet, skill fails at start");
            skill.set_state(State::Failure);
            return State::Failure;
        }
        for condition in &skill.preconditions {
            condition.set_desired_state(&mut skill.params);
        }
        if skill.body.on_start(&mut skill.params, wm).is_err() {
            skill.set_state(State::Error);
            return State::Error;
        }
        skill.set_state(State::Running);
    }

    if skill.state() != State::Running {
        return skill.state();
    }

    if !skill.hold_conditions_met(wm) {
        skill.body.on_end(&mut skill.params, wm);
        skill.set_state(State::Failure);
        return State::Failure;
    }

    match skill.body.on_step(&mut skill.params, wm) {
        State::Running => {
            skill.set_state(State::Running);
            State::Running
        }
        State::Success => {
            skill.body.on_end(&mut skill.params, wm);
            let postconditions_ok = skill.postconditions.iter().all(|c| c.evaluate(&skill.params, wm));
            let final_state = if postconditions_ok { State::Success } else { State::Failure };
            skill.set_state(final_state);
            final_state
        }
        other => {
            skill.body.on_end(&mut skill.params, wm);
            skill.set_state(other);
            other
        }
    }
}

impl Visitor for ExecuteVisitor {
    fn traverse(&mut self, node: &mut BehaviorTreeNode, wm: &dyn WorldModel) -> State {
        if self.preempted {
            self.short_circuit(node, wm)
        } else {
            self.visit(node, wm)
        }
    }

    fn preempt(&mut self) {
        self.preempted = true;
    }
}
