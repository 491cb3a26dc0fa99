use serde::Serialize;
use skiros_model::WorldModel;

use crate::node::BehaviorTreeNode;
use crate::skill::State;

use super::Visitor;

/// One node's observed state, keyed by its dotted path from the root
/// (`"0"`, `"0.1"`, `"0.1.0"`, ...) so the ticker can diff two snapshots of
/// the same tree positionally without nodes carrying persistent ids.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressEvent {
    pub node_id: String,
    pub node_type: String,
    pub label: String,
    pub state: State,
    pub msg: String,
    pub code: i32,
    pub time: f32,
}

pub type ProgressSnapshot = Vec<ProgressEvent>;

/// Read-only traversal that records the state of every node; the tick
/// engine diffs successive snapshots and only publishes changed entries.
#[derive(Default)]
pub struct ProgressVisitor {
    events: ProgressSnapshot,
}

impl ProgressVisitor {
    pub fn new() -> Self {
        ProgressVisitor::default()
    }

    pub fn into_snapshot(self) -> ProgressSnapshot {
        self.events
    }

    fn visit(&mut self, node: &BehaviorTreeNode, path: String) {
        self.events.push(ProgressEvent {
            node_id: path.clone(),
            node_type: node.label().to_string(),
            label: node.label().to_string(),
            state: node.state(),
            msg: String::new(),
            code: 0,
            time: 0.0,
        });
        let children: &[BehaviorTreeNode] = match node {
            BehaviorTreeNode::Root { child, .. } | BehaviorTreeNode::Decorator { child, .. } => std::slice::from_ref(child.as_ref()),
            BehaviorTreeNode::Sequence { children, .. } | BehaviorTreeNode::Selector { children, .. } | BehaviorTreeNode::Parallel { children, .. } => {
                children
            }
            BehaviorTreeNode::SkillWrapper { .. } => &[],
        };
        for (i, child) in children.iter().enumerate() {
            self.visit(child, format!("{path}.{i}"));
        }
    }
}

impl Visitor for ProgressVisitor {
    fn traverse(&mut self, node: &mut BehaviorTreeNode, _wm: &dyn WorldModel) -> State {
        self.events.clear();
        self.visit(node, "0".to_string());
        node.state()
    }
}
