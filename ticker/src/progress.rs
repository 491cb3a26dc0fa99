use std::collections::HashMap;

use serde::Serialize;
use skiros_bt::{ProgressEvent, ProgressSnapshot, State};

/// One progress-topic message: a single node's state change, or (when
/// `node_type == "Task"`) the synthetic terminal record published once a
/// task leaves the registry.
#[derive(Debug, Clone, Serialize)]
pub struct ProgressMessage {
    pub robot: String,
    pub task_id: i32,
    pub id: String,
    pub node_type: String,
    pub label: String,
    pub state: State,
    pub progress_code: i32,
    pub progress_time: f32,
    pub progress_message: String,
}

/// Entries present in `curr` whose state differs from (or is absent from)
/// `prev`, keyed by dotted node id.
pub(crate) fn changed_entries<'a>(prev: &'a ProgressSnapshot, curr: &'a ProgressSnapshot) -> Vec<&'a ProgressEvent> {
    let prev_by_id: HashMap<&str, &ProgressEvent> = prev.iter().map(|e| (e.node_id.as_str(), e)).collect();
    curr.iter()
        .filter(|event| match prev_by_id.get(event.node_id.as_str()) {
            Some(p) => p.state != event.state,
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str, state: State) -> ProgressEvent {
        ProgressEvent {
            node_id: id.to_string(),
            node_type: "Sequence".to_string(),
            label: "Sequence".to_string(),
            state,
            msg: String::new(),
            code: 0,
            time: 0.0,
        }
    }

    #[test]
    fn only_nodes_with_a_different_state_are_reported() {
        let prev = vec![event("0", State::Running), event("0.0", State::Success)];
        let curr = vec![event("0", State::Running), event("0.0", State::Success), event("0.1", State::Running)];
        let changed = changed_entries(&prev, &curr);
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].node_id, "0.1");
    }
}
