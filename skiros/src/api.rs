use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use skiros_model::Value;

/// Verb of a [`TaskRequest`]. `Pause` and `Kill` are reserved: a
/// `SkillManager` accepts them but always answers `ok=false`, since neither
/// has a defined semantics for a tree mid-tick yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskAction {
    Start,
    Preempt,
    Pause,
    Kill,
}

/// One skill invocation inside a [`TaskRequest`]: which registered skill to
/// build, and the bindings to specify on top of its default parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillInvocation {
    pub type_iri: String,
    pub name: String,
    pub params: IndexMap<String, Value>,
}

/// Request: submit, preempt, pause or kill a task. `execution_id = -1` means
/// "allocate a fresh id"; any other value names an existing or specifically
/// requested task id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRequest {
    pub action: TaskAction,
    pub execution_id: i32,
    pub skills: Vec<SkillInvocation>,
}

/// Response to a [`TaskRequest`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct TaskResponse {
    pub ok: bool,
    pub task_id: i32,
}

/// One entry of the skill-description API: a registered skill's type, name
/// and default parameter bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillDescription {
    pub type_iri: String,
    pub name: String,
    pub params: IndexMap<String, Value>,
}
