use serde::{Deserialize, Serialize};
use skiros_conditions::Condition;
use skiros_model::{ParamHandler, Result, WorldModel};

/// Outcome of one tick of a node or a skill body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum State {
    Initialised,
    Running,
    Success,
    Failure,
    Idle,
    Error,
}

impl State {
    pub fn is_terminal(self) -> bool {
        !matches!(self, State::Running | State::Initialised)
    }
}

/// User-supplied behavior a [`Skill`] drives through three hooks.
///
/// Long-running skills report progress by returning [`State::Running`] from
/// `on_step` across many ticks; the tick loop supplies the event-loop
/// semantics, so no async runtime is needed here.
pub trait SkillBody: Send {
    fn on_start(&mut self, ph: &mut ParamHandler, wm: &dyn WorldModel) -> Result<()>;
    fn on_step(&mut self, ph: &mut ParamHandler, wm: &dyn WorldModel) -> State;
    fn on_end(&mut self, ph: &mut ParamHandler, wm: &dyn WorldModel);
}

/// A leaf behavior: description, parameters, conditions, and a user body.
pub struct Skill {
    pub type_iri: String,
    pub label: String,
    pub params: ParamHandler,
    pub preconditions: Vec<Condition>,
    pub postconditions: Vec<Condition>,
    pub hold_conditions: Vec<Condition>,
    pub body: Box<dyn SkillBody>,
    state: State,
}

impl Skill {
    pub fn new(type_iri: impl Into<String>, label: impl Into<String>, params: ParamHandler, body: Box<dyn SkillBody>) -> Self {
        Skill {
            type_iri: type_iri.into(),
            label: label.into(),
            params,
            preconditions: Vec::new(),
            postconditions: Vec::new(),
            hold_conditions: Vec::new(),
            body,
            state: State::Idle,
        }
    }

    pub fn with_preconditions(mut self, conditions: Vec<Condition>) -> Self {
        self.preconditions = conditions;
        self
    }

    pub fn with_postconditions(mut self, conditions: Vec<Condition>) -> Self {
        self.postconditions = conditions;
        self
    }

    pub fn with_hold_conditions(mut self, conditions: Vec<Condition>) -> Self {
        self.hold_conditions = conditions;
        self
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: State) {
        self.state = state;
    }

    pub fn preconditions_met(&self, wm: &dyn WorldModel) -> bool {
        self.preconditions.iter().all(|c| c.evaluate(&self.params, wm))
    }

    pub fn hold_conditions_met(&self, wm: &dyn WorldModel) -> bool {
        self.hold_conditions.iter().all(|c| c.evaluate(&self.params, wm))
    }
}
