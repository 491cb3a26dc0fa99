use std::path::Path;
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use tracing::{info, warn};

use skiros_bt::{BehaviorTreeNode, Skill};
use skiros_model::{ParamHandler, Result, SkirosError, WorldModel};
use skiros_pddl::{plan_or_infeasible, GroundPredicate, PddlInterface, PlanStep, PlannerBinary};
use skiros_ticker::{ProgressMessage, Ticker};

use crate::api::{SkillDescription, SkillInvocation, TaskAction, TaskRequest, TaskResponse};

/// Builds a runnable [`Skill`] from a caller-bound [`ParamHandler`]. Each
/// registered skill owns one constructor; `SkillManager` never inspects a
/// skill's internal wiring, only its description and conditions.
pub type SkillConstructor = Box<dyn Fn(ParamHandler) -> Skill + Send + Sync>;

struct RegisteredSkill {
    type_iri: String,
    default_params: ParamHandler,
    constructor: SkillConstructor,
}

/// Facade tying a [`WorldModel`], a [`Ticker`] and a [`PddlInterface`]
/// together behind the task-submission, skill-description and
/// progress-topic contract.
///
/// One instance owns one ticker and one PDDL compiler — per the source
/// design's resolution that "multiple `SkillManager` instances each own
/// their own ticker" rather than sharing process-wide state. Skills must be
/// registered with [`SkillManager::register_skill`] before a [`TaskRequest`]
/// can name them.
pub struct SkillManager {
    wm: Arc<dyn WorldModel>,
    ticker: Ticker,
    skills: Mutex<IndexMap<String, RegisteredSkill>>,
    pddl: Mutex<PddlInterface>,
}

impl SkillManager {
    pub fn new(wm: Arc<dyn WorldModel>, robot_name: impl Into<String>) -> Self {
        SkillManager {
            ticker: Ticker::new(Arc::clone(&wm), robot_name),
            wm,
            skills: Mutex::new(IndexMap::new()),
            pddl: Mutex::new(PddlInterface::new("skiros")),
        }
    }

    pub fn wm(&self) -> &Arc<dyn WorldModel> {
        &self.wm
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn observe_progress(&self, cb: impl Fn(ProgressMessage) + Send + Sync + 'static) {
        self.ticker.observe_progress(cb);
    }

    /// Registers a skill under `name`: buildable from a [`TaskRequest`], and
    /// folded into the PDDL domain (via its default parameters' conditions)
    /// immediately.
    pub fn register_skill(&self, type_iri: impl Into<String>, name: impl Into<String>, default_params: ParamHandler, constructor: SkillConstructor) {
        let type_iri = type_iri.into();
        let name = name.into();
        let template = constructor(default_params.clone());
        self.pddl.lock().unwrap().add_action(&template);
        self.skills.lock().unwrap().insert(name, RegisteredSkill { type_iri, default_params, constructor });
    }

    /// `{ type, name, params }` for every registered skill, per the
    /// skill-description API.
    pub fn list_skills(&self) -> Vec<SkillDescription> {
        self.skills
            .lock()
            .unwrap()
            .iter()
            .map(|(name, s)| SkillDescription {
                type_iri: s.type_iri.clone(),
                name: name.clone(),
                params: s.default_params.get_param_map().iter().map(|(k, p)| (k.clone(), p.value.clone())).collect(),
            })
            .collect()
    }

    fn build_skill(&self, invocation: &SkillInvocation) -> Result<Skill> {
        let skills = self.skills.lock().unwrap();
        let registered = skills.get(&invocation.name).ok_or_else(|| SkirosError::UnknownSkill(invocation.name.clone()))?;
        let mut params = registered.default_params.clone();
        for (key, value) in &invocation.params {
            params.specify(key, value.clone())?;
        }
        Ok((registered.constructor)(params))
    }

    /// Handles one [`TaskRequest`]. `Pause`/`Kill` are reserved and always
    /// answer `ok=false`.
    pub fn submit(&self, request: TaskRequest) -> TaskResponse {
        match request.action {
            TaskAction::Pause | TaskAction::Kill => TaskResponse { ok: false, task_id: request.execution_id },
            TaskAction::Preempt => {
                self.ticker.preempt(request.execution_id);
                TaskResponse { ok: true, task_id: request.execution_id }
            }
            TaskAction::Start => self.start_task(request),
        }
    }

    fn start_task(&self, request: TaskRequest) -> TaskResponse {
        let mut children = Vec::with_capacity(request.skills.len());
        for invocation in &request.skills {
            match self.build_skill(invocation) {
                Ok(skill) => children.push(BehaviorTreeNode::skill(skill)),
                Err(err) => {
                    warn!(%err, skill = %invocation.name, "failed to build skill for task");
                    return TaskResponse { ok: false, task_id: -1 };
                }
            }
        }
        let root = BehaviorTreeNode::root(ParamHandler::new(), BehaviorTreeNode::sequence(ParamHandler::new(), children));

        let desired_uid = if request.execution_id < 0 { None } else { Some(request.execution_id) };
        match self.ticker.add_task(root, desired_uid) {
            Ok(uid) => {
                self.ticker.start();
                info!(uid, "task submitted");
                TaskResponse { ok: true, task_id: uid }
            }
            Err(err) => {
                warn!(%err, "failed to register task");
                TaskResponse { ok: false, task_id: -1 }
            }
        }
    }

    /// Compiles every registered skill into a PDDL domain/problem pair under
    /// `workspace`, snapshots the world as the problem's objects/init state,
    /// adds `goal`, invokes `planner`, and resolves the resulting plan back
    /// into bound [`PlanStep`]s.
    pub fn plan(&self, planner: &dyn PlannerBinary, workspace: &Path, goal: Vec<GroundPredicate>) -> Result<Vec<PlanStep>> {
        let mut pddl = self.pddl.lock().unwrap();
        let (objects, init) = pddl.snapshot_problem(self.wm.as_ref());
        pddl.set_objects(objects);
        pddl.set_init_state(init);
        for g in goal {
            pddl.add_goal(g);
        }
        pddl.write_to_workspace(workspace).map_err(|e| SkirosError::RpcFailure(e.to_string()))?;

        let plan_text = plan_or_infeasible(planner, workspace, &workspace.join("domain.pddl"), &workspace.join("p01.pddl"))?;
        pddl.resolve_plan(&plan_text, self.wm.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skiros_bt::library::wait;
    use skiros_bt::State;
    use skiros_model::InMemoryWorldModel;
    use std::sync::Mutex as StdMutex;
    use std::time::Duration;

    fn wait_for<F: Fn() -> bool>(cond: F) {
        for _ in 0..200 {
            if cond() {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!("condition did not become true in time");
    }

    #[test]
    fn empty_task_submission_reports_ok_and_completes() {
        let wm: Arc<dyn WorldModel> = Arc::new(InMemoryWorldModel::new());
        let manager = SkillManager::new(wm, "robot1");
        let response = manager.submit(TaskRequest { action: TaskAction::Start, execution_id: -1, skills: Vec::new() });
        assert!(response.ok);
        wait_for(|| manager.ticker().task_count() == 0);
    }

    #[test]
    fn unregistered_skill_name_is_rejected_without_registering_a_task() {
        let wm: Arc<dyn WorldModel> = Arc::new(InMemoryWorldModel::new());
        let manager = SkillManager::new(wm, "robot1");
        let response = manager.submit(TaskRequest {
            action: TaskAction::Start,
            execution_id: -1,
            skills: vec![SkillInvocation { type_iri: "skiros:Wait".to_string(), name: "Wait".to_string(), params: IndexMap::new() }],
        });
        assert!(!response.ok);
        assert_eq!(manager.ticker().task_count(), 0);
    }

    #[test]
    fn registered_skill_runs_to_success_and_publishes_progress() {
        let wm: Arc<dyn WorldModel> = Arc::new(InMemoryWorldModel::new());
        let manager = SkillManager::new(wm, "robot1");
        manager.register_skill("skiros:Wait", "Wait", ParamHandler::new(), Box::new(|_ph| wait(1)));

        let messages: Arc<StdMutex<Vec<ProgressMessage>>> = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&messages);
        manager.observe_progress(move |m| sink.lock().unwrap().push(m));

        let response = manager.submit(TaskRequest {
            action: TaskAction::Start,
            execution_id: -1,
            skills: vec![SkillInvocation { type_iri: "skiros:Wait".to_string(), name: "Wait".to_string(), params: IndexMap::new() }],
        });
        assert!(response.ok);
        wait_for(|| manager.ticker().task_count() == 0);

        let messages = messages.lock().unwrap();
        let terminal = messages.iter().find(|m| m.task_id == response.task_id && m.node_type == "Task").expect("a terminal message was published");
        assert_eq!(terminal.state, State::Success);

        assert_eq!(manager.list_skills().len(), 1);
        assert_eq!(manager.list_skills()[0].name, "Wait");
    }
}
