use std::sync::{Arc, Mutex};
use std::time::Duration;

use skiros_bt::library::wait;
use skiros_bt::{BehaviorTreeNode, State};
use skiros_model::{Element, InMemoryWorldModel, ParamHandler, WorldModel};
use skiros_ticker::{ProgressMessage, Ticker};

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
fn empty_task_completes_successfully_within_one_tick() {
    let wm: Arc<dyn skiros_model::WorldModel> = Arc::new(InMemoryWorldModel::new());
    let ticker = Ticker::new(wm, "robot1");
    let messages: Arc<Mutex<Vec<ProgressMessage>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&messages);
    ticker.observe_progress(move |m| sink.lock().unwrap().push(m));

    let root = BehaviorTreeNode::root(ParamHandler::new(), BehaviorTreeNode::skill(wait(0)));
    let uid = ticker.add_task(root, None).unwrap();
    ticker.start();

    wait_for(|| ticker.task_count() == 0);
    ticker.clear();

    let messages = messages.lock().unwrap();
    let terminal = messages.iter().find(|m| m.task_id == uid && m.node_type == "Task").expect("a terminal message was published");
    assert_eq!(terminal.state, State::Success);
    assert_eq!(terminal.progress_code, 0);
}

#[test]
fn preempted_task_reports_failure_with_preempted_message() {
    let wm: Arc<dyn skiros_model::WorldModel> = Arc::new(InMemoryWorldModel::new());
    let ticker = Ticker::new(wm, "robot1");
    let messages: Arc<Mutex<Vec<ProgressMessage>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&messages);
    ticker.observe_progress(move |m| sink.lock().unwrap().push(m));

    let root = BehaviorTreeNode::skill(wait(1_000));
    let uid = ticker.add_task(root, None).unwrap();
    ticker.start();

    std::thread::sleep(Duration::from_millis(80));
    ticker.preempt(uid);

    wait_for(|| ticker.task_count() == 0);
    ticker.clear();

    let messages = messages.lock().unwrap();
    let terminal = messages.iter().find(|m| m.task_id == uid && m.node_type == "Task").expect("a terminal message was published");
    assert_eq!(terminal.state, State::Failure);
    assert_eq!(terminal.progress_message, "Preempted.");
}

#[test]
fn single_skill_success_updates_its_element_property() {
    let wm = Arc::new(InMemoryWorldModel::new());
    let target = wm.add_element(&Element::new("skiros:Object", "Target"), "", "").unwrap();
    let gripper = wm.add_element(&Element::new("skiros:Gripper", "Gripper"), "", "").unwrap();

    let skill = skiros_bt::library::pick(
        "Gripper",
        "Target",
        "Location",
        gripper.clone(),
        target.clone(),
        target.clone(),
    );
    wm.set_relation(&target.id, "skiros:at", &target.id, true).unwrap();

    let wm_dyn: Arc<dyn skiros_model::WorldModel> = wm.clone();
    let ticker = Ticker::new(wm_dyn, "robot1");
    let root = BehaviorTreeNode::skill(skill);
    ticker.add_task(root, None).unwrap();
    ticker.start();

    wait_for(|| ticker.task_count() == 0);
    ticker.clear();

    assert_eq!(wm.get_relations(&gripper.id, "skiros:holds", &target.id).len(), 1);
}
