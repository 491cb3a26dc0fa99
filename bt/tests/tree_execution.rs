use skiros_bt::library::wait;
use skiros_bt::{BehaviorTreeNode, ExecuteVisitor, ReversibleSimulator, State, Visitor};
use skiros_model::{Element, InMemoryWorldModel, ParamHandler, WorldModel};

fn leaf(state: State) -> BehaviorTreeNode {
    // `Wait(0)` succeeds on its first tick; negating it via a sequence that
    // never reaches it keeps these fixtures to one skill body.
    let skill = match state {
        State::Success => wait(0),
        _ => wait(1_000),
    };
    BehaviorTreeNode::skill(skill)
}

#[test]
fn sequence_fails_as_soon_as_one_child_fails() {
    let wm = InMemoryWorldModel::new();
    let mut tree = BehaviorTreeNode::sequence(ParamHandler::new(), vec![leaf(State::Success), leaf(State::Running)]);
    let mut visitor = ExecuteVisitor::new();
    // Drive the running child to failure by preempting mid-flight.
    assert_eq!(visitor.traverse(&mut tree, &wm), State::Running);
    visitor.preempt();
    assert_eq!(visitor.traverse(&mut tree, &wm), State::Failure);
}

#[test]
fn selector_succeeds_once_any_child_succeeds() {
    let wm = InMemoryWorldModel::new();
    let mut tree = BehaviorTreeNode::selector(
        ParamHandler::new(),
        vec![BehaviorTreeNode::skill(wait(1)), BehaviorTreeNode::skill(wait(0))],
    );
    let mut visitor = ExecuteVisitor::new();
    // First tick: left child still running, right child already succeeded.
    assert_eq!(visitor.traverse(&mut tree, &wm), State::Success);
}

#[test]
fn preemption_calls_on_end_exactly_once_for_a_running_skill() {
    let wm = InMemoryWorldModel::new();
    let mut tree = BehaviorTreeNode::skill(wait(1_000));
    let mut visitor = ExecuteVisitor::new();
    assert_eq!(visitor.traverse(&mut tree, &wm), State::Running);
    assert_eq!(visitor.traverse(&mut tree, &wm), State::Running);
    visitor.preempt();
    assert_eq!(visitor.traverse(&mut tree, &wm), State::Failure);
    // A second preempted traverse is a no-op repeat, not a second on_end call;
    // the skill is already terminal so there is nothing left to observe here
    // beyond the state staying Failure.
    assert_eq!(visitor.traverse(&mut tree, &wm), State::Failure);
}

#[test]
fn reversible_simulation_leaves_world_and_params_untouched() {
    let wm = InMemoryWorldModel::new();
    let room1 = wm.add_element(&Element::new("skiros:Location", "room1"), "", "").unwrap();
    let room2 = wm.add_element(&Element::new("skiros:Location", "room2"), "", "").unwrap();
    let robot = wm.add_element(&Element::new("skiros:Robot", "robot"), "", "").unwrap();
    wm.set_relation(&robot.id, "skiros:at", &room1.id, true).unwrap();

    let skill = skiros_bt::library::move_to("Robot", "From", "To", robot.clone(), room1.clone(), room2.clone(), "skiros:at");
    let params_before = format!("{:?}", skill.params);
    let mut tree = BehaviorTreeNode::skill(skill);

    let mut simulator = ReversibleSimulator::new();
    simulator.traverse(&mut tree, &wm);

    assert_eq!(wm.get_relations(&robot.id, "skiros:at", &room1.id).len(), 1);
    assert!(wm.get_relations(&robot.id, "skiros:at", &room2.id).is_empty());
    let BehaviorTreeNode::SkillWrapper { skill } = &tree else {
        unreachable!()
    };
    assert_eq!(format!("{:?}", skill.params), params_before);
}

#[test]
fn parallel_two_of_three_succeeds_with_one_failure() {
    let wm = InMemoryWorldModel::new();
    let mut tree = BehaviorTreeNode::parallel(
        ParamHandler::new(),
        2,
        vec![
            BehaviorTreeNode::skill(wait(0)),
            BehaviorTreeNode::skill(wait(0)),
            BehaviorTreeNode::skill(wait(1_000)),
        ],
    );
    let mut visitor = ExecuteVisitor::new();
    assert_eq!(visitor.traverse(&mut tree, &wm), State::Success);
}
