//! A small, fixed skill library compiled into the crate, so a tree is
//! runnable end to end without the dynamic plugin loading the source system
//! uses (`libraries_list`/`primitive_list`/`skill_list`, out of scope here).

use skiros_conditions::Condition;
use skiros_model::{Element, ParamHandler, ParamType, Result, WorldModel};

use crate::skill::{Skill, SkillBody, State};

/// Relocates `object` from `from` to `to` along `predicate` (typically
/// `skiros:at`). Grounds the PDDL compile-and-plan scenario.
pub fn move_to(object_key: &str, from_key: &str, to_key: &str, object: Element, from: Element, to: Element, predicate: &str) -> Skill {
    let mut params = ParamHandler::new();
    params.add_param(object_key, object, ParamType::Required);
    params.add_param(from_key, from, ParamType::Required);
    params.add_param(to_key, to, ParamType::Required);

    let preconditions = vec![Condition::relation(object_key, from_key, predicate, true)];
    let postconditions = vec![
        Condition::relation(object_key, from_key, predicate, false),
        Condition::relation(object_key, to_key, predicate, true),
    ];

    Skill::new(
        "skiros:MoveTo",
        "MoveTo",
        params,
        Box::new(MoveToBody {
            object_key: object_key.to_string(),
            from_key: from_key.to_string(),
            to_key: to_key.to_string(),
            predicate: predicate.to_string(),
        }),
    )
    .with_preconditions(preconditions)
    .with_postconditions(postconditions)
}

struct MoveToBody {
    object_key: String,
    from_key: String,
    to_key: String,
    predicate: String,
}

impl SkillBody for MoveToBody {
    fn on_start(&mut self, _ph: &mut ParamHandler, _wm: &dyn WorldModel) -> Result<()> {
        Ok(())
    }

    fn on_step(&mut self, ph: &mut ParamHandler, wm: &dyn WorldModel) -> State {
        let (Ok(obj), Ok(from), Ok(to)) = (ph.get_element(&self.object_key), ph.get_element(&self.from_key), ph.get_element(&self.to_key))
        else {
            return State::Error;
        };
        let (obj_id, from_id, to_id) = (obj.id.clone(), from.id.clone(), to.id.clone());
        if wm.set_relation(&obj_id, &self.predicate, &from_id, false).is_err() {
            return State::Failure;
        }
        if wm.set_relation(&obj_id, &self.predicate, &to_id, true).unwrap_or(false) {
            State::Success
        } else {
            State::Failure
        }
    }

    fn on_end(&mut self, _ph: &mut ParamHandler, _wm: &dyn WorldModel) {}
}

/// Grasps `object`, currently `at` `location`, with `gripper`.
pub fn pick(gripper_key: &str, object_key: &str, location_key: &str, gripper: Element, object: Element, location: Element) -> Skill {
    let mut params = ParamHandler::new();
    params.add_param(gripper_key, gripper, ParamType::Required);
    params.add_param(object_key, object, ParamType::Required);
    params.add_param(location_key, location, ParamType::Required);

    let preconditions = vec![
        Condition::relation(object_key, location_key, "skiros:at", true),
        Condition::has_property(gripper_key, "skiros:holding", false),
    ];
    let postconditions = vec![
        Condition::relation(gripper_key, object_key, "skiros:holds", true),
        Condition::has_property(gripper_key, "skiros:holding", true),
    ];

    Skill::new(
        "skiros:Pick",
        "Pick",
        params,
        Box::new(PickBody {
            gripper_key: gripper_key.to_string(),
            object_key: object_key.to_string(),
        }),
    )
    .with_preconditions(preconditions)
    .with_postconditions(postconditions)
}

struct PickBody {
    gripper_key: String,
    object_key: String,
}

impl SkillBody for PickBody {
    fn on_start(&mut self, _ph: &mut ParamHandler, _wm: &dyn WorldModel) -> Result<()> {
        Ok(())
    }

    fn on_step(&mut self, ph: &mut ParamHandler, wm: &dyn WorldModel) -> State {
        let (Ok(gripper), Ok(object)) = (ph.get_element(&self.gripper_key), ph.get_element(&self.object_key)) else {
            return State::Error;
        };
        let (mut gripper, object_id) = (gripper.clone(), object.id.clone());
        if !wm.set_relation(&gripper.id, "skiros:holds", &object_id, true).unwrap_or(false) {
            return State::Failure;
        }
        gripper.set_property("skiros:holding", true);
        if wm.update_element(&gripper).is_err() || ph.specify(&self.gripper_key, gripper).is_err() {
            return State::Failure;
        }
        State::Success
    }

    fn on_end(&mut self, _ph: &mut ParamHandler, _wm: &dyn WorldModel) {}
}

/// Releases whatever `gripper` holds onto `location`.
pub fn place(gripper_key: &str, object_key: &str, location_key: &str, gripper: Element, object: Element, location: Element) -> Skill {
    let mut params = ParamHandler::new();
    params.add_param(gripper_key, gripper, ParamType::Required);
    params.add_param(object_key, object, ParamType::Required);
    params.add_param(location_key, location, ParamType::Required);

    let preconditions = vec![
        Condition::relation(gripper_key, object_key, "skiros:holds", true),
        Condition::has_property(gripper_key, "skiros:holding", true),
    ];
    let postconditions = vec![
        Condition::relation(object_key, location_key, "skiros:at", true),
        Condition::has_property(gripper_key, "skiros:holding", false),
    ];

    Skill::new(
        "skiros:Place",
        "Place",
        params,
        Box::new(PlaceBody {
            gripper_key: gripper_key.to_string(),
            object_key: object_key.to_string(),
            location_key: location_key.to_string(),
        }),
    )
    .with_preconditions(preconditions)
    .with_postconditions(postconditions)
}

struct PlaceBody {
    gripper_key: String,
    object_key: String,
    location_key: String,
}

impl SkillBody for PlaceBody {
    fn on_start(&mut self, _ph: &mut ParamHandler, _wm: &dyn WorldModel) -> Result<()> {
        Ok(())
    }

    fn on_step(&mut self, ph: &mut ParamHandler, wm: &dyn WorldModel) -> State {
        let (Ok(gripper), Ok(object), Ok(location)) =
            (ph.get_element(&self.gripper_key), ph.get_element(&self.object_key), ph.get_element(&self.location_key))
        else {
            return State::Error;
        };
        let (mut gripper, object_id, location_id) = (gripper.clone(), object.id.clone(), location.id.clone());
        if !wm.set_relation(&gripper.id, "skiros:holds", &object_id, false).unwrap_or(false) {
            return State::Failure;
        }
        if !wm.set_relation(&object_id, "skiros:at", &location_id, true).unwrap_or(false) {
            return State::Failure;
        }
        gripper.set_property("skiros:holding", false);
        if wm.update_element(&gripper).is_err() || ph.specify(&self.gripper_key, gripper).is_err() {
            return State::Failure;
        }
        State::Success
    }

    fn on_end(&mut self, _ph: &mut ParamHandler, _wm: &dyn WorldModel) {}
}

/// Returns `Running` for a fixed number of ticks, then `Success`. Used to
/// exercise preemption without needing a real long-running skill.
pub fn wait(ticks: u32) -> Skill {
    let params = ParamHandler::new();
    Skill::new("skiros:Wait", "Wait", params, Box::new(WaitBody { remaining: ticks }))
}

struct WaitBody {
    remaining: u32,
}

impl SkillBody for WaitBody {
    fn on_start(&mut self, _ph: &mut ParamHandler, _wm: &dyn WorldModel) -> Result<()> {
        Ok(())
    }

    fn on_step(&mut self, _ph: &mut ParamHandler, _wm: &dyn WorldModel) -> State {
        if self.remaining == 0 {
            State::Success
        } else {
            self.remaining -= 1;
            State::Running
        }
    }

    fn on_end(&mut self, _ph: &mut ParamHandler, _wm: &dyn WorldModel) {}
}

#[cfg(test)]
mod tests {
    use skiros_model::InMemoryWorldModel;

    use super::*;
    use crate::node::BehaviorTreeNode;
    use crate::visitor::{ExecuteVisitor, Visitor};

    #[test]
    fn wait_skill_runs_for_the_configured_tick_count() {
        let wm = InMemoryWorldModel::new();
        let mut node = BehaviorTreeNode::skill(wait(2));
        let mut visitor = ExecuteVisitor::new();
        assert_eq!(visitor.traverse(&mut node, &wm), State::Running);
        assert_eq!(visitor.traverse(&mut node, &wm), State::Running);
        assert_eq!(visitor.traverse(&mut node, &wm), State::Success);
    }

    #[test]
    fn move_to_updates_relations_on_success() {
        let wm = InMemoryWorldModel::new();
        let room1 = wm.add_element(&Element::new("skiros:Location", "room1"), "", "").unwrap();
        let room2 = wm.add_element(&Element::new("skiros:Location", "room2"), "", "").unwrap();
        let robot = wm.add_element(&Element::new("skiros:Robot", "robot"), "", "").unwrap();
        wm.set_relation(&robot.id, "skiros:at", &room1.id, true).unwrap();

        let skill = move_to("Robot", "From", "To", robot.clone(), room1.clone(), room2.clone(), "skiros:at");
        let mut node = BehaviorTreeNode::skill(skill);
        let mut visitor = ExecuteVisitor::new();
        assert_eq!(visitor.traverse(&mut node, &wm), State::Success);
        assert!(wm.get_relations(&robot.id, "skiros:at", &room2.id).len() == 1);
        assert!(wm.get_relations(&robot.id, "skiros:at", &room1.id).is_empty());
    }

    #[test]
    fn pick_then_place_relocates_the_object_and_frees_the_gripper() {
        let wm = InMemoryWorldModel::new();
        let room1 = wm.add_element(&Element::new("skiros:Location", "room1"), "", "").unwrap();
        let room2 = wm.add_element(&Element::new("skiros:Location", "room2"), "", "").unwrap();
        let gripper = wm.add_element(&Element::new("skiros:Gripper", "gripper"), "", "").unwrap();
        let object = wm.add_element(&Element::new("skiros:Object", "object"), "", "").unwrap();
        wm.set_relation(&object.id, "skiros:at", &room1.id, true).unwrap();

        let pick_skill = pick("Gripper", "Object", "Location", gripper.clone(), object.clone(), room1.clone());
        let mut node = BehaviorTreeNode::skill(pick_skill);
        let mut visitor = ExecuteVisitor::new();
        assert_eq!(visitor.traverse(&mut node, &wm), State::Success);
        assert_eq!(wm.get_relations(&gripper.id, "skiros:holds", &object.id).len(), 1);

        let gripper = wm.get_element(&gripper.id).expect("gripper still in the world model");
        let place_skill = place("Gripper", "Object", "Location", gripper.clone(), object.clone(), room2.clone());
        let mut node = BehaviorTreeNode::skill(place_skill);
        let mut visitor = ExecuteVisitor::new();
        assert_eq!(visitor.traverse(&mut node, &wm), State::Success);
        assert!(wm.get_relations(&gripper.id, "skiros:holds", &object.id).is_empty());
        assert_eq!(wm.get_relations(&object.id, "skiros:at", &room2.id).len(), 1);
    }
}
