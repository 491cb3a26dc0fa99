use skiros_bt::library::move_to;
use skiros_model::{Element, InMemoryWorldModel, WorldModel};
use skiros_pddl::{plan_or_infeasible, FakePlannerBinary, GroundPredicate, PddlInterface};

#[test]
fn compiled_domain_is_written_to_a_workspace_and_a_fake_plan_resolves_back_to_elements() {
    let wm = InMemoryWorldModel::new();
    let room1 = wm.add_element(&Element::new("skiros:Location", "room1"), "", "").unwrap();
    let room2 = wm.add_element(&Element::new("skiros:Location", "room2"), "", "").unwrap();
    let b = wm.add_element(&Element::new("skiros:Object", "b"), "", "").unwrap();
    wm.set_relation(&b.id, "skiros:at", &room1.id, true).unwrap();

    let skill = move_to("Obj", "Src", "Dst", b.clone(), room1.clone(), room2.clone(), "skiros:at");
    let mut iface = PddlInterface::new("skiros");
    iface.add_action(&skill);

    let (objects, init) = iface.snapshot_problem(&wm);
    iface.set_objects(objects);
    iface.set_init_state(init);
    iface.add_goal(GroundPredicate::predicate("at", vec!["b".to_string(), "room2".to_string()]));

    let workspace = tempfile::tempdir().unwrap();
    iface.write_to_workspace(workspace.path()).unwrap();
    assert!(workspace.path().join("domain.pddl").is_file());
    assert!(workspace.path().join("p01.pddl").is_file());

    let planner = FakePlannerBinary::returning("(moveto b room1 room2)\n; cost = 1 (unit cost)\n");
    let plan = plan_or_infeasible(
        &planner,
        workspace.path(),
        &workspace.path().join("domain.pddl"),
        &workspace.path().join("p01.pddl"),
    )
    .unwrap();

    let steps = iface.resolve_plan(&plan, &wm).unwrap();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].action, "moveto");
    assert_eq!(steps[0].bindings["Obj"].id, b.id);
    assert_eq!(steps[0].bindings["Src"].id, room1.id);
    assert_eq!(steps[0].bindings["Dst"].id, room2.id);
}

#[test]
fn an_infeasible_fake_plan_surfaces_as_planner_infeasible() {
    let wm = InMemoryWorldModel::new();
    let room1 = wm.add_element(&Element::new("skiros:Location", "room1"), "", "").unwrap();
    let room2 = wm.add_element(&Element::new("skiros:Location", "room2"), "", "").unwrap();
    let b = wm.add_element(&Element::new("skiros:Object", "b"), "", "").unwrap();
    wm.set_relation(&b.id, "skiros:at", &room1.id, true).unwrap();

    let skill = move_to("Obj", "Src", "Dst", b.clone(), room1.clone(), room2.clone(), "skiros:at");
    let mut iface = PddlInterface::new("skiros");
    iface.add_action(&skill);

    let planner = FakePlannerBinary::infeasible();
    let workspace = tempfile::tempdir().unwrap();
    let err = plan_or_infeasible(
        &planner,
        workspace.path(),
        &workspace.path().join("domain.pddl"),
        &workspace.path().join("p01.pddl"),
    )
    .unwrap_err();
    assert!(matches!(err, skiros_model::SkirosError::PlannerInfeasible));
}
