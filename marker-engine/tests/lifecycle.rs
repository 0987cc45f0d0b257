use std::cell::RefCell;
use std::rc::Rc;

use marker_engine::prelude::*;
use marker_engine::engine::record::kind::RecordKind;
use marker_engine::{BillboardOptions, LabelOptions, MarkerError, RecordQuery};

fn scene() -> MarkerScene<HeadlessEngine> {
    MarkerScene::new(HeadlessEngine::default())
}

fn point(id: &str, longitude: f64, latitude: f64) -> MarkerOptions {
    MarkerOptions::point(id, Cartographic::new(longitude, latitude, 0.0))
}

fn add(scene: &mut MarkerScene<HeadlessEngine>, options: MarkerOptions) -> RecordId {
    scene.add(Record::factory(options).unwrap()).unwrap()
}

fn record_events(scene: &mut MarkerScene<HeadlessEngine>) -> Rc<RefCell<Vec<EventKind>>> {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    scene.on_any(None, move |event| {
        sink.borrow_mut().push(event.kind);
        Ok(())
    });
    seen
}

#[test]
fn delete_is_idempotent() {
    let mut scene = scene();
    let id = add(&mut scene, point("a", 1.0, 2.0));
    assert_eq!(scene.engine().primitive_count(), 1);

    assert!(scene.delete(&id));
    assert!(!scene.delete(&id));
    assert!(!scene.contains(&id));
    assert_eq!(scene.engine().primitive_count(), 0);
    assert_eq!(scene.engine().destroyed_count(), 1);
}

#[test]
fn duplicate_id_leaves_the_existing_record_untouched() {
    let mut scene = scene();
    let id = add(&mut scene, point("a", 1.0, 2.0));

    let mut clash = point("a", 5.0, 6.0);
    clash.color = Some("#ff0000".into());
    let err = scene.add(Record::factory(clash).unwrap()).unwrap_err();

    assert!(matches!(err, MarkerError::DuplicateId(_)));
    let record = scene.get(&id).unwrap();
    assert_eq!(record.style().color, "#ffffff");
    assert_eq!(record.position(), Cartographic::new(1.0, 2.0, 0.0));
    assert_eq!(scene.engine().created_count(), 1);
}

#[test]
fn invalid_options_never_reach_the_registry() {
    let mut options = point("a", 1.0, 2.0);
    options.opacity = Some(2.0);
    assert!(matches!(Record::factory(options), Err(MarkerError::Validation { .. })));

    let options = MarkerOptions {
        id: Some("g".into()),
        position: Some(Cartographic::new(1.0, 2.0, 0.0)),
        geometry: Some(GeometryVariant::Sphere { radius: -1.0 }),
        ..MarkerOptions::default()
    };
    assert!(Record::factory(options).is_err());

    let options = MarkerOptions {
        id: Some("l".into()),
        kind: Some(KindTag::Label),
        position: Some(Cartographic::new(1.0, 2.0, 0.0)),
        text: Some(String::new()),
        ..MarkerOptions::default()
    };
    assert!(Record::factory(options).is_err());
}

#[test]
fn duplicates_are_suppressed_within_a_group_only() {
    let mut scene = scene();
    let a = add(&mut scene, point("a", 3.0, 4.0).in_group("sites"));
    let c = add(&mut scene, point("c", 3.0, 4.0).in_group("other"));
    let b = add(&mut scene, point("b", 3.0, 4.0).in_group("sites"));

    assert!(!scene.contains(&a));
    assert!(scene.contains(&b));
    assert!(scene.contains(&c));

    let d = scene
        .add_excluding(Record::factory(point("d", 3.0, 4.0).in_group("sites")).unwrap(), &[b.clone()])
        .unwrap();
    assert!(scene.contains(&b));
    assert!(scene.contains(&d));
    assert_eq!(scene.group("sites"), vec![b, d]);
}

#[test]
fn moving_onto_a_group_mate_suppresses_it() {
    let mut scene = scene();
    let a = add(&mut scene, point("a", 3.0, 4.0).in_group("sites"));
    let b = add(&mut scene, point("b", 5.0, 6.0).in_group("sites"));

    scene.move_to(&a, Cartographic::new(5.0, 6.0, 0.0), &[]).unwrap();
    assert!(scene.contains(&a));
    assert!(!scene.contains(&b));
}

#[test]
fn label_peer_follows_its_owner() {
    let mut scene = scene();
    let options = point("tower", 1.0, 2.0).with_label(LabelOptions::new("Tower"));
    let id = add(&mut scene, options);
    let label = id.peer("label");

    assert!(scene.contains(&label));
    assert_eq!(scene.registry().composition_of(&id), vec![id.clone(), label.clone()]);

    scene
        .update(&id, FieldMap::new().with(Field::Position, [7.0, 8.0, 0.0]), 0.0)
        .unwrap();
    assert_eq!(scene.get(&label).unwrap().position(), Cartographic::new(7.0, 8.0, 0.0));

    assert!(scene.delete(&id));
    assert!(!scene.contains(&label));
    assert_eq!(scene.engine().primitive_count(), 0);
}

#[test]
fn deleting_a_peer_takes_the_whole_composition() {
    let mut scene = scene();
    let options = point("tower", 1.0, 2.0)
        .with_label(LabelOptions::new("Tower"))
        .with_billboard(BillboardOptions::new("tower.png"));
    let id = add(&mut scene, options);

    assert!(scene.delete(&id.peer("label")));
    assert!(!scene.contains(&id));
    assert!(!scene.contains(&id.peer("billboard")));
    assert!(scene.registry().is_empty());
    assert_eq!(scene.engine().primitive_count(), 0);
    assert!(!scene.delete(&id));
}

#[test]
fn peers_mount_billboard_first_and_label_last() {
    let mut scene = scene();
    let options = point("tower", 1.0, 2.0)
        .with_label(LabelOptions::new("Tower"))
        .with_billboard(BillboardOptions::new("tower.png"));
    let id = add(&mut scene, options);

    let handle = |member: &RecordId| scene.get(member).unwrap().handle().unwrap();
    let billboard = handle(&id.peer("billboard"));
    let shape = handle(&id);
    let label = handle(&id.peer("label"));
    assert!(billboard < shape, "billboard mounted after the shape");
    assert!(shape < label, "label mounted before the shape");
}

#[test]
fn a_bad_label_payload_leaves_the_record_untouched() {
    let mut scene = scene();
    let id = add(&mut scene, point("p", 1.0, 2.0));
    let label = id.peer("label");

    let bad = FieldMap::new()
        .with(Field::Opacity, 0.5)
        .with(Field::Label, FieldValue::Label(Some(LabelOptions::new(""))));
    assert!(matches!(scene.update(&id, bad, 0.0), Err(MarkerError::Validation { .. })));
    assert_eq!(scene.get(&id).unwrap().style().opacity, 1.0);
    assert!(!scene.contains(&label));

    let good = FieldMap::new().with(Field::Label, FieldValue::Label(Some(LabelOptions::new("P"))));
    scene.update(&id, good, 0.0).unwrap();
    let blank = FieldMap::new()
        .with(Field::Opacity, 0.5)
        .with(Field::Label, FieldValue::Label(Some(LabelOptions::new(""))));
    assert!(scene.update(&id, blank, 0.0).is_err());
    assert_eq!(scene.get(&id).unwrap().style().opacity, 1.0);
    match scene.get(&label).unwrap().kind() {
        RecordKind::Label(shape) => assert_eq!(shape.text, "P"),
        other => panic!("expected a label, got {other:?}"),
    }
}

#[test]
fn label_can_be_attached_and_removed_through_update() {
    let mut scene = scene();
    let id = add(&mut scene, point("p", 1.0, 2.0));
    let label = id.peer("label");

    let attach = FieldMap::new().with(Field::Label, FieldValue::Label(Some(LabelOptions::new("P"))));
    scene.update(&id, attach, 0.0).unwrap();
    assert!(scene.contains(&label));
    assert_eq!(scene.get(&id).unwrap().composition(), Some(&id));

    let detach = FieldMap::new().with(Field::Label, FieldValue::Label(None));
    scene.update(&id, detach, 0.0).unwrap();
    assert!(!scene.contains(&label));
    assert!(scene.contains(&id));
}

#[test]
fn a_scene_adopts_primitives_left_by_its_predecessor() {
    let mut first = scene();
    add(&mut first, point("a", 1.0, 2.0));
    add(&mut first, point("b", 3.0, 4.0));
    let engine = first.into_engine();

    let mut second = MarkerScene::new(engine);
    add(&mut second, point("a", 1.0, 2.0));
    assert_eq!(second.engine().created_count(), 2);

    let mut changed = point("b", 3.0, 4.0);
    changed.color = Some("#00ff00".into());
    add(&mut second, changed);
    assert_eq!(second.engine().created_count(), 3);
    assert_eq!(second.engine().destroyed_count(), 1);
    assert_eq!(second.engine().primitive_count(), 2);
}

#[test]
fn update_applies_atomically() {
    let mut scene = scene();
    let id = add(&mut scene, point("a", 1.0, 2.0));

    scene.update(&id, FieldMap::new().with(Field::Opacity, 0.5), 0.0).unwrap();
    assert_eq!(scene.get(&id).unwrap().style().opacity, 0.5);
    assert_eq!(scene.engine().primitive(&id).unwrap().spec.opacity, 0.5);

    let bad = FieldMap::new()
        .with(Field::Opacity, 0.3)
        .with(Field::Radius, 4.0);
    assert!(scene.update(&id, bad, 0.0).is_err());
    assert_eq!(scene.get(&id).unwrap().style().opacity, 0.5);

    let missing = RecordId::from("missing");
    assert!(matches!(
        scene.update(&missing, FieldMap::new().with(Field::Opacity, 0.1), 0.0),
        Err(MarkerError::UnknownRecord(_))
    ));
}

#[test]
fn positive_offset_promotes_clamp_and_clamp_ignores_the_offset() {
    let mut scene = scene();
    let id = add(&mut scene, point("a", 1.0, 2.0).with_height(HeightMode::ClampToGround, 0.0));

    scene.update(&id, FieldMap::new().with(Field::HeightOffset, 50.0), 0.0).unwrap();
    assert_eq!(scene.get(&id).unwrap().height_mode(), HeightMode::RelativeToGround);

    scene
        .update(&id, FieldMap::new().with(Field::HeightMode, HeightMode::ClampToGround), 0.0)
        .unwrap();
    scene.tick(0.1);
    let record = scene.get(&id).unwrap();
    assert_eq!(record.height_mode(), HeightMode::ClampToGround);
    assert_eq!(record.height_offset(), 50.0);
    assert_eq!(record.resolved_altitude(), 0.0);
}

#[test]
fn clamped_options_with_an_offset_mount_relative_to_ground() {
    let engine = HeadlessEngine::default().with_terrain(|_| 10.0);
    let mut scene = MarkerScene::new(engine);
    let id = add(&mut scene, point("a", 1.0, 2.0).with_height(HeightMode::ClampToGround, 50.0));
    scene.tick(0.1);

    let record = scene.get(&id).unwrap();
    assert_eq!(record.height_mode(), HeightMode::RelativeToGround);
    assert_eq!(record.height_offset(), 50.0);
    assert_eq!(record.resolved_altitude(), 60.0);
}

#[test]
fn changing_kind_replaces_the_primitive() {
    let mut scene = scene();
    let id = add(&mut scene, point("a", 1.0, 2.0));
    scene.retag(&id, KindTag::Sphere).unwrap();

    assert_eq!(scene.get(&id).unwrap().kind().tag(), KindTag::Sphere);
    assert_eq!(scene.engine().primitive(&id).unwrap().spec.kind, KindTag::Sphere);
    assert_eq!(scene.engine().created_count(), 2);
    assert!(scene.retag(&id, KindTag::Label).is_err());
}

#[test]
fn ttl_expiry_deletes_and_reports() {
    let mut scene = scene();
    let seen = record_events(&mut scene);
    let mut options = point("a", 1.0, 2.0);
    options.ttl = Some(5.0);
    let id = add(&mut scene, options);

    scene.tick(4.0);
    assert!(scene.contains(&id));
    scene.tick(5.5);
    assert!(!scene.contains(&id));
    assert_eq!(*seen.borrow(), vec![EventKind::Expired]);
}

#[test]
fn replacing_a_ttl_restarts_the_timer() {
    let mut scene = scene();
    let mut options = point("a", 1.0, 2.0);
    options.ttl = Some(5.0);
    let id = add(&mut scene, options);

    scene.tick(4.0);
    scene.update(&id, FieldMap::new().with(Field::Ttl, 5.0), 0.0).unwrap();
    scene.tick(6.0);
    assert!(scene.contains(&id));
    scene.tick(9.5);
    assert!(!scene.contains(&id));
}

#[test]
fn saved_state_is_consumed_by_restore() {
    let mut scene = scene();
    let id = add(&mut scene, point("a", 1.0, 2.0));

    scene.save_state(&id).unwrap();
    scene
        .update(&id, FieldMap::new().with(Field::Color, FieldValue::color("#ff0000")).with(Field::Scale, 3.0), 0.0)
        .unwrap();

    assert!(scene.restore_state(&id).unwrap());
    let record = scene.get(&id).unwrap();
    assert_eq!(record.style().color, "#ffffff");
    assert_eq!(record.style().scale, 1.0);
    assert!(!record.has_saved_state());
    assert!(!scene.restore_state(&id).unwrap());
}

#[test]
fn query_combines_group_and_flags() {
    let mut scene = scene();
    add(&mut scene, point("a", 1.0, 2.0).in_group("g").draggable(true));
    add(&mut scene, point("b", 3.0, 4.0).in_group("g"));
    add(&mut scene, point("c", 5.0, 6.0).draggable(true));

    let draggable_in_g = scene.query(&RecordQuery::default().in_group("g").draggable(true));
    assert_eq!(draggable_in_g, vec![RecordId::from("a")]);
    let draggable = scene.query(&RecordQuery::default().draggable(true));
    assert_eq!(draggable, vec![RecordId::from("a"), RecordId::from("c")]);
}

#[test]
fn teardown_destroys_every_primitive() {
    let mut scene = scene();
    add(&mut scene, point("a", 1.0, 2.0).with_label(LabelOptions::new("A")));
    add(&mut scene, point("b", 3.0, 4.0));
    let engine = scene.teardown();
    assert_eq!(engine.primitive_count(), 0);
    assert_eq!(engine.destroyed_count(), 3);
}
