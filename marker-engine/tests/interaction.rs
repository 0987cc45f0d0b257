use std::cell::RefCell;
use std::rc::Rc;

use bevy::math::DVec2;
use marker_engine::engine::geodesy::{cartesian_to_cartographic, cartographic_to_cartesian, Plane};
use marker_engine::prelude::*;
use marker_engine::tools::interaction::DragPhase;
use marker_engine::{CursorStyle, EventTarget, PointerButton, PointerInput, RenderEngine};

const CENTRE: DVec2 = DVec2::new(400.0, 300.0);
const EMPTY: DVec2 = DVec2::new(100.0, 100.0);

type Events = Rc<RefCell<Vec<MarkerEvent>>>;

fn scene_with(options: MarkerOptions) -> (MarkerScene<HeadlessEngine>, RecordId, Events) {
    let mut scene = MarkerScene::new(HeadlessEngine::default());
    let id = scene.add(Record::factory(options).unwrap()).unwrap();
    let seen: Events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    scene.on_any(None, move |event| {
        sink.borrow_mut().push(event.clone());
        Ok(())
    });
    (scene, id, seen)
}

fn draggable_at_centre() -> MarkerOptions {
    MarkerOptions::point("p", Cartographic::new(0.0, 0.0, 0.0)).draggable(true)
}

fn kinds(events: &Events) -> Vec<EventKind> {
    events.borrow().iter().map(|event| event.kind).collect()
}

fn down(position: DVec2) -> PointerInput {
    PointerInput::Down {
        button: PointerButton::Left,
        position,
    }
}

fn up(position: DVec2) -> PointerInput {
    PointerInput::Up {
        button: PointerButton::Left,
        position,
    }
}

fn click(position: DVec2) -> PointerInput {
    PointerInput::Click {
        button: PointerButton::Left,
        position,
    }
}

fn moved(position: DVec2) -> PointerInput {
    PointerInput::Move { position }
}

#[test]
fn small_movement_is_a_click_not_a_drag() {
    let (mut scene, id, events) = scene_with(draggable_at_centre());

    scene.handle_pointer(down(CENTRE));
    scene.handle_pointer(moved(CENTRE + DVec2::new(1.0, 1.0)));
    scene.handle_pointer(up(CENTRE + DVec2::new(1.0, 1.0)));
    scene.handle_pointer(click(CENTRE + DVec2::new(1.0, 1.0)));

    assert_eq!(kinds(&events), vec![EventKind::Click, EventKind::Select]);
    assert_eq!(scene.get(&id).unwrap().position(), Cartographic::new(0.0, 0.0, 0.0));
    assert_eq!(scene.interaction().selected(), Some(&id));
}

#[test]
fn movement_past_the_threshold_drags_and_swallows_the_click() {
    let (mut scene, id, events) = scene_with(draggable_at_centre());

    scene.handle_pointer(down(CENTRE));
    scene.handle_pointer(moved(CENTRE + DVec2::new(5.0, 0.0)));
    assert!(scene.interaction().is_dragging());
    assert_eq!(scene.engine().cursor(), CursorStyle::Grabbing);
    scene.handle_pointer(up(CENTRE + DVec2::new(5.0, 0.0)));
    scene.handle_pointer(click(CENTRE + DVec2::new(5.0, 0.0)));

    assert_eq!(kinds(&events), vec![EventKind::DragStart, EventKind::DragEnd]);
    assert_eq!(scene.interaction().phase(), &DragPhase::Idle);
    assert!(scene.interaction().selected().is_none());
    assert!(scene.get(&id).unwrap().is_mounted());
}

#[test]
fn drag_keeps_the_grab_offset_on_the_tangent_plane() {
    let options = MarkerOptions::point("p", Cartographic::new(0.0, 0.0, 0.0))
        .draggable(true)
        .with_height(HeightMode::RelativeToGround, 100.0);
    let (mut scene, id, events) = scene_with(options);
    let anchor = scene.get(&id).unwrap().placement();
    assert_eq!(anchor.height, 100.0);

    let start = CENTRE + DVec2::new(4.0, 2.0);
    let end = CENTRE + DVec2::new(24.0, -8.0);
    scene.handle_pointer(down(CENTRE));
    scene.handle_pointer(moved(start));
    scene.handle_pointer(moved(end));
    scene.handle_pointer(up(end));

    let plane = Plane::tangent_at(&anchor);
    let engine = scene.engine();
    let i0 = engine
        .intersect_ray_plane(&engine.project(start).unwrap(), &plane)
        .unwrap();
    let i1 = engine
        .intersect_ray_plane(&engine.project(end).unwrap(), &plane)
        .unwrap();
    let expected = cartesian_to_cartographic(i1 + (cartographic_to_cartesian(&anchor) - i0)).unwrap();

    let record = scene.get(&id).unwrap();
    let moved_to = record.position();
    assert!((moved_to.longitude - expected.longitude).abs() < 1e-9);
    assert!((moved_to.latitude - expected.latitude).abs() < 1e-9);
    assert_eq!(moved_to.height, 0.0);
    assert_eq!(record.height_offset(), 100.0);
    assert!(moved_to.longitude > 0.0);

    assert_eq!(
        kinds(&events),
        vec![EventKind::DragStart, EventKind::Drag, EventKind::DragEnd]
    );
}

#[test]
fn clamped_records_drag_along_the_ground() {
    let options = MarkerOptions::point("p", Cartographic::new(0.0, 0.0, 0.0))
        .draggable(true)
        .with_height(HeightMode::ClampToGround, 0.0);
    let (mut scene, id, _) = scene_with(options);

    scene.handle_pointer(down(CENTRE));
    scene.handle_pointer(moved(CENTRE + DVec2::new(10.0, 0.0)));
    match scene.interaction().phase() {
        DragPhase::Dragging { plane, .. } => assert!(plane.is_none()),
        other => panic!("expected a drag, got {other:?}"),
    }
    scene.handle_pointer(moved(CENTRE + DVec2::new(30.0, 0.0)));
    scene.handle_pointer(up(CENTRE + DVec2::new(30.0, 0.0)));

    let metres_east = scene.get(&id).unwrap().position().longitude.to_radians() * 6_378_137.0;
    assert!((metres_east - 20.0).abs() < 1e-3, "moved {metres_east} m");
}

#[test]
fn non_draggable_records_are_only_clicked() {
    let options = MarkerOptions::point("p", Cartographic::new(0.0, 0.0, 0.0));
    let (mut scene, id, events) = scene_with(options);

    scene.handle_pointer(down(CENTRE));
    scene.handle_pointer(moved(CENTRE + DVec2::new(40.0, 0.0)));
    scene.handle_pointer(up(CENTRE + DVec2::new(40.0, 0.0)));
    scene.handle_pointer(click(CENTRE));

    assert_eq!(kinds(&events), vec![EventKind::Click, EventKind::Select]);
    assert_eq!(scene.get(&id).unwrap().position(), Cartographic::new(0.0, 0.0, 0.0));
}

#[test]
fn pointer_up_always_clears_an_armed_drag() {
    let (mut scene, _, events) = scene_with(draggable_at_centre());
    scene.handle_pointer(down(CENTRE));
    assert!(matches!(scene.interaction().phase(), DragPhase::Armed { .. }));
    scene.handle_pointer(up(CENTRE));
    assert_eq!(scene.interaction().phase(), &DragPhase::Idle);
    assert!(events.borrow().is_empty());
}

#[test]
fn hover_tracks_the_topmost_record_and_cursor() {
    let (mut scene, id, events) = scene_with(draggable_at_centre());

    scene.handle_pointer(moved(CENTRE));
    assert_eq!(scene.interaction().hovered(), Some(&id));
    assert!(scene.get(&id).unwrap().is_hovered());
    assert_eq!(scene.engine().cursor(), CursorStyle::Pointer);

    scene.handle_pointer(moved(CENTRE + DVec2::new(1.0, 0.0)));
    scene.handle_pointer(moved(EMPTY));
    assert!(scene.interaction().hovered().is_none());
    assert!(!scene.get(&id).unwrap().is_hovered());
    assert_eq!(scene.engine().cursor(), CursorStyle::Default);

    assert_eq!(kinds(&events), vec![EventKind::HoverStart, EventKind::HoverEnd]);
}

#[test]
fn selection_highlights_and_restores() {
    let (mut scene, id, events) = scene_with(draggable_at_centre());
    let selection = scene.config().selection.clone();

    scene.handle_pointer(click(CENTRE));
    let record = scene.get(&id).unwrap();
    assert!(record.is_selected());
    assert_eq!(record.style().color, selection.color);
    assert_eq!(record.style().scale, selection.scale);

    scene.handle_pointer(click(CENTRE));
    assert_eq!(
        kinds(&events),
        vec![EventKind::Click, EventKind::Select, EventKind::Click]
    );

    scene.handle_pointer(click(EMPTY));
    let record = scene.get(&id).unwrap();
    assert!(!record.is_selected());
    assert_eq!(record.style().color, "#ffffff");
    assert_eq!(record.style().scale, 1.0);
    assert!(!record.has_saved_state());
    assert_eq!(kinds(&events).last(), Some(&EventKind::Deselect));
}

#[test]
fn selecting_another_record_deselects_the_first() {
    let (mut scene, a, events) = scene_with(draggable_at_centre());
    let b = scene
        .add(Record::factory(MarkerOptions::point("q", Cartographic::new(0.0005, 0.0, 0.0))).unwrap())
        .unwrap();
    let b_screen = scene.engine().screen_of(&Cartographic::new(0.0005, 0.0, 0.0));

    scene.handle_pointer(click(CENTRE));
    scene.handle_pointer(click(b_screen));

    assert_eq!(scene.interaction().selected(), Some(&b));
    assert!(!scene.get(&a).unwrap().is_selected());
    assert_eq!(scene.get(&a).unwrap().style().color, "#ffffff");
    assert_eq!(
        kinds(&events),
        vec![
            EventKind::Click,
            EventKind::Select,
            EventKind::Click,
            EventKind::Deselect,
            EventKind::Select
        ]
    );
}

#[test]
fn right_click_reports_record_or_surface() {
    let (mut scene, id, events) = scene_with(draggable_at_centre());
    let right = |position| PointerInput::Click {
        button: PointerButton::Right,
        position,
    };

    scene.handle_pointer(right(CENTRE));
    scene.handle_pointer(right(EMPTY));

    let events = events.borrow();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].target, EventTarget::Record(id));
    let expected = scene.engine().geographic_under(EMPTY).unwrap();
    match &events[1].target {
        EventTarget::Surface(point) => assert!(point.same_spot(&expected, 1e-9)),
        other => panic!("expected a surface point, got {other:?}"),
    }
    assert!(scene.interaction().selected().is_none());
}

#[test]
fn foreign_content_on_top_hides_records() {
    let (mut scene, _, events) = scene_with(draggable_at_centre());
    scene.engine_mut().add_foreign_footprint(CENTRE, 10.0);

    scene.handle_pointer(click(CENTRE));
    assert!(events.borrow().is_empty());
    assert!(scene.interaction().selected().is_none());
}

#[test]
fn deleting_the_selection_clears_interaction_state() {
    let (mut scene, id, _) = scene_with(draggable_at_centre());
    scene.handle_pointer(moved(CENTRE));
    scene.handle_pointer(click(CENTRE));

    assert_eq!(scene.delete_selected(), Some(id.clone()));
    assert!(!scene.contains(&id));
    assert!(scene.interaction().hovered().is_none());
    assert_eq!(scene.engine().cursor(), CursorStyle::Default);
    assert_eq!(scene.delete_selected(), None);
}

#[test]
fn escape_style_deselect_restores_the_record() {
    let (mut scene, id, _) = scene_with(draggable_at_centre());
    scene.select(&id).unwrap();
    assert_eq!(scene.deselect(), Some(id.clone()));
    assert_eq!(scene.deselect(), None);
    assert!(!scene.get(&id).unwrap().is_selected());
}
