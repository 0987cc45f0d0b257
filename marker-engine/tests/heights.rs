use bevy::math::DQuat;
use marker_engine::engine::geodesy::enu_quat;
use marker_engine::engine::orientation::compose_orientation;
use marker_engine::prelude::*;
use marker_engine::{Axis, AxisRotation, HeadlessCamera, HeightRange};

fn clamped(id: &str, longitude: f64, latitude: f64) -> Record {
    let options = MarkerOptions::point(id, Cartographic::new(longitude, latitude, 0.0))
        .with_height(HeightMode::ClampToGround, 0.0);
    Record::factory(options)
        .unwrap()
        .members()
        .first()
        .cloned()
        .unwrap()
}

#[test]
fn clamped_records_settle_on_sampled_terrain() {
    let engine = HeadlessEngine::default().with_terrain(|_| 42.0);
    let mut scene = MarkerScene::new(engine);
    let id = scene.add(clamped("a", 24.0, 56.0)).unwrap();
    assert_eq!(scene.get(&id).unwrap().resolved_altitude(), 0.0);

    scene.tick(0.016);
    let record = scene.get(&id).unwrap();
    assert_eq!(record.ground_height(), Some(42.0));
    assert_eq!(record.resolved_altitude(), 42.0);
}

#[test]
fn one_outstanding_request_per_sample_key() {
    let mut engine = HeadlessEngine::default().with_terrain(|_| 42.0);
    engine.hold_samples = true;
    let mut scene = MarkerScene::new(engine);
    scene.add(clamped("a", 24.0, 56.0)).unwrap();
    scene.add(clamped("b", 24.0, 56.0)).unwrap();

    scene.tick(0.016);
    scene.tick(0.032);
    assert_eq!(scene.engine().sample_requests().len(), 1);

    scene.engine_mut().hold_samples = false;
    scene.tick(0.048);
    assert_eq!(scene.get(&RecordId::from("b")).unwrap().resolved_altitude(), 42.0);
    assert_eq!(scene.engine().sample_requests().len(), 1);
}

#[test]
fn failed_samples_keep_the_cached_height_and_back_off() {
    let engine = HeadlessEngine::default().with_terrain(|_| 42.0);
    let mut scene = MarkerScene::new(engine);
    let id = scene.add(clamped("a", 24.0, 56.0)).unwrap();
    scene.tick(0.016);

    scene.engine_mut().fail_samples = true;
    scene
        .move_to(&id, Cartographic::new(25.0, 57.0, 0.0), &[])
        .unwrap();
    let requested = scene.engine().sample_requests().len();
    scene.tick(0.032);
    assert_eq!(scene.get(&id).unwrap().resolved_altitude(), 42.0);

    for frame in 1..30 {
        scene.tick(0.032 + f64::from(frame) * 0.016);
    }
    assert_eq!(scene.engine().sample_requests().len(), requested);

    let retry = scene.config().terrain_retry_seconds;
    scene.engine_mut().fail_samples = false;
    scene.tick(0.032 + retry);
    assert_eq!(scene.engine().sample_requests().len(), requested + 1);
}

#[test]
fn camera_height_toggles_height_range_visibility() {
    let engine = HeadlessEngine::new(HeadlessCamera {
        altitude: 1_000.0,
        ..HeadlessCamera::default()
    });
    let mut scene = MarkerScene::new(engine);
    let mut options = MarkerOptions::point("near", Cartographic::new(0.0, 0.0, 0.0));
    options.height_range = Some(HeightRange::new(0.0, 500.0));
    let id = scene.add(Record::factory(options).unwrap()).unwrap();

    assert!(!scene.engine().primitive(&id).unwrap().spec.show);
    assert_eq!(scene.height_subscriptions(), 1);

    scene.engine_mut().camera.altitude = 300.0;
    scene.tick(0.016);
    assert!(scene.engine().primitive(&id).unwrap().spec.show);

    scene.delete(&id);
    assert_eq!(scene.height_subscriptions(), 0);
}

#[test]
fn orientation_is_tangent_then_posture_then_spin() {
    let mut scene = MarkerScene::new(HeadlessEngine::default());
    let position = Cartographic::new(24.0, 56.0, 0.0);
    let mut options = MarkerOptions::geometry(
        "box",
        position,
        GeometryVariant::Box {
            dimensions: [2.0, 4.0, 6.0],
        },
    );
    options.posture = Some(AxisRotation::new(Axis::X, 30.0));
    options.spin = Some(AxisRotation::new(Axis::Y, 45.0));
    let id = scene.add(Record::factory(options).unwrap()).unwrap();
    scene.tick(0.016);

    let derived = scene.engine().primitive(&id).unwrap().derived;
    let orientation = DQuat::from_array(derived.orientation.unwrap());
    let expected = compose_orientation(
        enu_quat(&position),
        AxisRotation::new(Axis::X, 30.0).to_quat(),
        AxisRotation::new(Axis::Y, 45.0).to_quat(),
    );
    assert!(orientation.abs_diff_eq(expected, 1e-12));

    let swapped = compose_orientation(
        enu_quat(&position),
        AxisRotation::new(Axis::Y, 45.0).to_quat(),
        AxisRotation::new(Axis::X, 30.0).to_quat(),
    );
    assert!(!orientation.abs_diff_eq(swapped, 1e-6));
}

#[test]
fn points_have_no_orientation() {
    let mut scene = MarkerScene::new(HeadlessEngine::default());
    let id = scene
        .add(Record::factory(MarkerOptions::point("p", Cartographic::new(1.0, 2.0, 0.0))).unwrap())
        .unwrap();
    scene.tick(0.016);
    let derived = scene.engine().primitive(&id).unwrap().derived;
    assert!(derived.orientation.is_none());
    assert!(derived.position.is_some());
}
