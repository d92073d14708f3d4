//! Stop Detector Tests
//!
//! A die is stopped once both squared speeds stay below epsilon for a full
//! window of ticks. Any motion resets the run.

use dice_box_core_rs::physics::{BodyPose, PhysicsWorld, RigidBody, SimpleWorld};
use dice_box_core_rs::settle::{all_stopped, StopDetector, StopTransition};
use dice_box_core_rs::{DieCatalog, DieType};
use glam::{Quat, Vec3};

const EPSILON: f32 = 0.045;

#[test]
fn test_threshold_is_on_squared_speed() {
    // 0.2^2 = 0.04 < 0.045, 0.25^2 = 0.0625 > 0.045
    let mut detector = StopDetector::new(EPSILON, 0);
    assert_eq!(
        detector.observe(0, Vec3::new(0.25, 0.0, 0.0), Vec3::ZERO),
        StopTransition::Moving
    );
    assert_eq!(
        detector.observe(1, Vec3::new(0.2, 0.0, 0.0), Vec3::new(0.0, 0.2, 0.0)),
        StopTransition::Settled
    );
}

#[test]
fn test_settled_reported_once_per_rest() {
    let mut detector = StopDetector::new(EPSILON, 5);
    let settled = (0..50)
        .map(|tick| detector.observe(tick, Vec3::ZERO, Vec3::ZERO))
        .filter(|t| *t == StopTransition::Settled)
        .count();
    assert_eq!(settled, 1);
    assert!(detector.is_stopped());
}

#[test]
fn test_nudge_after_settle_restarts_window() {
    let mut detector = StopDetector::new(EPSILON, 5);
    for tick in 0..=5 {
        detector.observe(tick, Vec3::ZERO, Vec3::ZERO);
    }
    assert!(detector.is_stopped());

    assert_eq!(
        detector.observe(6, Vec3::new(0.0, 0.0, 1.0), Vec3::ZERO),
        StopTransition::Moving
    );
    assert!(!detector.is_stopped());

    for tick in 7..12 {
        assert_eq!(
            detector.observe(tick, Vec3::ZERO, Vec3::ZERO),
            StopTransition::Resting
        );
    }
    assert_eq!(
        detector.observe(12, Vec3::ZERO, Vec3::ZERO),
        StopTransition::Settled
    );
}

#[test]
fn test_window_change_applies_to_running_mark() {
    let mut detector = StopDetector::new(EPSILON, 100);
    for tick in 0..10 {
        detector.observe(tick, Vec3::ZERO, Vec3::ZERO);
    }
    detector.set_window(5);
    assert_eq!(detector.window(), 5);
    assert_eq!(
        detector.observe(10, Vec3::ZERO, Vec3::ZERO),
        StopTransition::Settled
    );
}

#[test]
fn test_all_stopped_needs_every_detector() {
    let mut a = StopDetector::new(EPSILON, 0);
    let mut b = StopDetector::new(EPSILON, 0);
    a.observe(0, Vec3::ZERO, Vec3::ZERO);
    b.observe(0, Vec3::ONE, Vec3::ZERO);
    assert!(!all_stopped([&a, &b]));

    b.observe(1, Vec3::ZERO, Vec3::ZERO);
    assert!(all_stopped([&a, &b]));
}

#[test]
fn test_dropped_die_comes_to_rest() {
    let catalog = DieCatalog::standard();
    let kind = catalog.kind(DieType::D6);
    let mut world = SimpleWorld::default();

    let mut body = RigidBody::new(kind.shape().clone(), 1.0);
    body.linear_damping = 0.1;
    body.angular_damping = 0.5;
    body.set_state(
        BodyPose {
            position: Vec3::new(0.0, 0.0, 4.0),
            orientation: Quat::from_rotation_x(0.3),
        },
        Vec3::new(1.0, 0.5, 0.0),
        Vec3::new(2.0, -3.0, 1.0),
    );
    let handle = world.add_body(body);

    let mut detector = StopDetector::default();
    let mut settled_at = None;
    for tick in 1..=3000 {
        world.step(1.0 / 60.0);
        let body = world.body(handle).unwrap();
        if detector.observe(tick, body.linear_velocity, body.angular_velocity)
            == StopTransition::Settled
        {
            settled_at = Some(tick);
            break;
        }
    }

    let tick = settled_at.expect("die never settled");
    assert!(tick > detector.window());
    let body = world.body(handle).unwrap();
    assert!(body.position.z > 0.0 && body.position.z < 1.5);
}
