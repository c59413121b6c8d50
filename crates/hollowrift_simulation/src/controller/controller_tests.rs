//! Tests for floating capsule systems (headless: FlatGround + integrator).

use std::time::Duration;

use bevy::prelude::*;
use bevy_rapier3d::prelude::Velocity;

use super::*;
use crate::physics::{integrate_headless_bodies, FlatGround, PhysicsGravity};

const DT: f32 = 1.0 / 60.0;

fn setup_app() -> App {
    let mut app = App::new();
    app.add_event::<Jumped>()
        .add_event::<PlatformReaction>()
        .init_resource::<Time>()
        .init_resource::<PhysicsGravity>()
        .insert_resource(FlatGround { height: 0.0 });
    app.add_systems(
        Update,
        (
            tick_strafe_timers,
            probe_ground,
            update_floating_capsules,
            apply_platform_reactions,
            integrate_headless_bodies,
        )
            .chain(),
    );
    app
}

fn step(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        app.world_mut()
            .resource_mut::<Time>()
            .advance_by(Duration::from_secs_f32(DT));
        app.update();
    }
}

fn spawn_capsule(app: &mut App, height: f32) -> Entity {
    app.world_mut()
        .spawn((FloatingCapsule::default(), Transform::from_xyz(0.0, height, 0.0)))
        .id()
}

#[test]
fn test_capsule_settles_at_ride_height() {
    let mut app = setup_app();
    let capsule = spawn_capsule(&mut app, 2.0);

    step(&mut app, 240);

    let transform = app.world().get::<Transform>(capsule).unwrap();
    let velocity = app.world().get::<Velocity>(capsule).unwrap();
    let state = app.world().get::<ControllerState>(capsule).unwrap();

    assert!(
        (transform.translation.y - 1.75).abs() < 0.01,
        "y = {}",
        transform.translation.y
    );
    assert!(velocity.linvel.length() < 0.05);
    assert!(state.is_grounded);
}

#[test]
fn test_capsule_without_ground_falls() {
    let mut app = setup_app();
    app.world_mut().remove_resource::<FlatGround>();
    let capsule = spawn_capsule(&mut app, 2.0);

    step(&mut app, 30);

    let transform = app.world().get::<Transform>(capsule).unwrap();
    let state = app.world().get::<ControllerState>(capsule).unwrap();
    assert!(transform.translation.y < 1.0);
    assert!(!state.is_grounded);
}

#[test]
fn test_jump_lifts_capsule_and_emits_event() {
    let mut app = setup_app();
    let capsule = spawn_capsule(&mut app, 1.75);
    step(&mut app, 60);

    app.world_mut()
        .get_mut::<ControllerInput>(capsule)
        .unwrap()
        .press_jump();
    step(&mut app, 1);

    let events = app.world().resource::<Events<Jumped>>();
    let mut cursor = events.get_cursor();
    let jumps: Vec<_> = cursor.read(events).copied().collect();
    assert_eq!(
        jumps,
        vec![Jumped {
            entity: capsule,
            air_jump: false
        }]
    );

    step(&mut app, 10);
    let transform = app.world().get::<Transform>(capsule).unwrap();
    assert!(transform.translation.y > 2.5, "y = {}", transform.translation.y);
    assert!(app.world().get::<ControllerState>(capsule).unwrap().is_jumping);
}

#[test]
fn test_move_input_accelerates_up_to_max_speed() {
    let mut app = setup_app();
    let capsule = spawn_capsule(&mut app, 1.75);

    app.world_mut()
        .get_mut::<ControllerInput>(capsule)
        .unwrap()
        .move_axis = Vec2::new(1.0, 0.0);
    step(&mut app, 120);

    let velocity = app.world().get::<Velocity>(capsule).unwrap();
    assert!((velocity.linvel.x - 8.0).abs() < 0.1, "v = {:?}", velocity.linvel);
    assert!(velocity.linvel.z.abs() < 0.1);
}

#[test]
fn test_locked_movement_ignores_input() {
    let mut app = setup_app();
    let capsule = spawn_capsule(&mut app, 1.75);
    {
        let world = app.world_mut();
        world.get_mut::<ControllerState>(capsule).unwrap().set_movement_enabled(false);
        world.get_mut::<ControllerInput>(capsule).unwrap().move_axis = Vec2::new(0.0, 1.0);
    }

    step(&mut app, 30);

    let velocity = app.world().get::<Velocity>(capsule).unwrap();
    assert!(velocity.linvel.z.abs() < 1e-3);
}

#[test]
fn test_flight_disables_gravity() {
    let mut app = setup_app();
    app.world_mut().remove_resource::<FlatGround>();
    let capsule = spawn_capsule(&mut app, 5.0);
    app.world_mut()
        .get_mut::<ControllerState>(capsule)
        .unwrap()
        .enable_flight(true);

    step(&mut app, 60);

    let transform = app.world().get::<Transform>(capsule).unwrap();
    assert!((transform.translation.y - 5.0).abs() < 1e-3);
}
