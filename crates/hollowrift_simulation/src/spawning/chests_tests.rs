//! Tests for chest placement (headless: FlatGround + proxy коллайдеры).

use bevy::ecs::system::RunSystemOnce;
use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::*;
use crate::items::Loot;
use crate::navigation::WalkableArea;
use crate::physics::collision::{terrain_groups, GROUP_INTERACTABLE};
use crate::physics::{FlatGround, HeadlessCollider, PhysicsWorld};
use crate::pool::{
    prototypes, PoolRegistry, PoolSettings, PooledDespawned, PooledSpawned, PrototypeId,
};
use crate::DeterministicRng;

fn place(
    world: &mut World,
    area: WalkableArea,
    occupied: Vec<Vec3>,
    config: ChestConfig,
) -> Result<(Vec3, Quat), PlacementError> {
    world
        .run_system_once(move |physics: PhysicsWorld| {
            let mut rng = ChaCha8Rng::seed_from_u64(21);
            place_chest(&area, &physics, &occupied, &config, &mut rng)
        })
        .unwrap()
}

/// Area из одной точки (отступ больше размера)
fn point_area(x: f32, z: f32) -> WalkableArea {
    WalkableArea::new(Vec2::new(x, z), Vec2::new(x, z), 0.0)
}

#[test]
fn test_chest_lands_on_flat_ground_inside_padding() {
    let mut world = World::new();
    world.insert_resource(FlatGround::default());

    for _ in 0..10 {
        let (point, rotation) =
            place(&mut world, WalkableArea::default(), Vec::new(), ChestConfig::default()).unwrap();
        assert_eq!(point.y, 0.0);
        assert!(point.x.abs() <= 95.0 && point.z.abs() <= 95.0);
        assert!(rotation.angle_between(Quat::IDENTITY) < 1e-4);
    }
}

#[test]
fn test_chest_rejected_without_ground() {
    let mut world = World::new();
    let result = place(&mut world, WalkableArea::default(), Vec::new(), ChestConfig::default());
    assert_eq!(result, Err(PlacementError::NoChestPosition));
}

#[test]
fn test_chest_rejected_on_blocked_spot() {
    let mut world = World::new();
    world.insert_resource(FlatGround::default());
    let area = point_area(0.0, 0.0);

    assert!(place(&mut world, area, Vec::new(), ChestConfig::default()).is_ok());
    // Уже занято сундуком этого прохода
    assert_eq!(
        place(&mut world, area, vec![Vec3::ZERO], ChestConfig::default()),
        Err(PlacementError::NoChestPosition)
    );

    // Камень прямо на точке
    world.spawn((Transform::from_xyz(0.0, 0.0, 0.0), HeadlessCollider::new(2.0)));
    assert_eq!(
        place(&mut world, area, Vec::new(), ChestConfig::default()),
        Err(PlacementError::NoChestPosition)
    );
}

#[test]
fn test_chest_rejected_on_steep_slope() {
    let mut world = World::new();
    // Холм: бок сферы под ~64°
    world.spawn((Transform::from_xyz(0.0, 0.0, 0.0), HeadlessCollider::new(2.0), terrain_groups()));
    let area = point_area(1.8, 0.0);

    assert_eq!(
        place(&mut world, area, Vec::new(), ChestConfig::default()),
        Err(PlacementError::NoChestPosition)
    );

    let steep = ChestConfig {
        max_slope: 70.0,
        ..default()
    };
    let (point, rotation) = place(&mut world, area, Vec::new(), steep).unwrap();
    let normal = point.normalize();
    assert!((rotation * Vec3::Y).distance(normal) < 1e-3, "chest aligned to the slope");
}

fn setup_app(config: ChestConfig) -> App {
    let mut app = App::new();
    let mut pools = PoolRegistry::default();
    pools.register(prototypes::CHEST, PoolSettings::default(), chest_prototype(config));

    app.add_event::<PooledSpawned>()
        .add_event::<PooledDespawned>()
        .insert_resource(pools)
        .insert_resource(config)
        .init_resource::<ChestField>()
        .insert_resource(DeterministicRng::new(5))
        .insert_resource(FlatGround::default());
    app.add_systems(Update, spawn_chests);
    app
}

#[test]
fn test_spawn_chests_once_and_spread_out() {
    let config = ChestConfig {
        count: 6,
        ..default()
    };
    let mut app = setup_app(config);
    app.insert_resource(WalkableArea::new(Vec2::splat(-20.0), Vec2::splat(20.0), 0.0));

    app.update();
    app.update();

    let field = app.world().resource::<ChestField>().clone();
    assert!(field.placed);
    assert_eq!(field.chests.len(), 6);
    assert_eq!(field.skipped, 0);
    let prototype = PrototypeId::new(prototypes::CHEST);
    assert_eq!(app.world().resource::<PoolRegistry>().active_count(&prototype), 6);

    let positions: Vec<Vec3> = field
        .chests
        .iter()
        .map(|chest| {
            let world = app.world();
            assert_eq!(world.get::<Loot>(*chest), Some(&Loot::default()));
            let groups = world.get::<bevy_rapier3d::prelude::CollisionGroups>(*chest).unwrap();
            assert_eq!(groups.memberships, GROUP_INTERACTABLE);
            world.get::<Transform>(*chest).unwrap().translation
        })
        .collect();
    for (index, a) in positions.iter().enumerate() {
        assert!(a.x.abs() <= 15.0 && a.z.abs() <= 15.0);
        for b in positions.iter().skip(index + 1) {
            assert!(a.distance(*b) >= config.radius() * 2.0);
        }
    }
}

#[test]
fn test_chest_without_position_is_skipped() {
    let config = ChestConfig {
        count: 3,
        max_attempts: 5,
        ..default()
    };
    let mut app = setup_app(config);
    // Одна точка: влезает только первый сундук
    app.insert_resource(point_area(0.0, 0.0));

    app.update();

    let field = app.world().resource::<ChestField>();
    assert_eq!(field.chests.len(), 1);
    assert_eq!(field.skipped, 2);
}

#[test]
fn test_no_walkable_area_waits() {
    let mut app = setup_app(ChestConfig::default());
    app.update();
    assert!(!app.world().resource::<ChestField>().placed);

    app.insert_resource(point_area(0.0, 0.0));
    app.update();
    let field = app.world().resource::<ChestField>();
    assert!(field.placed);
    assert_eq!(field.chests.len(), 1);
}
