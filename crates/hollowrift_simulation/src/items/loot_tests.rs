//! Tests for chests, item pickups and interact.

use std::time::Duration;

use bevy::prelude::*;

use super::*;
use crate::controller::ControllerInput;
use crate::physics::collision::interactable_groups;
use crate::physics::HeadlessCollider;
use crate::pool::{prototypes, Dormant, PoolRegistry, PoolSettings, PooledDespawned, PooledSpawned};
use crate::DeterministicRng;

const DT: f32 = 1.0 / 60.0;

#[derive(Resource, Default)]
struct Picked(Vec<ItemPickedUp>);

fn collect(mut events: EventReader<ItemPickedUp>, mut picked: ResMut<Picked>) {
    picked.0.extend(events.read().copied());
}

fn setup_app() -> App {
    let mut app = App::new();
    let mut pools = PoolRegistry::default();
    pools.register(prototypes::ITEM_PICKUP, PoolSettings::default(), item_pickup_prototype);

    app.add_event::<InteractRequest>()
        .add_event::<ItemPickedUp>()
        .add_event::<PooledSpawned>()
        .add_event::<PooledDespawned>()
        .insert_resource(pools)
        .insert_resource(DeterministicRng::new(3))
        .init_resource::<Picked>()
        .init_resource::<Time>();
    app.add_systems(
        Update,
        (collect, perform_interactions, pick_up_items, tick_loot).chain(),
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

fn interact(app: &mut App, entity: Entity) {
    app.world_mut().send_event(InteractRequest { entity });
    step(app, 1);
}

/// Игрок в origin, смотрит в -Z
fn spawn_player(app: &mut App) -> Entity {
    app.world_mut()
        .spawn((Inventory::default(), Transform::IDENTITY))
        .id()
}

fn spawn_chest(app: &mut App, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((
            Loot::default(),
            HeadlessCollider::new(0.5),
            interactable_groups(),
            Transform::from_translation(position),
        ))
        .id()
}

fn pickups(app: &mut App) -> Vec<(Entity, ItemPickup, Vec3)> {
    let world = app.world_mut();
    world
        .query::<(Entity, &ItemPickup, &Transform)>()
        .iter(world)
        .map(|(entity, pickup, transform)| (entity, *pickup, transform.translation))
        .collect()
}

#[test]
fn test_chest_opens_once_and_drops_after_delay() {
    let mut app = setup_app();
    let player = spawn_player(&mut app);
    let chest = spawn_chest(&mut app, Vec3::new(0.0, 0.0, -1.5));

    interact(&mut app, player);
    let loot = *app.world().get::<Loot>(chest).unwrap();
    assert!(loot.opened);
    assert!((loot.open_timer - (LOOT_OPEN_DELAY - DT)).abs() < 1e-4);

    // Повторный interact таймер не сбрасывает
    interact(&mut app, player);
    let loot = *app.world().get::<Loot>(chest).unwrap();
    assert!((loot.open_timer - (LOOT_OPEN_DELAY - 2.0 * DT)).abs() < 1e-4);

    step(&mut app, 55);
    assert!(app.world().get_entity(chest).is_ok());
    assert!(pickups(&mut app).is_empty());

    step(&mut app, 5);
    assert!(app.world().get_entity(chest).is_err());
    let dropped = pickups(&mut app);
    assert_eq!(dropped.len(), 1);
    assert_eq!(dropped[0].2, Vec3::new(0.0, LOOT_DROP_HEIGHT, -1.5));
    assert!(app.world().resource::<Picked>().0.is_empty());
}

#[test]
fn test_interact_picks_up_dropped_item() {
    let mut app = setup_app();
    let player = spawn_player(&mut app);
    spawn_chest(&mut app, Vec3::new(0.0, 0.0, -1.5));

    interact(&mut app, player);
    step(&mut app, 65);
    let (pickup, item, _) = pickups(&mut app)[0];

    interact(&mut app, player);
    // collect стоит первым: событие видно на следующем tick'е
    step(&mut app, 1);

    let picked = &app.world().resource::<Picked>().0;
    assert_eq!(picked.as_slice(), &[ItemPickedUp { entity: player, kind: item.kind }]);
    assert_eq!(app.world().get::<Inventory>(player).unwrap().stacks(item.kind), 1);
    // Вернулся в pool
    assert!(app.world().get::<Dormant>(pickup).is_some());
    assert!(app.world().get::<ItemPickup>(pickup).is_none());

    interact(&mut app, player);
    step(&mut app, 1);
    assert_eq!(app.world().resource::<Picked>().0.len(), 1);
}

#[test]
fn test_interact_follows_aim_direction() {
    let mut app = setup_app();
    let player = spawn_player(&mut app);
    let behind = spawn_chest(&mut app, Vec3::new(0.0, 0.0, 1.5));

    interact(&mut app, player);
    assert!(!app.world().get::<Loot>(behind).unwrap().opened);

    // Камера смотрит назад
    app.world_mut().entity_mut(player).insert(ControllerInput {
        camera_forward: Vec3::Z,
        ..default()
    });
    interact(&mut app, player);
    assert!(app.world().get::<Loot>(behind).unwrap().opened);
}

#[test]
fn test_two_players_cannot_take_same_item() {
    let mut app = setup_app();
    let first = spawn_player(&mut app);
    let second = spawn_player(&mut app);
    let pickup = app
        .world_mut()
        .spawn((
            ItemPickup {
                kind: ItemKind::Bleed,
            },
            HeadlessCollider::new(PICKUP_RADIUS),
            interactable_groups(),
            Transform::from_xyz(0.0, 0.9, -1.5),
        ))
        .id();

    app.world_mut().send_event(InteractRequest { entity: first });
    app.world_mut().send_event(InteractRequest { entity: second });
    step(&mut app, 2);

    let picked = &app.world().resource::<Picked>().0;
    assert_eq!(picked.len(), 1);
    assert_eq!(picked[0].entity, first);
    assert_eq!(app.world().get::<Inventory>(second).unwrap().stacks(ItemKind::Bleed), 0);
    assert!(app.world().get_entity(pickup).is_err());
}
