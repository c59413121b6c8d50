//! Tests for item hooks.

use std::time::Duration;

use bevy::prelude::*;

use super::*;
use crate::abilities::{Abilities, Ability, AbilityHit, Emitter, MeleeEmitter};
use crate::combat::{HealRequest, HealZone};
use crate::controller::{ControllerState, FloatingCapsule, Jumped};
use crate::pool::{
    prototypes, DespawnAfter, PoolRegistry, PoolSettings, PooledDespawned, PooledSpawned,
};
use crate::status::{ApplyStatus, StatusKind};

const DT: f32 = 1.0 / 60.0;

#[derive(Resource, Default)]
struct Collected {
    heals: Vec<HealRequest>,
    statuses: Vec<ApplyStatus>,
}

fn collect(
    mut heals: EventReader<HealRequest>,
    mut statuses: EventReader<ApplyStatus>,
    mut collected: ResMut<Collected>,
) {
    collected.heals.extend(heals.read().copied());
    collected.statuses.extend(statuses.read().copied());
}

fn setup_app() -> App {
    let mut app = App::new();
    let mut pools = PoolRegistry::default();
    pools.register(prototypes::HEAL_ZONE, PoolSettings::default(), |entity| {
        entity.insert(HealZone::new(HEAL_ZONE_RADIUS));
    });

    app.add_event::<ItemPickedUp>()
        .add_event::<Jumped>()
        .add_event::<AbilityHit>()
        .add_event::<HealRequest>()
        .add_event::<ApplyStatus>()
        .add_event::<PooledSpawned>()
        .add_event::<PooledDespawned>()
        .insert_resource(pools)
        .init_resource::<Collected>()
        .init_resource::<Time>();
    app.add_systems(
        Update,
        (
            pick_up_items,
            tick_item_updates,
            item_on_jump,
            item_on_hit,
            collect,
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

fn spawn_player(app: &mut App) -> Entity {
    let primary = Ability::new("Primary", Emitter::Melee(MeleeEmitter::default()))
        .affected_by_attack_speed();
    let slam = Ability::new("Slam", Emitter::Melee(MeleeEmitter::default())).with_damage(30.0);
    app.world_mut()
        .spawn((
            Inventory::default(),
            Abilities::new(vec![primary, slam]),
            FloatingCapsule::default(),
            ControllerState::default(),
            Transform::from_xyz(1.0, 0.0, 2.0),
        ))
        .id()
}

fn pick_up(app: &mut App, entity: Entity, kind: ItemKind, times: usize) {
    for _ in 0..times {
        app.world_mut().send_event(ItemPickedUp { entity, kind });
        step(app, 1);
    }
}

#[test]
fn test_pickup_applies_only_picked_kind() {
    let mut app = setup_app();
    let player = spawn_player(&mut app);

    pick_up(&mut app, player, ItemKind::FireDamage, 2);
    pick_up(&mut app, player, ItemKind::AttackSpeed, 1);
    pick_up(&mut app, player, ItemKind::ExtraJump, 2);

    let world = app.world();
    let abilities = world.get::<Abilities>(player).unwrap();
    assert_eq!(abilities.slots[0].damage, 30.0);
    assert_eq!(abilities.slots[1].damage, 50.0);
    assert_eq!(abilities.slots[0].speed, 2.0);
    assert_eq!(abilities.slots[1].speed, 1.0, "not affected by attack speed");
    assert_eq!(abilities.slots[0].range, 1.0);
    assert_eq!(world.get::<FloatingCapsule>(player).unwrap().max_extra_jumps, 2);

    let inventory = world.get::<Inventory>(player).unwrap();
    assert_eq!(inventory.stacks(ItemKind::FireDamage), 2);
    assert_eq!(inventory.stacks(ItemKind::ExtraJump), 2);
}

#[test]
fn test_movement_speed_bonus() {
    let mut app = setup_app();
    let player = spawn_player(&mut app);

    pick_up(&mut app, player, ItemKind::MovementSpeed, 3);

    let world = app.world();
    let state = world.get::<ControllerState>(player).unwrap();
    let tuning = world.get::<FloatingCapsule>(player).unwrap();
    assert_eq!(state.speed_bonus, 3.0);
    assert_eq!(state.current_max_speed(tuning), tuning.base_max_speed + 3.0);
}

#[test]
fn test_healing_item_heals_every_second() {
    let mut app = setup_app();
    let player = spawn_player(&mut app);
    pick_up(&mut app, player, ItemKind::Healing, 1);

    // Первый update сразу, дальше раз в секунду
    step(&mut app, 125);

    let heals = &app.world().resource::<Collected>().heals;
    assert_eq!(heals.len(), 3);
    assert!(heals.iter().all(|heal| heal.target == player && heal.amount == 9.0));
}

#[test]
fn test_bleed_on_hit() {
    let mut app = setup_app();
    let player = spawn_player(&mut app);
    let enemy = app.world_mut().spawn_empty().id();
    pick_up(&mut app, player, ItemKind::Bleed, 10);

    app.world_mut().send_event(AbilityHit {
        attacker: player,
        target: enemy,
        slot: 0,
        direct: true,
    });
    step(&mut app, 1);

    let statuses = &app.world().resource::<Collected>().statuses;
    assert_eq!(statuses.len(), 1);
    let effect = statuses[0].effect;
    assert_eq!(statuses[0].target, enemy);
    assert_eq!(effect.kind, StatusKind::Bleed);
    assert_eq!(effect.stacks, 10);
    assert_eq!(effect.magnitude, 2.0);
    assert_eq!(effect.remaining_duration, 10.0);
    assert_eq!(effect.source, Some(player));
}

#[test]
fn test_healing_area_on_jump_with_internal_cooldown() {
    let mut app = setup_app();
    let player = spawn_player(&mut app);
    pick_up(&mut app, player, ItemKind::HealingArea, 1);

    let heal_zones = |app: &mut App| {
        app.world_mut()
            .query::<(&HealZone, &DespawnAfter)>()
            .iter(app.world())
            .count()
    };

    app.world_mut().send_event(Jumped {
        entity: player,
        air_jump: false,
    });
    step(&mut app, 1);
    assert_eq!(heal_zones(&mut app), 1);
    assert_eq!(
        app.world().get::<Inventory>(player).unwrap().healing_area_cooldown,
        HEALING_AREA_COOLDOWN
    );

    // Cooldown: второй прыжок сразу — без зоны
    app.world_mut().send_event(Jumped {
        entity: player,
        air_jump: true,
    });
    step(&mut app, 1);
    assert_eq!(heal_zones(&mut app), 1);
}
