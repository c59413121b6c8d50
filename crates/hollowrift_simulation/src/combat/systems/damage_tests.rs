//! Tests for damage systems.

use bevy::prelude::*;

use super::damage::*;
use crate::animation::{params, AnimParams};
use crate::combat::{
    calculate_damage, DamageDealt, DamageRequest, Dead, EntityDied, HealRequest, Healed,
};
use crate::components::{Actor, Armor, DeathBehavior, Health};
use crate::pool::{DespawnAfter, PoolRegistry, PooledDespawned, PooledSpawned};

fn setup_app() -> App {
    let mut app = App::new();
    app.add_event::<DamageRequest>()
        .add_event::<HealRequest>()
        .add_event::<DamageDealt>()
        .add_event::<Healed>()
        .add_event::<EntityDied>()
        .add_event::<PooledSpawned>()
        .add_event::<PooledDespawned>()
        .init_resource::<PoolRegistry>()
        .init_resource::<Time>();
    app.add_systems(
        Update,
        (apply_heal_requests, apply_damage_requests, handle_deaths).chain(),
    );
    app
}

fn event_count<E: Event>(app: &App) -> usize {
    let events = app.world().resource::<Events<E>>();
    let mut cursor = events.get_cursor();
    cursor.read(events).count()
}

fn hit(app: &mut App, target: Entity, amount: f32) {
    app.world_mut().send_event(DamageRequest {
        target,
        source: None,
        amount,
        direct: false,
    });
}

#[test]
fn test_armor_formula() {
    assert_eq!(calculate_damage(20.0, 0.0), 20.0);
    assert_eq!(calculate_damage(20.0, 100.0), 10.0);
    assert!((calculate_damage(30.0, 50.0) - 20.0).abs() < 1e-5);
    // Отрицательная броня не усиливает урон
    assert_eq!(calculate_damage(20.0, -50.0), 20.0);
}

#[test]
fn test_damage_applies_armor() {
    let mut app = setup_app();
    let target = app.world_mut().spawn((Actor, Armor(100.0))).id();

    hit(&mut app, target, 40.0);
    app.update();

    let health = app.world().get::<Health>(target).unwrap();
    assert_eq!(health.current, 80.0);
    assert_eq!(event_count::<DamageDealt>(&app), 1);
    assert!(app.world().get::<AnimParams>(target).unwrap().has_trigger(params::HIT));
}

#[test]
fn test_death_fires_exactly_once() {
    let mut app = setup_app();
    let target = app
        .world_mut()
        .spawn((Actor, Health::new(10.0), DeathBehavior::Persist))
        .id();

    // Два смертельных удара в один tick
    hit(&mut app, target, 50.0);
    hit(&mut app, target, 50.0);
    app.update();

    assert_eq!(event_count::<EntityDied>(&app), 1);
    assert!(app.world().get::<Dead>(target).is_some());

    // Урон по мёртвому игнорируется
    hit(&mut app, target, 50.0);
    app.update();
    assert_eq!(app.world().get::<Health>(target).unwrap().current, 0.0);
}

#[test]
fn test_heal_clamps_to_max_and_reports_restored() {
    let mut app = setup_app();
    let target = app.world_mut().spawn((Actor, Health::new(100.0))).id();
    app.world_mut().get_mut::<Health>(target).unwrap().current = 90.0;

    app.world_mut().send_event(HealRequest {
        target,
        amount: 25.0,
    });
    app.update();

    assert_eq!(app.world().get::<Health>(target).unwrap().current, 100.0);
    let events = app.world().resource::<Events<Healed>>();
    let mut cursor = events.get_cursor();
    let healed: Vec<_> = cursor.read(events).copied().collect();
    assert_eq!(healed.len(), 1);
    assert_eq!(healed[0].amount, 10.0);
}

#[test]
fn test_death_schedules_despawn() {
    let mut app = setup_app();
    let target = app
        .world_mut()
        .spawn((Actor, Health::new(5.0), DeathBehavior::Despawn { delay: 2.0 }))
        .id();

    hit(&mut app, target, 10.0);
    app.update();

    let despawn = app.world().get::<DespawnAfter>(target).unwrap();
    assert!((despawn.despawn_time - 2.0).abs() < 1e-5);
}

#[test]
fn test_zero_delay_despawns_immediately() {
    let mut app = setup_app();
    let target = app
        .world_mut()
        .spawn((Actor, Health::new(5.0), DeathBehavior::Despawn { delay: 0.0 }))
        .id();

    hit(&mut app, target, 10.0);
    app.update();

    assert!(app.world().get_entity(target).is_err());
}
