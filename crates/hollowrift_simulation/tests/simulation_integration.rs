//! Simulation integration test
//!
//! Полный SimulationPlugin headless (FlatGround вместо rapier):
//! - выбор цели (lure), chase, stun
//! - смерть ровно один раз и возврат в pool
//! - капсула игрока парит на ride height
//! - способность игрока → урон через весь pipeline
//! - сундуки: расстановка, открытие, подбор предмета

use bevy::prelude::*;
use hollowrift_simulation::abilities::{AbilityInput, MeleeEmitter};
use hollowrift_simulation::ai::{AiState, StunRequest};
use hollowrift_simulation::combat::{DamageDealt, DamageRequest};
use hollowrift_simulation::items::{ItemPickup, Loot};
use hollowrift_simulation::navigation::NavAgent;
use hollowrift_simulation::physics::collision::character_groups;
use hollowrift_simulation::physics::HeadlessCollider;
use hollowrift_simulation::pool::{prototypes, Dormant, PrototypeId};
use hollowrift_simulation::spawning::ChestField;
use hollowrift_simulation::*;

#[derive(Resource, Default)]
struct Collected {
    deaths: Vec<EntityDied>,
    damage: Vec<DamageDealt>,
}

fn collect(
    mut deaths: EventReader<EntityDied>,
    mut damage: EventReader<DamageDealt>,
    mut collected: ResMut<Collected>,
) {
    collected.deaths.extend(deaths.read().copied());
    collected.damage.extend(damage.read().copied());
}

/// Helper: полный App без директора; первый update — прогрев (нулевой delta)
fn create_game_app(seed: u64) -> App {
    let mut config = SimulationConfig::default();
    config.seed = seed;
    config.director.enabled = false;

    let mut app = create_headless_app(seed);
    app.add_plugins(SimulationPlugin::with_config(config))
        .insert_resource(FlatGround::default())
        .init_resource::<Collected>()
        .add_systems(FixedUpdate, collect.after(SimulationSet::Cleanup));
    app.update();
    app
}

fn step(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        app.update();
    }
}

/// Helper: враг из pool'а (как его спавнит директор)
fn spawn_enemy(app: &mut App, position: Vec3) -> Entity {
    let world = app.world_mut();
    let entity = world.resource_scope(|world, mut registry: Mut<PoolRegistry>| {
        let mut commands = world.commands();
        registry
            .spawn(
                &mut commands,
                &PrototypeId::new(prototypes::MELEE_ENEMY),
                Transform::from_translation(position),
            )
            .unwrap()
    });
    world.flush();
    entity
}

/// Helper: неподвижная цель (без контроллера)
fn spawn_dummy(app: &mut App, faction: Faction, position: Vec3) -> Entity {
    app.world_mut()
        .spawn((
            Actor,
            faction,
            Targetable::new(faction),
            Health::new(30.0),
            HeadlessCollider::new(0.5),
            character_groups(faction),
            DeathBehavior::Persist,
            Transform::from_translation(position),
        ))
        .id()
}

fn agent_state(app: &App, entity: Entity) -> AiState {
    app.world().get::<AiAgent>(entity).unwrap().state
}

#[test]
fn test_enemy_prefers_lure_over_closer_player() {
    let mut app = create_game_app(42);
    let enemy = spawn_enemy(&mut app, Vec3::ZERO);
    let _player = spawn_dummy(&mut app, Faction::Player, Vec3::new(5.0, 0.0, 0.0));
    let lure = app
        .world_mut()
        .spawn((
            Actor,
            Faction::Ally,
            Targetable::new(Faction::Ally).lure(),
            Transform::from_xyz(-8.0, 0.0, 0.0),
        ))
        .id();

    step(&mut app, 3);

    let agent = app.world().get::<AiAgent>(enemy).unwrap();
    assert_eq!(agent.target, Some(lure));
    let nav = app.world().get::<NavAgent>(enemy).unwrap();
    assert_eq!(nav.destination, Some(Vec3::new(-8.0, 0.0, 0.0)));
}

#[test]
fn test_enemy_chases_player_inside_chase_range() {
    let mut app = create_game_app(42);
    let enemy = spawn_enemy(&mut app, Vec3::ZERO);
    let player = spawn_dummy(&mut app, Faction::Player, Vec3::new(25.0, 0.0, 0.0));

    step(&mut app, 61);

    let agent = app.world().get::<AiAgent>(enemy).unwrap();
    assert_eq!(agent.target, Some(player));
    assert_eq!(agent.state, AiState::Chase);

    // 3.5 м/с, минус tick на выбор цели
    let x = app.world().get::<Transform>(enemy).unwrap().translation.x;
    assert!(x > 3.0 && x < 3.6, "x = {}", x);
}

#[test]
fn test_enemy_waits_outside_chase_range() {
    let mut app = create_game_app(42);
    let enemy = spawn_enemy(&mut app, Vec3::ZERO);
    let player = spawn_dummy(&mut app, Faction::Player, Vec3::new(35.0, 0.0, 0.0));

    step(&mut app, 60);

    let agent = app.world().get::<AiAgent>(enemy).unwrap();
    assert_eq!(agent.target, Some(player));
    assert_eq!(app.world().get::<Transform>(enemy).unwrap().translation, Vec3::ZERO);
    assert!(app.world().get::<NavAgent>(enemy).unwrap().is_stopped);
}

#[test]
fn test_stun_freezes_enemy_then_returns_to_chase() {
    let mut app = create_game_app(42);
    let enemy = spawn_enemy(&mut app, Vec3::ZERO);
    spawn_dummy(&mut app, Faction::Player, Vec3::new(10.0, 0.0, 0.0));
    step(&mut app, 5);

    app.world_mut().send_event(StunRequest {
        entity: enemy,
        duration: 0.5,
    });
    step(&mut app, 1);
    assert_eq!(agent_state(&app, enemy), AiState::Stunned);

    let frozen_at = app.world().get::<Transform>(enemy).unwrap().translation;
    step(&mut app, 20);
    assert_eq!(agent_state(&app, enemy), AiState::Stunned);
    assert_eq!(app.world().get::<Transform>(enemy).unwrap().translation, frozen_at);

    step(&mut app, 15);
    assert_eq!(agent_state(&app, enemy), AiState::Chase);
    step(&mut app, 10);
    let moved_to = app.world().get::<Transform>(enemy).unwrap().translation;
    assert!(moved_to.x > frozen_at.x);
}

#[test]
fn test_enemy_dies_once_and_returns_to_pool() {
    let mut app = create_game_app(42);
    let enemy = spawn_enemy(&mut app, Vec3::new(0.0, 0.0, 40.0));
    step(&mut app, 1);

    // Два смертельных удара в один tick
    for _ in 0..2 {
        app.world_mut().send_event(DamageRequest {
            target: enemy,
            source: None,
            amount: 100.0,
            direct: false,
        });
    }
    step(&mut app, 1);

    let deaths = &app.world().resource::<Collected>().deaths;
    assert_eq!(deaths.len(), 1);
    assert_eq!(deaths[0].entity, enemy);
    assert!(app.world().get::<Dead>(enemy).is_some());
    assert_eq!(app.world().get::<Health>(enemy).unwrap().current, 0.0);

    // DeathBehavior::Despawn { delay: 2.0 }
    step(&mut app, 60);
    assert!(app.world().resource::<PoolRegistry>().is_active(enemy));

    step(&mut app, 70);
    assert!(!app.world().resource::<PoolRegistry>().is_active(enemy));
    assert!(app.world().get::<Dormant>(enemy).is_some());
    assert!(app.world().get::<AiAgent>(enemy).is_none());
    assert!(!app.world().resource::<TargetRegistry>().contains(enemy));
    assert_eq!(app.world().resource::<Collected>().deaths.len(), 1);
}

#[test]
fn test_player_capsule_hovers_at_ride_height() {
    let mut app = create_game_app(42);
    let player = app
        .world_mut()
        .spawn((
            player_bundle(FloatingCapsule::default()),
            Transform::from_xyz(0.0, 2.0, 0.0),
        ))
        .id();

    step(&mut app, 240);

    let y = app.world().get::<Transform>(player).unwrap().translation.y;
    assert!((y - 1.75).abs() < 0.02, "y = {}", y);
}

#[test]
fn test_player_melee_ability_damages_enemy() {
    let mut app = create_game_app(42);
    let swipe = Ability::new("Swipe", Emitter::Melee(MeleeEmitter::default())).with_activity(0.6, None);
    let player = app
        .world_mut()
        .spawn((
            player_bundle(FloatingCapsule::default()),
            Abilities::new(vec![swipe]),
            Transform::from_xyz(0.0, 1.75, 0.0),
        ))
        .id();
    let dummy = spawn_dummy(&mut app, Faction::Enemy, Vec3::new(0.0, 1.0, -1.5));
    step(&mut app, 2);

    app.world_mut().send_event(AbilityInput::press(player, 0));
    step(&mut app, 2);

    let damage = &app.world().resource::<Collected>().damage;
    assert_eq!(damage.len(), 1);
    assert_eq!(damage[0].target, dummy);
    assert_eq!(damage[0].attacker, Some(player));
    assert_eq!(app.world().get::<Health>(dummy).unwrap().current, 20.0);
}

#[test]
fn test_config_drives_plugin_resources() {
    let config = SimulationConfig::from_ron_str(
        "(seed: 9, director: (enabled: true, starting_credits: 30.0, difficulty: 3.0))",
    )
    .unwrap();

    let mut app = create_headless_app(config.seed);
    app.add_plugins(SimulationPlugin::with_config(config));

    let director = app.world().resource::<CombatDirector>();
    assert_eq!(director.credits, 30.0);
    assert_eq!(director.difficulty, 3.0);
    assert_eq!(app.world().resource::<DeterministicRng>().seed, 9);
    assert!(app.world().contains_resource::<WalkableArea>());
}

#[test]
fn test_chests_placed_opened_and_looted() {
    let mut app = create_game_app(42);
    step(&mut app, 1);

    let field = app.world().resource::<ChestField>().clone();
    assert!(field.placed);
    assert_eq!(field.chests.len(), 20);

    // Персонаж в 1.5 м перед сундуком, смотрит на него (-Z)
    let chest = field.chests[0];
    let position = app.world().get::<Transform>(chest).unwrap().translation;
    let looter = app
        .world_mut()
        .spawn((Inventory::default(), Transform::from_translation(position + Vec3::Z * 1.5)))
        .id();

    app.world_mut().send_event(InteractRequest { entity: looter });
    step(&mut app, 1);
    assert!(app.world().get::<Loot>(chest).unwrap().opened);

    step(&mut app, 65);
    assert!(app.world().get::<Dormant>(chest).is_some(), "opened chest returned to pool");
    let world = app.world_mut();
    let dropped = world
        .query::<(&ItemPickup, &Transform)>()
        .iter(world)
        .any(|(_, transform)| transform.translation.distance(position) < 1.0);
    assert!(dropped);

    app.world_mut().send_event(InteractRequest { entity: looter });
    step(&mut app, 1);
    assert!(!app.world().get::<Inventory>(looter).unwrap().is_empty());
}
