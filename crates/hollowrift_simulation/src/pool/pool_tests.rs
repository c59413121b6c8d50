use super::*;
use bevy::ecs::system::RunSystemOnce;

#[derive(Component, Debug, Clone, Copy, PartialEq)]
struct Charge(u32);

fn setup_world() -> World {
    let mut world = World::new();
    world.init_resource::<Events<PooledSpawned>>();
    world.init_resource::<Events<PooledDespawned>>();
    world
}

fn bolt() -> PrototypeId {
    PrototypeId::new("bolt")
}

fn registry(initial_size: usize, expandable: bool) -> PoolRegistry {
    let mut registry = PoolRegistry::default();
    registry.register(
        "bolt",
        PoolSettings {
            initial_size,
            expandable,
        },
        |entity| {
            entity.insert(Charge(0));
        },
    );
    registry
}

fn spawn(world: &mut World, registry: &mut PoolRegistry) -> Result<Entity, PoolError> {
    let result = {
        let mut commands = world.commands();
        registry.spawn(&mut commands, &bolt(), Transform::from_xyz(1.0, 2.0, 3.0))
    };
    world.flush();
    result
}

fn despawn(world: &mut World, registry: &mut PoolRegistry, entity: Entity) {
    {
        let mut commands = world.commands();
        registry.despawn(&mut commands, entity);
    }
    world.flush();
}

#[test]
fn test_spawn_inserts_fresh_bundle_and_transform() {
    let mut world = setup_world();
    let mut registry = registry(2, true);

    let entity = spawn(&mut world, &mut registry).unwrap();

    assert_eq!(world.get::<Charge>(entity), Some(&Charge(0)));
    assert_eq!(
        world.get::<Transform>(entity).unwrap().translation,
        Vec3::new(1.0, 2.0, 3.0)
    );
    assert!(world.get::<Dormant>(entity).is_none());
    assert!(registry.is_active(entity));
}

#[test]
fn test_reuse_resets_state() {
    let mut world = setup_world();
    let mut registry = registry(1, false);

    let first = spawn(&mut world, &mut registry).unwrap();
    world.get_mut::<Charge>(first).unwrap().0 = 42;

    despawn(&mut world, &mut registry, first);
    assert!(world.get::<Dormant>(first).is_some());
    assert!(world.get::<Charge>(first).is_none(), "dormant instance keeps only Pooled");
    assert_eq!(registry.free_count(&bolt()), 1);

    let second = spawn(&mut world, &mut registry).unwrap();
    assert_eq!(first, second);
    assert_eq!(world.get::<Charge>(second), Some(&Charge(0)));
}

#[test]
fn test_exhausted_pool_returns_error() {
    let mut world = setup_world();
    let mut registry = registry(2, false);

    spawn(&mut world, &mut registry).unwrap();
    spawn(&mut world, &mut registry).unwrap();

    assert_eq!(
        spawn(&mut world, &mut registry),
        Err(PoolError::Exhausted(bolt()))
    );
}

#[test]
fn test_expandable_pool_grows_past_initial_size() {
    let mut world = setup_world();
    let mut registry = registry(1, true);

    for _ in 0..5 {
        spawn(&mut world, &mut registry).unwrap();
    }
    assert_eq!(registry.active_count(&bolt()), 5);
}

#[test]
fn test_unknown_prototype() {
    let mut world = setup_world();
    let mut registry = PoolRegistry::default();

    let result = {
        let mut commands = world.commands();
        registry.spawn(&mut commands, &PrototypeId::new("ghost"), Transform::default())
    };
    assert_eq!(
        result,
        Err(PoolError::UnknownPrototype(PrototypeId::new("ghost")))
    );
}

#[test]
fn test_despawn_twice_is_noop_and_foreign_entity_is_removed() {
    let mut world = setup_world();
    let mut registry = registry(2, false);

    let pooled = spawn(&mut world, &mut registry).unwrap();
    despawn(&mut world, &mut registry, pooled);
    despawn(&mut world, &mut registry, pooled);
    assert_eq!(registry.free_count(&bolt()), 1);
    assert!(world.get_entity(pooled).is_ok());

    let foreign = world.spawn(Charge(7)).id();
    despawn(&mut world, &mut registry, foreign);
    assert!(world.get_entity(foreign).is_err());
}

#[test]
fn test_prewarm_fills_initial_size() {
    let mut world = setup_world();
    world.insert_resource(registry(3, false));

    world.run_system_once(prewarm_pools).unwrap();
    world.flush();

    let registry = world.resource::<PoolRegistry>();
    assert_eq!(registry.free_count(&bolt()), 3);

    let dormant = world
        .iter_entities()
        .filter(|entity| entity.contains::<Dormant>())
        .count();
    assert_eq!(dormant, 3);
}

#[test]
fn test_instance_destroyed_outside_frees_its_slot() {
    let mut world = setup_world();
    let mut registry = registry(1, false);

    let first = spawn(&mut world, &mut registry).unwrap();
    world.despawn(first);
    despawn(&mut world, &mut registry, first);
    assert!(!registry.is_active(first));

    // Не-expandable pool не должен "усыхать"
    let second = spawn(&mut world, &mut registry).unwrap();
    assert_ne!(first, second);
    assert_eq!(world.get::<Charge>(second), Some(&Charge(0)));
}
