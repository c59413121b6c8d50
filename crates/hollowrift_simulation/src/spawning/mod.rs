//! Spawning module: combat director + spawn nodes + сундуки
//!
//! Директор копит кредиты (gain × difficulty), покупает случайную доступную
//! карту и спавнит её прототип из pool'а в валидном узле вокруг игрока.
//! Сундуки расставляются один раз по walkable area.

use bevy::ecs::system::EntityCommands;
use bevy::prelude::*;

pub mod cards;
pub mod chests;
pub mod director;
pub mod nodes;

#[cfg(test)]
mod chests_tests;

pub use cards::{HullSize, SpawnCard, SpawnCardPool};
pub use chests::{chest_prototype, place_chest, spawn_chests, ChestConfig, ChestField};
pub use director::{
    run_combat_director, track_spawn_anchor, CombatDirector, DirectorConfig, DirectorSpawned,
    SpawnObserver,
};
pub use nodes::{is_visible_from, PlacementError, SpawnNodeSet};

use crate::ai::{AiAgent, AiAttack, AiAttacks, AiConfig, MeleeAttack, ProjectileAttack};
use crate::components::{Actor, DeathBehavior, Health};
use crate::navigation::NavAgent;
use crate::physics::collision::character_groups;
use crate::physics::HeadlessCollider;
use crate::pool::{prototypes, PoolRegistry, PoolSettings};
use crate::targeting::{Faction, Targetable};
use crate::SimulationSet;

fn enemy_bundle(entity: &mut EntityCommands, name: &str, health: f32, ai: &AiConfig) {
    entity.insert((
        Name::new(name.to_string()),
        Actor,
        ai.clone(),
        Faction::Enemy,
        Targetable::new(Faction::Enemy),
        Health::new(health),
        AiAgent::default(),
        NavAgent::new(3.5),
        HeadlessCollider::new(0.5),
        character_groups(Faction::Enemy),
        DeathBehavior::Despawn { delay: 2.0 },
    ));
}

/// Прототип `melee_enemy`
pub fn melee_enemy_prototype(ai: AiConfig) -> impl Fn(&mut EntityCommands) + Send + Sync + 'static {
    move |entity| {
        enemy_bundle(entity, "Melee Enemy", 50.0, &ai);
        entity.insert(AiAttacks::new([AiAttack::melee(MeleeAttack::default())]));
    }
}

/// Прототип `ranged_enemy`: стреляет с дистанции, держится дальше melee
pub fn ranged_enemy_prototype(ai: AiConfig) -> impl Fn(&mut EntityCommands) + Send + Sync + 'static {
    let ai = AiConfig {
        attack_range: ai.attack_range.max(12.0),
        ..ai
    };
    move |entity| {
        enemy_bundle(entity, "Ranged Enemy", 35.0, &ai);
        entity.insert(AiAttacks::new([AiAttack::projectile(ProjectileAttack::default())]));
    }
}

/// Spawning Plugin
///
/// Cleanup set: спавн в конце tick'а, враги действуют со следующего.
#[derive(Default)]
pub struct SpawningPlugin {
    pub config: DirectorConfig,
    /// AI тюнинг для всех заспавненных врагов
    pub enemy_ai: AiConfig,
    pub enemy_pool: PoolSettings,
    pub chests: ChestConfig,
    pub chest_pool: PoolSettings,
}

impl Plugin for SpawningPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<DirectorSpawned>()
            .insert_resource(CombatDirector::from_config(&self.config))
            .insert_resource(SpawnNodeSet::new(
                self.config.node_count,
                self.config.node_sample_radius,
            ))
            .insert_resource(self.chests)
            .init_resource::<ChestField>()
            .register_type::<SpawnObserver>();

        app.init_resource::<PoolRegistry>();
        {
            let mut registry = app.world_mut().resource_mut::<PoolRegistry>();
            registry.register(
                prototypes::MELEE_ENEMY,
                self.enemy_pool,
                melee_enemy_prototype(self.enemy_ai.clone()),
            );
            registry.register(
                prototypes::RANGED_ENEMY,
                self.enemy_pool,
                ranged_enemy_prototype(self.enemy_ai.clone()),
            );
            registry.register(prototypes::CHEST, self.chest_pool, chest_prototype(self.chests));
        }

        app.add_systems(
            FixedUpdate,
            (spawn_chests, track_spawn_anchor, run_combat_director)
                .chain()
                .in_set(SimulationSet::Cleanup),
        );
    }
}
