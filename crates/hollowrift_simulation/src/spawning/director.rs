//! Combat director: кредиты → покупка карт → спавн из pool'а

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::cards::{SpawnCard, SpawnCardPool};
use super::nodes::SpawnNodeSet;
use crate::components::Player;
use crate::navigation::WalkableArea;
use crate::physics::PhysicsWorld;
use crate::pool::{prototypes, PoolRegistry};
use crate::DeterministicRng;

/// Настройки директора (часть SimulationConfig)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectorConfig {
    pub enabled: bool,
    pub starting_credits: f32,
    pub credit_gain_per_second: f32,
    pub difficulty: f32,
    pub node_count: usize,
    pub node_sample_radius: f32,
    pub cards: Vec<SpawnCard>,
}

impl Default for DirectorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            starting_credits: 0.0,
            credit_gain_per_second: 1.0,
            difficulty: 1.0,
            node_count: 300,
            node_sample_radius: 100.0,
            cards: vec![
                SpawnCard::new("Grunt", prototypes::MELEE_ENEMY, 10.0),
                SpawnCard::new("Archer", prototypes::RANGED_ENEMY, 20.0)
                    .with_distance(20.0, 60.0),
            ],
        }
    }
}

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct CombatDirector {
    pub enabled: bool,
    pub credits: f32,
    pub credit_gain_per_second: f32,
    pub difficulty: f32,
    pub cards: SpawnCardPool,
}

impl Default for CombatDirector {
    fn default() -> Self {
        Self::from_config(&DirectorConfig::default())
    }
}

impl CombatDirector {
    pub fn from_config(config: &DirectorConfig) -> Self {
        Self {
            enabled: config.enabled,
            credits: config.starting_credits.max(0.0),
            credit_gain_per_second: config.credit_gain_per_second,
            difficulty: config.difficulty,
            cards: SpawnCardPool::new(config.cards.clone()),
        }
    }

    /// credits += gain × difficulty × dt
    pub fn accrue(&mut self, delta: f32) {
        self.credits += self.credit_gain_per_second * self.difficulty * delta;
    }
}

/// Наблюдатель (камера): директор не спавнит у него на виду
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct SpawnObserver;

/// Event: директор купил карту
#[derive(Event, Debug, Clone, PartialEq)]
pub struct DirectorSpawned {
    pub entity: Entity,
    pub card: String,
    pub position: Vec3,
    pub cost: f32,
}

/// Система: anchor узлов = последняя walkable позиция игрока; первая сборка узлов
pub fn track_spawn_anchor(
    area: Option<Res<WalkableArea>>,
    mut nodes: ResMut<SpawnNodeSet>,
    mut rng: ResMut<DeterministicRng>,
    players: Query<&Transform, With<Player>>,
) {
    let Some(area) = area else {
        return;
    };
    let Some(player) = players.iter().next() else {
        return;
    };

    if nodes.update_anchor(&area, player.translation).is_err() {
        return;
    }
    if !nodes.is_built() {
        if let Err(err) = nodes.build(&area, &mut rng.rng) {
            crate::logger::log_warning(&format!("⚠️ Spawn nodes not built: {}", err));
        }
    }
}

/// Система: шаг директора
///
/// Нет доступной карты или валидного узла — пропуск tick'а, кредиты копятся.
#[allow(clippy::too_many_arguments)]
pub fn run_combat_director(
    mut commands: Commands,
    time: Res<Time>,
    mut director: ResMut<CombatDirector>,
    nodes: Res<SpawnNodeSet>,
    mut registry: ResMut<PoolRegistry>,
    mut rng: ResMut<DeterministicRng>,
    physics: PhysicsWorld,
    observers: Query<&Transform, With<SpawnObserver>>,
    mut spawned: EventWriter<DirectorSpawned>,
) {
    if !director.enabled {
        return;
    }
    director.accrue(time.delta_secs());

    let Some(card) = director.cards.affordable(director.credits, &mut rng.rng).cloned() else {
        return;
    };

    let observer = observers.iter().next().map(|transform| transform.translation);
    let Ok(position) = nodes.valid_node(&card, &physics, observer, &mut rng.rng) else {
        return;
    };

    match registry.spawn(&mut commands, &card.prototype, Transform::from_translation(position)) {
        Ok(entity) => {
            director.credits -= card.cost;
            spawned.write(DirectorSpawned {
                entity,
                card: card.name.clone(),
                position,
                cost: card.cost,
            });
            crate::logger::log(&format!(
                "👾 Director spawned {} {:?} at {:.1?} (credits left {:.1})",
                card.name, entity, position, director.credits
            ));
        }
        Err(err) => {
            crate::logger::log_warning(&format!(
                "⚠️ Director failed to spawn {}: {}",
                card.name, err
            ));
        }
    }
}
