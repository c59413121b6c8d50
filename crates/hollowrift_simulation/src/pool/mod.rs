//! Object pool: переиспользуемые entity по прототипу
//!
//! Контракт:
//! - `spawn(prototype, transform)` → готовый, полностью сброшенный instance
//!   (из очереди свободных или новый, если pool expandable / не добран до initial_size)
//! - `despawn(entity)` → instance возвращается в свой pool, а не уничтожается
//! - `DespawnAfter` — отложенный возврат
//!
//! Сброс = все компоненты снимаются (`retain::<Pooled>`), на spawn factory вставляет
//! свежий bundle. Никакие таймеры/флаги прошлой жизни не доживают до следующей.

use bevy::ecs::system::EntityCommands;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;
use thiserror::Error;

use crate::SimulationSet;

#[cfg(test)]
mod pool_tests;

/// Идентификатор прототипа (ключ pool'а)
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Reflect, Serialize, Deserialize,
)]
pub struct PrototypeId(pub String);

impl PrototypeId {
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<&str> for PrototypeId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Встроенные прототипы симуляции
pub mod prototypes {
    pub const AI_PROJECTILE: &str = "ai_projectile";
    pub const PLAYER_PROJECTILE: &str = "player_projectile";
    pub const SUMMON: &str = "summon";
    pub const HEAL_ZONE: &str = "heal_zone";
    pub const MELEE_ENEMY: &str = "melee_enemy";
    pub const RANGED_ENEMY: &str = "ranged_enemy";
    pub const CHEST: &str = "chest";
    pub const ITEM_PICKUP: &str = "item_pickup";
}

/// Метка: entity принадлежит pool'у
#[derive(Component, Debug, Clone, Reflect)]
#[reflect(Component)]
pub struct Pooled {
    pub prototype: PrototypeId,
}

/// Метка: entity припаркована в pool'е (кроме `Pooled` на ней ничего нет)
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Dormant;

/// Компонент: вернуть/удалить entity после указанного времени
///
/// `despawn_time` — в секундах fixed-времени симуляции.
#[derive(Component, Debug, Clone, Copy, Reflect)]
#[reflect(Component)]
pub struct DespawnAfter {
    pub despawn_time: f32,
}

/// Event: instance выдан из pool'а (свежий bundle уже вставлен)
#[derive(Event, Debug, Clone)]
pub struct PooledSpawned {
    pub entity: Entity,
    pub prototype: PrototypeId,
}

/// Event: instance вернулся в pool
#[derive(Event, Debug, Clone)]
pub struct PooledDespawned {
    pub entity: Entity,
    pub prototype: PrototypeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PoolSettings {
    pub initial_size: usize,
    pub expandable: bool,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            initial_size: 10,
            expandable: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    #[error("no pool registered for prototype {0:?}")]
    UnknownPrototype(PrototypeId),
    #[error("pool {0:?} is exhausted and not expandable")]
    Exhausted(PrototypeId),
}

/// Factory: вставляет свежий bundle прототипа (всё, кроме Transform)
pub type PrototypeFactory = Arc<dyn Fn(&mut EntityCommands) + Send + Sync>;

struct ObjectPool {
    settings: PoolSettings,
    factory: PrototypeFactory,
    free: VecDeque<Entity>,
    created: usize,
    prewarmed: bool,
}

/// Реестр pool'ов (единственный shared mutable ресурс эмиттеров/спавнеров)
#[derive(Resource, Default)]
pub struct PoolRegistry {
    // BTreeMap — детерминированный порядок prewarm'а
    pools: BTreeMap<PrototypeId, ObjectPool>,
    active: HashMap<Entity, PrototypeId>,
}

impl PoolRegistry {
    /// Регистрирует прототип; повторная регистрация меняет только factory/settings
    pub fn register<F>(&mut self, prototype: impl Into<PrototypeId>, settings: PoolSettings, factory: F)
    where
        F: Fn(&mut EntityCommands) + Send + Sync + 'static,
    {
        let prototype = prototype.into();
        let factory: PrototypeFactory = Arc::new(factory);
        match self.pools.get_mut(&prototype) {
            Some(pool) => {
                pool.settings = settings;
                pool.factory = factory;
            }
            None => {
                self.pools.insert(
                    prototype,
                    ObjectPool {
                        settings,
                        factory,
                        free: VecDeque::new(),
                        created: 0,
                        prewarmed: false,
                    },
                );
            }
        }
    }

    pub fn has_prototype(&self, prototype: &PrototypeId) -> bool {
        self.pools.contains_key(prototype)
    }

    pub fn is_active(&self, entity: Entity) -> bool {
        self.active.contains_key(&entity)
    }

    pub fn free_count(&self, prototype: &PrototypeId) -> usize {
        self.pools.get(prototype).map_or(0, |pool| pool.free.len())
    }

    pub fn active_count(&self, prototype: &PrototypeId) -> usize {
        self.active.values().filter(|p| *p == prototype).count()
    }

    /// Выдаёт instance прототипа в позиции `transform`
    pub fn spawn(
        &mut self,
        commands: &mut Commands,
        prototype: &PrototypeId,
        transform: Transform,
    ) -> Result<Entity, PoolError> {
        let pool = self
            .pools
            .get_mut(prototype)
            .ok_or_else(|| PoolError::UnknownPrototype(prototype.clone()))?;

        // Свободные могли быть уничтожены снаружи — пропускаем такие
        let mut reused = None;
        while let Some(candidate) = pool.free.pop_front() {
            if commands.get_entity(candidate).is_ok() {
                reused = Some(candidate);
                break;
            }
            pool.created = pool.created.saturating_sub(1);
        }

        let entity = match reused {
            Some(entity) => entity,
            None => {
                if !pool.settings.expandable && pool.created >= pool.settings.initial_size {
                    crate::logger::log_warning(&format!(
                        "⚠️ Pool {:?} exhausted ({} instances)",
                        prototype, pool.created
                    ));
                    return Err(PoolError::Exhausted(prototype.clone()));
                }
                pool.created += 1;
                commands.spawn_empty().id()
            }
        };

        let factory = pool.factory.clone();
        let mut entity_commands = commands.entity(entity);
        entity_commands.remove::<Dormant>();
        factory(&mut entity_commands);
        entity_commands.insert((
            transform,
            Pooled {
                prototype: prototype.clone(),
            },
        ));

        self.active.insert(entity, prototype.clone());
        commands.send_event(PooledSpawned {
            entity,
            prototype: prototype.clone(),
        });
        Ok(entity)
    }

    /// Возвращает instance в pool; не-pooled entity просто удаляется
    ///
    /// Повторный despawn уже припаркованного instance — no-op.
    pub fn despawn(&mut self, commands: &mut Commands, entity: Entity) {
        if let Some(prototype) = self.active.remove(&entity) {
            let Ok(mut entity_commands) = commands.get_entity(entity) else {
                // Уничтожен снаружи: место в pool'е освобождается
                if let Some(pool) = self.pools.get_mut(&prototype) {
                    pool.created = pool.created.saturating_sub(1);
                }
                return;
            };
            entity_commands.retain::<Pooled>().insert(Dormant);

            if let Some(pool) = self.pools.get_mut(&prototype) {
                pool.free.push_back(entity);
            }
            commands.send_event(PooledDespawned { entity, prototype });
            return;
        }

        let parked = self.pools.values().any(|pool| pool.free.contains(&entity));
        if parked {
            return;
        }

        if let Ok(mut entity_commands) = commands.get_entity(entity) {
            entity_commands.try_despawn();
        }
    }

    /// Создаёт недостающие dormant instance до initial_size
    fn prewarm(&mut self, commands: &mut Commands) {
        for (prototype, pool) in self.pools.iter_mut() {
            if pool.prewarmed {
                continue;
            }
            pool.prewarmed = true;

            while pool.created < pool.settings.initial_size {
                let entity = commands
                    .spawn((
                        Pooled {
                            prototype: prototype.clone(),
                        },
                        Dormant,
                    ))
                    .id();
                pool.free.push_back(entity);
                pool.created += 1;
            }
        }
    }
}

/// Pool Plugin
///
/// Порядок:
/// 1. prewarm_pools — добирает instance до initial_size (один раз на прототип)
/// 2. despawn_after_timeout — отложенный возврат в pool
pub struct PoolPlugin;

impl Plugin for PoolPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PoolRegistry>()
            .add_event::<PooledSpawned>()
            .add_event::<PooledDespawned>()
            .register_type::<Pooled>()
            .register_type::<DespawnAfter>();

        app.add_systems(FixedUpdate, prewarm_pools.in_set(SimulationSet::Input));
        app.add_systems(
            FixedUpdate,
            despawn_after_timeout.in_set(SimulationSet::Cleanup),
        );
    }
}

/// Система: prewarm pool'ов
pub fn prewarm_pools(mut commands: Commands, mut registry: ResMut<PoolRegistry>) {
    if registry.pools.values().all(|pool| pool.prewarmed) {
        return;
    }
    registry.prewarm(&mut commands);
}

/// Система: деспавн entities с истёкшим DespawnAfter
///
/// Pooled → обратно в pool, остальные удаляются.
pub fn despawn_after_timeout(
    mut commands: Commands,
    mut registry: ResMut<PoolRegistry>,
    query: Query<(Entity, &DespawnAfter)>,
    time: Res<Time>,
) {
    let current_time = time.elapsed_secs();

    for (entity, despawn_after) in query.iter() {
        if current_time >= despawn_after.despawn_time {
            crate::logger::log(&format!("⚰️ Despawning entity {:?} (timeout)", entity));
            commands.entity(entity).remove::<DespawnAfter>();
            registry.despawn(&mut commands, entity);
        }
    }
}

/// Helper: запланировать despawn через `delay` секунд
pub fn despawn_later(commands: &mut Commands, entity: Entity, now: f32, delay: f32) {
    if let Ok(mut entity_commands) = commands.get_entity(entity) {
        entity_commands.try_insert(DespawnAfter {
            despawn_time: now + delay.max(0.0),
        });
    }
}
