//! Projectile module: pooled снаряды
//!
//! Полёт — swept ray за tick (без туннелирования), попадание втыкает снаряд
//! в поверхность и возвращает его в pool после stick-задержки.
//! Дальность/время жизни истекли — сразу обратно в pool.

use bevy::prelude::*;
use bevy_rapier3d::prelude::Group;

use crate::abilities::AbilityHit;
use crate::combat::{DamageRequest, Dead};
use crate::math::look_rotation;
use crate::physics::collision::{hostile_mask, MASK_LOS_BLOCK};
use crate::physics::{PhysicsQueries, PhysicsWorld};
use crate::pool::{despawn_later, prototypes, PoolError, PoolRegistry, PoolSettings, PrototypeId};
use crate::targeting::Faction;
use crate::SimulationSet;


/// Базовая дальность любого снаряда (м)
pub const PROJECTILE_BASE_RANGE: f32 = 30.0;
/// Множитель range-параметра к дальности
pub const PROJECTILE_RANGE_SCALE: f32 = 10.0;
/// Принудительный возврат в pool
pub const PROJECTILE_MAX_LIFETIME: f32 = 5.0;
/// Воткнутый снаряд живёт stick + shrink
pub const PROJECTILE_STICK_TIME: f32 = 1.2 + 0.35;

/// Что делает попадание
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectilePayload {
    /// Фиксированный урон (AI)
    Damage(f32),
    /// Урон/stun/предметы способности владельца
    Ability { slot: usize },
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Projectile {
    pub owner: Option<Entity>,
    pub faction: Faction,
    pub payload: ProjectilePayload,
    pub velocity: Vec3,
    pub start: Vec3,
    pub position: Vec3,
    pub max_distance: f32,
    pub age: f32,
    pub hit_mask: Group,
    pub stuck: bool,
}

impl Projectile {
    /// `range` — range-параметр атаки/способности (дальность = 30 + 10·range)
    pub fn new(
        owner: Option<Entity>,
        faction: Faction,
        payload: ProjectilePayload,
        origin: Vec3,
        velocity: Vec3,
        range: f32,
    ) -> Self {
        Self {
            owner,
            faction,
            payload,
            velocity,
            start: origin,
            position: origin,
            max_distance: PROJECTILE_BASE_RANGE + range * PROJECTILE_RANGE_SCALE,
            age: 0.0,
            hit_mask: hostile_mask(faction) | MASK_LOS_BLOCK,
            stuck: false,
        }
    }

    pub fn travelled(&self) -> f32 {
        self.start.distance(self.position)
    }

    pub fn is_expired(&self) -> bool {
        self.travelled() >= self.max_distance || self.age >= PROJECTILE_MAX_LIFETIME
    }
}

/// Выдаёт снаряд из pool'а `prototype` и вставляет runtime state
pub fn spawn_projectile(
    commands: &mut Commands,
    registry: &mut PoolRegistry,
    prototype: &PrototypeId,
    projectile: Projectile,
) -> Result<Entity, PoolError> {
    let rotation = look_rotation(projectile.velocity, Vec3::Y).unwrap_or_default();
    let transform = Transform::from_translation(projectile.position).with_rotation(rotation);

    let entity = registry.spawn(commands, prototype, transform)?;
    commands.entity(entity).insert(projectile);
    Ok(entity)
}

/// Projectile Plugin
///
/// Регистрирует прототипы снарядов в pool'е; полёт — Projectiles set.
#[derive(Default)]
pub struct ProjectilePlugin {
    pub pool: PoolSettings,
}

impl Plugin for ProjectilePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PoolRegistry>();
        {
            let mut registry = app.world_mut().resource_mut::<PoolRegistry>();
            for prototype in [prototypes::AI_PROJECTILE, prototypes::PLAYER_PROJECTILE] {
                registry.register(prototype, self.pool, |entity| {
                    entity.insert(Name::new("Projectile"));
                });
            }
        }

        app.add_systems(
            FixedUpdate,
            (fly_projectiles, sync_projectile_transforms)
                .chain()
                .in_set(SimulationSet::Projectiles),
        );
    }
}

/// Система: полёт, попадание, истечение
pub fn fly_projectiles(
    mut commands: Commands,
    mut registry: ResMut<PoolRegistry>,
    time: Res<Time>,
    physics: PhysicsWorld,
    mut projectiles: Query<(Entity, &mut Projectile)>,
    factions: Query<&Faction, Without<Dead>>,
    mut damage_events: EventWriter<DamageRequest>,
    mut ability_hits: EventWriter<AbilityHit>,
) {
    let delta = time.delta_secs();
    if delta <= 0.0 {
        return;
    }
    let now = time.elapsed_secs();

    for (entity, mut projectile) in projectiles.iter_mut() {
        if projectile.stuck {
            continue;
        }
        projectile.age += delta;

        let step = projectile.velocity * delta;
        let hit = physics.cast_ray(
            projectile.position,
            step,
            step.length(),
            projectile.hit_mask,
            projectile.owner,
        );

        let Some(hit) = hit else {
            projectile.position += step;
            if projectile.is_expired() {
                registry.despawn(&mut commands, entity);
            }
            continue;
        };

        // Втыкаемся в поверхность / персонажа
        projectile.position = hit.point;
        projectile.velocity = Vec3::ZERO;
        projectile.stuck = true;
        despawn_later(&mut commands, entity, now, PROJECTILE_STICK_TIME);

        let Some(target) = hit.entity else {
            continue;
        };
        let Ok(target_faction) = factions.get(target) else {
            continue;
        };
        if !projectile.faction.is_hostile_to(*target_faction) {
            continue;
        }

        match projectile.payload {
            ProjectilePayload::Damage(amount) => {
                damage_events.write(DamageRequest {
                    target,
                    source: projectile.owner,
                    amount,
                    direct: true,
                });
            }
            ProjectilePayload::Ability { slot } => {
                let Some(attacker) = projectile.owner else {
                    continue;
                };
                ability_hits.write(AbilityHit {
                    attacker,
                    target,
                    slot,
                    direct: true,
                });
            }
        }
        crate::logger::log(&format!("🎯 Projectile {:?} hit {:?}", entity, target));
    }
}

/// Система: Transform ← Projectile.position
pub fn sync_projectile_transforms(
    mut projectiles: Query<(&Projectile, &mut Transform), Changed<Projectile>>,
) {
    for (projectile, mut transform) in projectiles.iter_mut() {
        transform.translation = projectile.position;
        if let Some(rotation) = look_rotation(projectile.velocity, Vec3::Y) {
            transform.rotation = rotation;
        }
    }
}
