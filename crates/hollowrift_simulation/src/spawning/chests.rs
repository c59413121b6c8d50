//! Сундуки: разовая расстановка по walkable area
//!
//! Точка: случайные x/z (минус отступ от края), луч вниз до земли, проверка
//! уклона и свободного места. Сундук без точки за `max_attempts` пропускается.

use bevy::ecs::system::EntityCommands;
use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::nodes::PlacementError;
use crate::items::Loot;
use crate::navigation::WalkableArea;
use crate::physics::collision::{interactable_groups, MASK_CHEST_BLOCK, MASK_GROUND};
use crate::physics::{HeadlessCollider, PhysicsQueries, PhysicsWorld};
use crate::pool::{prototypes, PoolRegistry, PrototypeId};
use crate::DeterministicRng;

/// Высота старта луча над area
const RAY_START_OFFSET: f32 = 10.0;
const RAY_LENGTH: f32 = 500.0;

#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChestConfig {
    pub count: usize,
    pub max_attempts: usize,
    /// Градусы
    pub max_slope: f32,
    /// Отступ от края area
    pub edge_padding: f32,
    pub half_extents: Vec3,
}

impl Default for ChestConfig {
    fn default() -> Self {
        Self {
            count: 20,
            max_attempts: 30,
            max_slope: 30.0,
            edge_padding: 5.0,
            half_extents: Vec3::new(0.5, 0.4, 0.35),
        }
    }
}

impl ChestConfig {
    /// Радиус proxy-сферы сундука
    pub fn radius(&self) -> f32 {
        self.half_extents.max_element()
    }
}

/// Состояние расстановки (один раз за забег)
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct ChestField {
    pub placed: bool,
    pub chests: Vec<Entity>,
    pub skipped: usize,
}

fn padded(min: f32, max: f32, padding: f32) -> (f32, f32) {
    if max - min > padding * 2.0 {
        (min + padding, max - padding)
    } else {
        let center = (min + max) * 0.5;
        (center, center)
    }
}

/// Точка и поворот (up → нормаль земли) для одного сундука
///
/// `occupied` — сундуки этого же прохода (ещё не видны физике).
pub fn place_chest(
    area: &WalkableArea,
    physics: &impl PhysicsQueries,
    occupied: &[Vec3],
    config: &ChestConfig,
    rng: &mut impl Rng,
) -> Result<(Vec3, Quat), PlacementError> {
    let (min_x, max_x) = padded(area.min.x, area.max.x, config.edge_padding);
    let (min_z, max_z) = padded(area.min.y, area.max.y, config.edge_padding);
    let max_cos = config.max_slope.clamp(0.0, 90.0).to_radians().cos();
    let radius = config.radius();

    for _ in 0..config.max_attempts {
        let x = if max_x > min_x { rng.gen_range(min_x..=max_x) } else { min_x };
        let z = if max_z > min_z { rng.gen_range(min_z..=max_z) } else { min_z };
        let origin = Vec3::new(x, area.height + RAY_START_OFFSET, z);

        let Some(hit) = physics.cast_ray(origin, Vec3::NEG_Y, RAY_LENGTH, MASK_GROUND, None) else {
            continue;
        };
        if hit.normal.dot(Vec3::Y) < max_cos {
            continue;
        }

        let center = hit.point + Vec3::Y * config.half_extents.y;
        if !physics.overlap_sphere(center, radius, MASK_CHEST_BLOCK).is_empty() {
            continue;
        }
        if occupied
            .iter()
            .any(|other| other.distance_squared(hit.point) < (radius * 2.0).powi(2))
        {
            continue;
        }

        return Ok((hit.point, Quat::from_rotation_arc(Vec3::Y, hit.normal)));
    }

    Err(PlacementError::NoChestPosition)
}

/// Прототип `chest`
pub fn chest_prototype(config: ChestConfig) -> impl Fn(&mut EntityCommands) + Send + Sync + 'static {
    move |entity| {
        entity.insert((
            Name::new("Chest"),
            Loot::default(),
            HeadlessCollider::new(config.radius()),
            interactable_groups(),
        ));
    }
}

/// Система: расстановка сундуков (первый tick с walkable area)
pub fn spawn_chests(
    mut commands: Commands,
    mut field: ResMut<ChestField>,
    mut registry: ResMut<PoolRegistry>,
    mut rng: ResMut<DeterministicRng>,
    config: Res<ChestConfig>,
    area: Option<Res<WalkableArea>>,
    physics: PhysicsWorld,
) {
    if field.placed {
        return;
    }
    let Some(area) = area else {
        return;
    };
    field.placed = true;

    let prototype = PrototypeId::new(prototypes::CHEST);
    let mut occupied = Vec::with_capacity(config.count);

    for index in 0..config.count {
        let (point, rotation) = match place_chest(&area, &physics, &occupied, &config, &mut rng.rng) {
            Ok(placement) => placement,
            Err(err) => {
                field.skipped += 1;
                crate::logger::log(&format!("📦 Chest #{} skipped: {}", index, err));
                continue;
            }
        };

        let transform = Transform::from_translation(point).with_rotation(rotation);
        match registry.spawn(&mut commands, &prototype, transform) {
            Ok(entity) => {
                occupied.push(point);
                field.chests.push(entity);
            }
            Err(err) => {
                crate::logger::log_warning(&format!("⚠️ Chest #{}: {}", index, err));
                break;
            }
        }
    }

    crate::logger::log_info(&format!(
        "📦 Placed {} chests ({} skipped)",
        field.chests.len(),
        field.skipped
    ));
}
