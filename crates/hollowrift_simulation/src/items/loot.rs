//! Сундуки и предметы на земле
//!
//! Interact: сфера перед персонажем (по прицелу) по группе Interactable.
//! Сундук открывается один раз, через `LOOT_OPEN_DELAY` роняет случайный
//! предмет и исчезает; предмет на земле подбирается тем же interact'ом.

use bevy::ecs::system::EntityCommands;
use bevy::prelude::*;
use rand::Rng;

use super::inventory::ItemKind;
use super::{InteractRequest, ItemPickedUp};
use crate::abilities::aim_direction;
use crate::combat::Dead;
use crate::controller::ControllerInput;
use crate::physics::collision::{interactable_groups, GROUP_INTERACTABLE};
use crate::physics::{HeadlessCollider, PhysicsQueries, PhysicsWorld};
use crate::pool::{prototypes, PoolRegistry, PrototypeId};
use crate::DeterministicRng;

/// Открытие сундука → предмет
pub const LOOT_OPEN_DELAY: f32 = 1.0;
/// Предмет появляется над сундуком
pub const LOOT_DROP_HEIGHT: f32 = 0.5;
pub const INTERACT_ORIGIN_HEIGHT: f32 = 0.9;
pub const INTERACT_RANGE: f32 = 1.5;
pub const INTERACT_RADIUS: f32 = 0.6;
pub const PICKUP_RADIUS: f32 = 0.3;

/// Сундук
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Loot {
    pub opened: bool,
    /// До выпадения предмета
    pub open_timer: f32,
}

impl Loot {
    /// false — уже открыт
    pub fn open(&mut self) -> bool {
        if self.opened {
            return false;
        }
        self.opened = true;
        self.open_timer = LOOT_OPEN_DELAY;
        true
    }
}

/// Предмет на земле
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct ItemPickup {
    pub kind: ItemKind,
}

/// Прототип `item_pickup` (kind вставляет тот, кто роняет)
pub fn item_pickup_prototype(entity: &mut EntityCommands) {
    entity.insert((
        Name::new("ItemPickup"),
        HeadlessCollider::new(PICKUP_RADIUS),
        interactable_groups(),
    ));
}

/// Точка interact-сферы: грудь + прицел × range
pub fn interact_point(transform: &Transform, input: Option<&ControllerInput>) -> Vec3 {
    let origin = transform.translation + Vec3::Y * INTERACT_ORIGIN_HEIGHT;
    origin + aim_direction(transform, input) * INTERACT_RANGE
}

/// Система: interact — открыть сундуки / подобрать предметы в сфере
#[allow(clippy::too_many_arguments)]
pub fn perform_interactions(
    mut commands: Commands,
    mut requests: EventReader<InteractRequest>,
    mut registry: ResMut<PoolRegistry>,
    physics: PhysicsWorld,
    actors: Query<(&Transform, Option<&ControllerInput>), Without<Dead>>,
    mut chests: Query<&mut Loot>,
    pickups: Query<&ItemPickup>,
    mut picked: EventWriter<ItemPickedUp>,
) {
    // Один предмет — одному персонажу
    let mut taken: Vec<Entity> = Vec::new();

    for request in requests.read() {
        let Ok((transform, input)) = actors.get(request.entity) else {
            continue;
        };

        let point = interact_point(transform, input);
        for hit in physics.overlap_sphere(point, INTERACT_RADIUS, GROUP_INTERACTABLE) {
            if let Ok(mut loot) = chests.get_mut(hit) {
                if loot.open() {
                    crate::logger::log(&format!("📦 {:?} opened chest {:?}", request.entity, hit));
                }
                continue;
            }

            let Ok(pickup) = pickups.get(hit) else {
                continue;
            };
            if taken.contains(&hit) {
                continue;
            }
            taken.push(hit);
            picked.write(ItemPickedUp {
                entity: request.entity,
                kind: pickup.kind,
            });
            registry.despawn(&mut commands, hit);
        }
    }
}

/// Система: открытые сундуки роняют предмет и уходят в pool
pub fn tick_loot(
    mut commands: Commands,
    time: Res<Time>,
    mut registry: ResMut<PoolRegistry>,
    mut rng: ResMut<DeterministicRng>,
    mut chests: Query<(Entity, &Transform, &mut Loot)>,
) {
    let delta = time.delta_secs();
    let prototype = PrototypeId::new(prototypes::ITEM_PICKUP);

    for (entity, transform, mut loot) in chests.iter_mut() {
        if !loot.opened || loot.open_timer <= 0.0 {
            continue;
        }
        loot.open_timer -= delta;
        if loot.open_timer > 0.0 {
            continue;
        }

        let kind = ItemKind::ALL[rng.rng.gen_range(0..ItemKind::ALL.len())];
        let drop = Transform::from_translation(transform.translation + Vec3::Y * LOOT_DROP_HEIGHT);
        match registry.spawn(&mut commands, &prototype, drop) {
            Ok(pickup) => {
                commands.entity(pickup).insert(ItemPickup { kind });
                crate::logger::log(&format!("🎁 Chest {:?} dropped {}", entity, kind.name()));
            }
            Err(err) => crate::logger::log_warning(&format!("⚠️ Chest {:?}: {}", entity, err)),
        }
        registry.despawn(&mut commands, entity);
    }
}
