//! Item hooks: pickup, периодический update, прыжок, попадание

use bevy::prelude::*;

use super::inventory::*;
use super::ItemPickedUp;
use crate::abilities::{Abilities, AbilityHit};
use crate::animation::{params, AnimParams};
use crate::combat::{Dead, HealRequest};
use crate::controller::{set_extra_jumps, ControllerState, FloatingCapsule, Jumped};
use crate::pool::{despawn_later, prototypes, PoolRegistry, PrototypeId};
use crate::status::{ApplyStatus, StatusEffect};

/// Bleed предмета: урон за tick на стак
pub const BLEED_DAMAGE_PER_TICK: f32 = 2.0;

/// Эффект подобранного предмета (только этого kind'а, остальные не переприменяются)
pub fn apply_pickup(
    kind: ItemKind,
    stacks: u32,
    abilities: Option<&mut Abilities>,
    tuning: Option<&mut FloatingCapsule>,
    state: Option<&mut ControllerState>,
    mut anim: Option<&mut AnimParams>,
) {
    let bonus = stacks as f32;

    match kind {
        ItemKind::FireDamage => {
            if let Some(abilities) = abilities {
                for ability in abilities.slots.iter_mut() {
                    ability.damage = ability.base_damage + 10.0 * bonus;
                }
            }
        }
        ItemKind::AttackSpeed => {
            if let Some(abilities) = abilities {
                for (index, ability) in abilities.slots.iter_mut().enumerate() {
                    if !ability.affected_by_attack_speed {
                        continue;
                    }
                    ability.speed = ability.base_speed + bonus;
                    if let Some(anim) = anim.as_deref_mut() {
                        anim.set_float(
                            &format!("{}{}", params::ABILITY_SPEED_PREFIX, index + 1),
                            ability.speed,
                        );
                    }
                }
            }
        }
        ItemKind::AttackRange => {
            if let Some(abilities) = abilities {
                for ability in abilities.slots.iter_mut() {
                    ability.range = ability.base_range + bonus;
                }
            }
        }
        ItemKind::MovementSpeed => {
            if let Some(state) = state {
                state.speed_bonus = bonus;
                if let (Some(tuning), Some(anim)) = (tuning, anim) {
                    let base = tuning.base_max_speed.max(0.0001);
                    anim.set_float(params::MOVEMENT_SPEED, state.current_max_speed(tuning) / base);
                }
            }
        }
        ItemKind::ExtraJump => {
            if let (Some(tuning), Some(state)) = (tuning, state) {
                set_extra_jumps(tuning, state, stacks);
            }
        }
        // Работают через hooks (update / jump / hit)
        ItemKind::Healing | ItemKind::HealingArea | ItemKind::Bleed => {}
    }
}

/// Система: подбор предметов
#[allow(clippy::type_complexity)]
pub fn pick_up_items(
    mut pickups: EventReader<ItemPickedUp>,
    mut owners: Query<
        (
            &mut Inventory,
            Option<&mut Abilities>,
            Option<&mut FloatingCapsule>,
            Option<&mut ControllerState>,
            Option<&mut AnimParams>,
        ),
        Without<Dead>,
    >,
) {
    for pickup in pickups.read() {
        let Ok((mut inventory, mut abilities, mut tuning, mut state, mut anim)) =
            owners.get_mut(pickup.entity)
        else {
            continue;
        };

        let stacks = inventory.add(pickup.kind);
        apply_pickup(
            pickup.kind,
            stacks,
            abilities.as_deref_mut(),
            tuning.as_deref_mut(),
            state.as_deref_mut(),
            anim.as_deref_mut(),
        );
        crate::logger::log(&format!(
            "🎁 {:?} picked up {} (x{})",
            pickup.entity,
            pickup.kind.name(),
            stacks
        ));
    }
}

/// Система: периодический update предметов (раз в секунду)
pub fn tick_item_updates(
    time: Res<Time>,
    mut owners: Query<(Entity, &mut Inventory), Without<Dead>>,
    mut heal_requests: EventWriter<HealRequest>,
) {
    let delta = time.delta_secs();

    for (entity, mut inventory) in owners.iter_mut() {
        if inventory.is_empty() {
            continue;
        }

        inventory.update_timer -= delta;
        while inventory.update_timer <= 0.0 {
            inventory.update_timer += ITEM_UPDATE_INTERVAL;

            let healing = inventory.stacks(ItemKind::Healing);
            if healing > 0 {
                heal_requests.write(HealRequest {
                    target: entity,
                    amount: healing_per_update(healing),
                });
            }
            if inventory.stacks(ItemKind::HealingArea) > 0 {
                inventory.healing_area_cooldown -= 1.0;
            }
        }
    }
}

/// Система: прыжок → heal zone (HealingArea, внутренний cooldown)
pub fn item_on_jump(
    mut commands: Commands,
    mut registry: ResMut<PoolRegistry>,
    time: Res<Time>,
    mut jumps: EventReader<Jumped>,
    mut owners: Query<(&mut Inventory, &Transform), Without<Dead>>,
) {
    let prototype = PrototypeId::new(prototypes::HEAL_ZONE);
    let now = time.elapsed_secs();

    for jump in jumps.read() {
        let Ok((mut inventory, transform)) = owners.get_mut(jump.entity) else {
            continue;
        };
        if inventory.stacks(ItemKind::HealingArea) == 0 || inventory.healing_area_cooldown > 0.0 {
            continue;
        }

        match registry.spawn(
            &mut commands,
            &prototype,
            Transform::from_translation(transform.translation),
        ) {
            Ok(zone) => {
                despawn_later(&mut commands, zone, now, HEAL_ZONE_LIFETIME);
                inventory.healing_area_cooldown = HEALING_AREA_COOLDOWN;
                crate::logger::log(&format!(
                    "💚 {:?} dropped heal zone {:?}",
                    jump.entity, zone
                ));
            }
            Err(err) => {
                crate::logger::log_warning(&format!("⚠️ Heal zone spawn failed: {}", err));
            }
        }
    }
}

/// Система: попадание способностью → on-hit предметы (Bleed)
pub fn item_on_hit(
    mut hits: EventReader<AbilityHit>,
    owners: Query<&Inventory>,
    mut statuses: EventWriter<ApplyStatus>,
) {
    for hit in hits.read() {
        let Ok(inventory) = owners.get(hit.attacker) else {
            continue;
        };

        let stacks = inventory.stacks(ItemKind::Bleed);
        if stacks == 0 {
            continue;
        }
        let (interval, duration) = bleed_parameters(stacks);
        statuses.write(ApplyStatus {
            target: hit.target,
            effect: StatusEffect::bleed(BLEED_DAMAGE_PER_TICK, interval, stacks, duration)
                .with_source(hit.attacker),
        });
    }
}
