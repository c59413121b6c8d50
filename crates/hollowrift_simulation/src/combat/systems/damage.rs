//! Damage, heal and death systems.

use bevy::prelude::*;

use crate::animation::{params, AnimParams};
use crate::combat::{
    calculate_damage, DamageDealt, DamageRequest, Dead, EntityDied, HealRequest, Healed,
};
use crate::components::{Armor, DeathBehavior, Health};
use crate::pool::{despawn_later, PoolRegistry};

/// Система: DamageRequest → Health
///
/// 1. Применяем броню цели
/// 2. Вычитаем из Health
/// 3. DamageDealt на каждый запрос, EntityDied только на переходе alive → dead
///
/// Несколько смертельных запросов за tick: второй видит current = 0 (was_alive = false),
/// поэтому EntityDied уходит ровно один раз.
pub fn apply_damage_requests(
    mut commands: Commands,
    mut requests: EventReader<DamageRequest>,
    mut targets: Query<(&mut Health, Option<&Armor>, Option<&mut AnimParams>), Without<Dead>>,
    mut damage_dealt_events: EventWriter<DamageDealt>,
    mut entity_died_events: EventWriter<EntityDied>,
) {
    for request in requests.read() {
        let Ok((mut health, armor, anim)) = targets.get_mut(request.target) else {
            continue;
        };

        let final_damage = calculate_damage(request.amount, armor.map_or(0.0, |a| a.0));

        let was_alive = health.is_alive();
        health.take_damage(final_damage);
        let is_alive = health.is_alive();
        let died = was_alive && !is_alive;

        damage_dealt_events.write(DamageDealt {
            attacker: request.source,
            target: request.target,
            damage: final_damage,
            direct: request.direct,
            target_died: died,
        });

        if let Some(mut anim) = anim {
            anim.set_trigger(if died { params::DIE } else { params::HIT });
        }

        if died {
            entity_died_events.write(EntityDied {
                entity: request.target,
                killer: request.source,
            });
            commands.entity(request.target).try_insert(Dead);

            crate::logger::log_info(&format!(
                "💀 Entity {:?} killed by {:?}",
                request.target, request.source
            ));
        }
    }
}

/// Система: HealRequest → Health (clamp к max)
pub fn apply_heal_requests(
    mut requests: EventReader<HealRequest>,
    mut targets: Query<&mut Health, Without<Dead>>,
    mut healed_events: EventWriter<Healed>,
) {
    for request in requests.read() {
        let Ok(mut health) = targets.get_mut(request.target) else {
            continue;
        };
        if health.is_full() {
            continue;
        }

        let restored = health.heal(request.amount);
        if restored > 0.0 {
            healed_events.write(Healed {
                target: request.target,
                amount: restored,
            });
        }
    }
}

/// Система: death hook (DeathBehavior)
///
/// Despawn → отложенный возврат в pool (или удаление не-pooled entity).
/// Persist → тело остаётся (игрок).
pub fn handle_deaths(
    mut commands: Commands,
    mut death_events: EventReader<EntityDied>,
    behaviors: Query<&DeathBehavior>,
    mut registry: ResMut<PoolRegistry>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs();

    for event in death_events.read() {
        let behavior = behaviors.get(event.entity).copied().unwrap_or_default();
        match behavior {
            DeathBehavior::Despawn { delay } if delay <= 0.0 => {
                registry.despawn(&mut commands, event.entity);
            }
            DeathBehavior::Despawn { delay } => {
                despawn_later(&mut commands, event.entity, now, delay);
            }
            DeathBehavior::Persist => {
                crate::logger::log(&format!("🪦 Entity {:?} persists after death", event.entity));
            }
        }
    }
}
