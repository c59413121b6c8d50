//! AI attack execution (melee cone, projectile с упреждением).

use bevy::prelude::*;
use bevy_rapier3d::prelude::Velocity;

use crate::ai::{AiAttackStarted, AiAttacks, AiConfig, AttackKind, MeleeAttack, ProjectileAttack};
use crate::animation::{params, AnimParams};
use crate::combat::{DamageRequest, Dead};
use crate::math::lead_direction;
use crate::navigation::NavAgent;
use crate::pool::{prototypes, PoolRegistry, PrototypeId};
use crate::projectile::{spawn_projectile, Projectile, ProjectilePayload};
use crate::targeting::Faction;

/// Скорость цели для упреждения: rigid body → nav agent → неизвестна
pub fn target_velocity(velocity: Option<&Velocity>, nav: Option<&NavAgent>) -> Option<Vec3> {
    velocity
        .map(|v| v.linvel)
        .or_else(|| nav.map(|agent| agent.velocity))
}

/// Направление выстрела AI снарядом
pub fn projectile_aim(
    attack: &ProjectileAttack,
    muzzle: Vec3,
    target_position: Vec3,
    target_velocity: Option<Vec3>,
) -> Vec3 {
    let aim_point = target_position + Vec3::Y * attack.aim_height;
    match target_velocity {
        Some(velocity) if attack.use_leading => {
            lead_direction(muzzle, aim_point, velocity, attack.speed)
        }
        _ => (aim_point - muzzle).normalize_or_zero(),
    }
}

/// Melee попадает только по цели внутри range и конуса
pub fn melee_hits(melee: &MeleeAttack, agent: &Transform, target_position: Vec3) -> bool {
    agent.translation.distance(target_position) <= melee.range
        && melee.in_cone(agent, target_position)
}

/// Система: исполнение атак после windup
///
/// Cooldown атаки стартует на execute, даже если melee промахнулся.
#[allow(clippy::type_complexity)]
pub fn ai_execute_attacks(
    mut commands: Commands,
    mut registry: ResMut<PoolRegistry>,
    mut started: EventReader<AiAttackStarted>,
    mut agents: Query<
        (
            &Transform,
            &Faction,
            &AiConfig,
            &mut AiAttacks,
            Option<&mut AnimParams>,
        ),
        Without<Dead>,
    >,
    targets: Query<(&Transform, Option<&Velocity>, Option<&NavAgent>), Without<Dead>>,
    mut damage_events: EventWriter<DamageRequest>,
) {
    let prototype = PrototypeId::new(prototypes::AI_PROJECTILE);

    for event in started.read() {
        let Ok((transform, faction, config, mut attacks, mut anim)) = agents.get_mut(event.agent)
        else {
            continue;
        };
        let Some(attack) = attacks.0.get_mut(event.attack_index) else {
            continue;
        };
        let Ok((target_transform, velocity, nav)) = targets.get(event.target) else {
            continue;
        };
        let target_position = target_transform.translation;

        if let Some(anim) = anim.as_deref_mut() {
            anim.set_trigger(params::ATTACK);
        }

        match attack.kind {
            AttackKind::Melee(melee) => {
                if melee_hits(&melee, transform, target_position) {
                    damage_events.write(DamageRequest {
                        target: event.target,
                        source: Some(event.agent),
                        amount: melee.damage,
                        direct: true,
                    });
                    crate::logger::log(&format!(
                        "🗡️ {:?} melee hit {:?} ({:.1})",
                        event.agent, event.target, melee.damage
                    ));
                }
            }
            AttackKind::Projectile(projectile) => {
                let muzzle = transform.transform_point(projectile.muzzle_offset);
                let aim = projectile_aim(
                    &projectile,
                    muzzle,
                    target_position,
                    target_velocity(velocity, nav),
                );
                let direction = if aim == Vec3::ZERO {
                    transform.forward().as_vec3()
                } else {
                    aim
                };

                let spawned = spawn_projectile(
                    &mut commands,
                    &mut registry,
                    &prototype,
                    Projectile::new(
                        Some(event.agent),
                        *faction,
                        ProjectilePayload::Damage(projectile.damage),
                        muzzle,
                        direction * projectile.speed,
                        config.attack_range,
                    ),
                );
                match spawned {
                    Ok(entity) => crate::logger::log(&format!(
                        "🏹 {:?} fired projectile {:?} at {:?}",
                        event.agent, entity, event.target
                    )),
                    Err(err) => crate::logger::log_warning(&format!(
                        "⚠️ {:?} projectile attack failed: {}",
                        event.agent, err
                    )),
                }
            }
        }

        attack.trigger_cooldown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projectile_aim_direct_without_velocity() {
        let attack = ProjectileAttack::default();
        let aim = projectile_aim(&attack, Vec3::ZERO, Vec3::new(0.0, 0.0, -10.0), None);
        let expected = Vec3::new(0.0, 1.0, -10.0).normalize();
        assert!((aim - expected).length() < 1e-5);
    }

    #[test]
    fn test_projectile_aim_leads_moving_target() {
        let attack = ProjectileAttack::default();
        let aim = projectile_aim(
            &attack,
            Vec3::ZERO,
            Vec3::new(0.0, -1.0, -10.0),
            Some(Vec3::new(5.0, 0.0, 0.0)),
        );
        assert!(aim.x > 0.0);
        assert!((aim.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_target_velocity_prefers_rigid_body() {
        let velocity = Velocity::linear(Vec3::X);
        let nav = NavAgent {
            velocity: Vec3::Z,
            ..default()
        };
        assert_eq!(target_velocity(Some(&velocity), Some(&nav)), Some(Vec3::X));
        assert_eq!(target_velocity(None, Some(&nav)), Some(Vec3::Z));
        assert_eq!(target_velocity(None, None), None);
    }

    #[test]
    fn test_melee_hits_requires_range_and_cone() {
        let melee = MeleeAttack::default();
        let agent = Transform::IDENTITY;
        assert!(melee_hits(&melee, &agent, Vec3::new(0.0, 0.0, -1.5)));
        assert!(!melee_hits(&melee, &agent, Vec3::new(0.0, 0.0, -2.5)));
        assert!(!melee_hits(&melee, &agent, Vec3::new(0.0, 0.0, 1.5)));
    }
}
