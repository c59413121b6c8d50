//! FSM AI systems (stun, state transitions, windup facing).

use bevy::prelude::*;

use crate::ai::{AiAgent, AiAttackStarted, AiAttacks, AiConfig, AiState, AiStateChanged, StunRequest};
use crate::animation::{params, AnimParams};
use crate::combat::Dead;
use crate::math::{look_rotation, planar};
use crate::navigation::NavAgent;
use crate::physics::collision::MASK_LOS_BLOCK;
use crate::physics::{PhysicsQueries, PhysicsWorld};
use crate::targeting::{lookup_candidate, Faction, TargetRegistry, Targetable};

/// LOS целится в точку над origin цели
pub const LOS_TARGET_HEIGHT: f32 = 1.0;

/// Line of sight: луч origin → target + 1m вверх
///
/// Почти совпадающие точки — видим; дальше `max_distance` — не видим;
/// любое попадание по блокирующей геометрии — не видим.
pub fn has_line_of_sight(
    physics: &impl PhysicsQueries,
    origin: Vec3,
    target_position: Vec3,
    max_distance: f32,
    exclude: Option<Entity>,
) -> bool {
    let direction = target_position + Vec3::Y * LOS_TARGET_HEIGHT - origin;
    if direction.length_squared() < 0.01 {
        return true;
    }

    let distance = direction.length();
    if distance > max_distance {
        return false;
    }

    physics
        .cast_ray(origin, direction, distance, MASK_LOS_BLOCK, exclude)
        .is_none()
}

fn transition(
    entity: Entity,
    agent: &mut AiAgent,
    to: AiState,
    changed: &mut EventWriter<AiStateChanged>,
) {
    if agent.state == to {
        return;
    }
    let from = agent.state;
    agent.state = to;
    changed.write(AiStateChanged { entity, from, to });
}

fn stop_moving(nav: &mut NavAgent, anim: Option<&mut AnimParams>) {
    nav.stop();
    if let Some(anim) = anim {
        anim.set_bool(params::MOVING, false);
    }
}

/// Система: StunRequest → Stunned (из любого состояния)
pub fn ai_apply_stun_requests(
    mut requests: EventReader<StunRequest>,
    mut agents: Query<(&mut AiAgent, &mut NavAgent, Option<&mut AnimParams>), Without<Dead>>,
    mut changed: EventWriter<AiStateChanged>,
) {
    for request in requests.read() {
        let Ok((mut agent, mut nav, mut anim)) = agents.get_mut(request.entity) else {
            continue;
        };

        let from = agent.state;
        agent.apply_stun(request.duration);
        stop_moving(&mut nav, anim.as_deref_mut());
        if let Some(anim) = anim.as_deref_mut() {
            anim.set_trigger(params::STUNNED);
        }

        if from != AiState::Stunned {
            changed.write(AiStateChanged {
                entity: request.entity,
                from,
                to: AiState::Stunned,
            });
        }
        crate::logger::log(&format!(
            "💫 {:?} stunned for {:.2}s (was {:?})",
            request.entity, request.duration, from
        ));
    }
}

/// Система: AI FSM tick
///
/// Порядок:
/// 1. cooldown'ы атак (всегда)
/// 2. Stunned — только таймер, по истечении → Chase
/// 3. refresh цели по интервалу (или когда цели нет)
/// 4. нет цели → стоим
/// 5. Windup — таймер, на завершении re-check range+LOS → Attack → Chase
/// 6. дальше chase_range → стоим
/// 7. в attack_range + LOS + готовая атака → Windup
/// 8. иначе Chase (destination = цель)
#[allow(clippy::type_complexity)]
pub fn ai_fsm_update(
    time: Res<Time>,
    mut registry: ResMut<TargetRegistry>,
    physics: PhysicsWorld,
    targets: Query<(&Targetable, &Transform), Without<Dead>>,
    mut agents: Query<
        (
            Entity,
            &Transform,
            &Faction,
            &AiConfig,
            &mut AiAgent,
            &mut AiAttacks,
            &mut NavAgent,
            Option<&mut AnimParams>,
        ),
        Without<Dead>,
    >,
    mut changed: EventWriter<AiStateChanged>,
    mut attack_started: EventWriter<AiAttackStarted>,
) {
    let delta = time.delta_secs();

    for (entity, transform, faction, config, mut agent, mut attacks, mut nav, mut anim) in
        agents.iter_mut()
    {
        attacks.tick(delta);

        if agent.state == AiState::Stunned {
            agent.stun_timer -= delta;
            if agent.stun_timer <= 0.0 {
                agent.stun_timer = 0.0;
                transition(entity, &mut agent, AiState::Chase, &mut changed);
                crate::logger::log(&format!("💫 {:?} recovered from stun", entity));
            }
            continue;
        }

        let position = transform.translation;

        // Refresh цели (слабая ссылка может протухнуть между refresh'ами)
        agent.target_refresh_timer -= delta;
        let current = agent.target.filter(|target| targets.contains(*target));
        if agent.target_refresh_timer <= 0.0 || current.is_none() {
            agent.target_refresh_timer = config.target_refresh_interval;
            let best = registry.best_target(
                position,
                *faction,
                config.target_search_range,
                |candidate| lookup_candidate(&targets, candidate),
            );
            let next = best.or(current);
            if next.is_some() && next != agent.target {
                crate::logger::log(&format!("🎯 {:?} acquired target {:?}", entity, next));
            }
            agent.target = next;
        } else {
            agent.target = current;
        }

        let target = agent
            .target
            .and_then(|target| targets.get(target).ok().map(|(_, t)| (target, t.translation)));
        let Some((target, target_position)) = target else {
            stop_moving(&mut nav, anim.as_deref_mut());
            if agent.state == AiState::Windup {
                agent.face_point = None;
                transition(entity, &mut agent, AiState::Chase, &mut changed);
            }
            continue;
        };

        let distance = position.distance(target_position);
        let los_origin = position + Vec3::Y * config.los_origin_height;

        if agent.state == AiState::Windup {
            agent.face_point = Some(target_position);
            agent.windup_timer -= delta;
            if agent.windup_timer > 0.0 {
                continue;
            }

            agent.face_point = None;
            let still_valid = distance <= config.attack_range
                && has_line_of_sight(
                    &physics,
                    los_origin,
                    target_position,
                    config.los_max_distance,
                    Some(entity),
                );
            if still_valid {
                transition(entity, &mut agent, AiState::Attack, &mut changed);
                if let Some(attack_index) = attacks.first_ready(Some(distance)) {
                    attack_started.write(AiAttackStarted {
                        agent: entity,
                        target,
                        attack_index,
                    });
                }
            }
            transition(entity, &mut agent, AiState::Chase, &mut changed);
            continue;
        }

        if distance > config.chase_range {
            stop_moving(&mut nav, anim.as_deref_mut());
            continue;
        }

        let can_start_windup = distance <= config.attack_range
            && attacks.any_ready(Some(distance))
            && has_line_of_sight(
                &physics,
                los_origin,
                target_position,
                config.los_max_distance,
                Some(entity),
            );
        if can_start_windup {
            transition(entity, &mut agent, AiState::Windup, &mut changed);
            agent.begin_windup(config.windup_time);
            agent.face_point = Some(target_position);
            stop_moving(&mut nav, anim.as_deref_mut());
            if let Some(anim) = anim.as_deref_mut() {
                anim.set_trigger(params::WINDUP);
            }
            continue;
        }

        transition(entity, &mut agent, AiState::Chase, &mut changed);
        nav.set_destination(target_position);
        if let Some(anim) = anim.as_deref_mut() {
            anim.set_bool(params::MOVING, nav.velocity.length_squared() > 0.1);
        }
    }
}

/// Система: поворот к цели во время windup (slerp по face_target_speed)
pub fn ai_face_targets(
    time: Res<Time>,
    mut agents: Query<(&AiAgent, &AiConfig, &mut Transform), Without<Dead>>,
) {
    let delta = time.delta_secs();

    for (agent, config, mut transform) in agents.iter_mut() {
        if agent.state != AiState::Windup {
            continue;
        }
        let Some(point) = agent.face_point else {
            continue;
        };

        let direction = planar(point - transform.translation);
        if direction.length_squared() < 0.0001 {
            continue;
        }
        let Some(rotation) = look_rotation(direction, Vec3::Y) else {
            continue;
        };
        let t = (delta * config.face_target_speed).clamp(0.0, 1.0);
        transform.rotation = transform.rotation.slerp(rotation, t);
    }
}
