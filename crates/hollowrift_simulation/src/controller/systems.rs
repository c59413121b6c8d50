//! Controller systems: ground probe → силы капсулы → реакция платформ

use bevy::prelude::*;
use bevy_rapier3d::prelude::{
    ExternalForce, ExternalImpulse, GravityScale, ReadMassProperties, Velocity,
};

use super::components::*;
use super::solver::*;
use crate::animation::{params, AnimParams};
use crate::combat::Dead;
use crate::logger;
use crate::math::{look_rotation, planar};
use crate::physics::collision::MASK_GROUND;
use crate::physics::{body_mass, HeadlessBody, PhysicsGravity, PhysicsQueries, PhysicsWorld};

/// Система: отложенный конец strafe
pub fn tick_strafe_timers(time: Res<Time>, mut states: Query<&mut ControllerState>) {
    let delta = time.delta_secs();
    for mut state in states.iter_mut() {
        if state.strafe_release_timer.is_some() {
            state.tick_strafe(delta);
        }
    }
}

/// Система: луч вниз от центра капсулы + скорость/yaw платформы
pub fn probe_ground(
    physics: PhysicsWorld,
    mut capsules: Query<(Entity, &FloatingCapsule, &Transform, &mut GroundProbe)>,
    bodies: Query<(Option<&Velocity>, &Transform)>,
) {
    for (entity, tuning, transform, mut probe) in capsules.iter_mut() {
        let hit = physics.cast_ray(
            transform.translation,
            Vec3::NEG_Y,
            tuning.ray_to_ground_length,
            MASK_GROUND,
            Some(entity),
        );

        let mut platform_velocity = Vec3::ZERO;
        let mut platform_yaw = 0.0;
        if let Some(platform) = hit.and_then(|h| h.entity) {
            if let Ok((velocity, platform_transform)) = bodies.get(platform) {
                platform_yaw = yaw_of(platform_transform.rotation);
                if let (Some(velocity), Some(hit)) = (velocity, hit) {
                    platform_velocity = velocity
                        .linear_velocity_at_point(hit.point, platform_transform.translation);
                }
            }
        }

        *probe = GroundProbe {
            hit,
            platform_velocity,
            platform_yaw,
        };
    }
}

/// Система: один шаг floating capsule
///
/// Пишет `ExternalForce` целиком (перезапись каждый tick), прыжок —
/// через `ExternalImpulse`. Полёт управляет скоростью напрямую.
#[allow(clippy::type_complexity)]
pub fn update_floating_capsules(
    time: Res<Time>,
    gravity: Res<PhysicsGravity>,
    mut capsules: Query<
        (
            Entity,
            &FloatingCapsule,
            &GroundProbe,
            &mut ControllerInput,
            &mut ControllerState,
            &mut Transform,
            &mut Velocity,
            &mut ExternalForce,
            &mut ExternalImpulse,
            &mut GravityScale,
            &HeadlessBody,
            Option<&ReadMassProperties>,
            Option<&mut AnimParams>,
        ),
        Without<Dead>,
    >,
    mut jumped: EventWriter<Jumped>,
    mut reactions: EventWriter<PlatformReaction>,
) {
    let delta = time.delta_secs();
    if delta <= 0.0 {
        return;
    }
    let gravity = gravity.0;

    for (
        entity,
        tuning,
        probe,
        mut input,
        mut state,
        mut transform,
        mut velocity,
        mut force,
        mut impulse,
        mut gravity_scale,
        body,
        read_mass,
        mut anim,
    ) in capsules.iter_mut()
    {
        let mass = body_mass(read_mass, Some(body));
        let hit = probe.hit;
        let grounded = check_grounded(hit.map(|h| h.distance), tuning.ride_height);
        update_grounding(&mut state, grounded, tuning.max_extra_jumps, delta);

        if input.jump_pressed {
            input.jump_pressed = false;
            state.time_since_jump_pressed = 0.0;
        }

        let move_input = if state.movement_enabled {
            world_move_input(input.move_axis, input.camera_forward)
        } else {
            Vec3::ZERO
        };

        // Flight: без гравитации и пружин, скорость напрямую
        if state.is_flying {
            if gravity_scale.0 != 0.0 {
                gravity_scale.0 = 0.0;
            }

            let vertical = if input.jump_held { 1.0 } else { 0.0 };
            let camera_forward = if input.camera_forward == Vec3::ZERO {
                Vec3::NEG_Z
            } else {
                input.camera_forward
            };
            let axis = if state.movement_enabled {
                input.move_axis.clamp_length_max(1.0)
            } else {
                Vec2::ZERO
            };
            velocity.linvel = flight_velocity(
                velocity.linvel,
                axis,
                vertical,
                camera_forward,
                state.current_max_speed(tuning) * state.speed_factor,
                tuning.flight_acceleration,
                delta,
            );

            let target = flight_lean_rotation(velocity.linvel, tuning.flight_lean_angle)
                .or_else(|| look_rotation(planar(camera_forward), Vec3::Y))
                .unwrap_or(state.upright_target);
            let t = (tuning.flight_lean_smooth * delta).clamp(0.0, 1.0);
            transform.rotation = transform.rotation.slerp(target, t);
            velocity.angvel = Vec3::ZERO;

            *force = ExternalForce::default();
            state.previous_velocity = velocity.linvel;
            write_anim_params(tuning, &mut state, &transform, velocity.linvel, anim.as_deref_mut(), delta);
            continue;
        }

        if gravity_scale.0 != 1.0 {
            gravity_scale.0 = 1.0;
        }

        let mut total = ExternalForce::default();

        // Ride height spring
        if let Some(hit) = hit {
            if state.should_maintain_height {
                let spring = height_spring(
                    hit.distance,
                    tuning.ride_height,
                    velocity.linvel,
                    probe.platform_velocity,
                    tuning.ride_spring_strength,
                    tuning.ride_spring_damper,
                );
                total.force += maintain_height_force(spring, gravity, mass);

                if let Some(platform) = hit.entity {
                    reactions.write(PlatformReaction {
                        platform,
                        force: Vec3::NEG_Y * -spring,
                        point: hit.point,
                    });
                }
            }
        }

        // Upright torque (цель с учётом поворота платформы)
        let look = look_direction(
            tuning.look_direction,
            velocity.linvel,
            state.previous_velocity,
            move_input,
            delta,
            state.is_strafing,
            input.camera_forward,
        );
        let platform_yaw = if hit.and_then(|h| h.entity).is_some() {
            probe.platform_yaw
        } else {
            state.platform_init_yaw
        };
        update_target_rotation(&mut state, look, platform_yaw);
        total.torque += upright_torque(
            transform.rotation,
            state.upright_target,
            velocity.angvel,
            tuning.upright_spring_strength,
            tuning.upright_spring_damper,
        );

        // Movement (blink блокирует)
        if state.movement_enabled {
            let max_speed = state.current_max_speed(tuning);
            let step = move_step(
                tuning,
                state.goal_velocity,
                move_input,
                velocity.linvel,
                mass,
                max_speed,
                state.speed_factor,
                state.max_accel_force_factor,
                delta,
            );
            state.goal_velocity = step.goal_velocity;

            let point = lean_point(transform.translation, transform.scale.y, tuning.lean_factor);
            total += ExternalForce::at_point(step.force, point, transform.translation);
        } else {
            state.goal_velocity = planar(velocity.linvel);
        }

        // Jump state machine
        let step = jump_step(
            tuning,
            &mut state,
            grounded,
            velocity.linvel.y,
            input.jump_held,
            delta,
        );
        total.force += gravity * mass * step.extra_gravity_factor;

        if step.jumped {
            velocity.linvel.y = 0.0;
            if !step.air_jump {
                if let Some(hit) = hit {
                    transform.translation.y -= hit.distance - tuning.ride_height;
                }
            }
            *impulse += ExternalImpulse {
                impulse: Vec3::Y * tuning.jump_force,
                torque_impulse: Vec3::ZERO,
            };

            if let Some(anim) = anim.as_deref_mut() {
                anim.set_trigger(params::JUMP_REQUESTED);
            }
            jumped.write(Jumped {
                entity,
                air_jump: step.air_jump,
            });
            logger::log(&format!(
                "🦘 {:?} jumped{}",
                entity,
                if step.air_jump { " (air)" } else { "" }
            ));
        }

        *force = total;
        state.previous_velocity = velocity.linvel;
        write_anim_params(tuning, &mut state, &transform, velocity.linvel, anim.as_deref_mut(), delta);
    }
}

fn write_anim_params(
    tuning: &FloatingCapsule,
    state: &mut ControllerState,
    transform: &Transform,
    velocity: Vec3,
    anim: Option<&mut AnimParams>,
    delta: f32,
) {
    // Скорость в локальных осях персонажа (forward = −Z)
    let local = transform.rotation.inverse() * velocity;
    state.anim_forward_speed = smooth_towards(
        state.anim_forward_speed,
        -local.z,
        tuning.anim_speed_smooth_time,
        delta,
    );
    state.anim_side_speed = smooth_towards(
        state.anim_side_speed,
        local.x,
        tuning.anim_speed_smooth_time,
        delta,
    );

    let Some(anim) = anim else {
        return;
    };
    anim.set_float(params::FORWARD_SPEED, state.anim_forward_speed);
    anim.set_float(params::SIDE_SPEED, state.anim_side_speed);
    anim.set_bool(params::IS_GROUNDED, state.is_grounded);
    anim.set_bool(params::IS_STRAFING, state.is_strafing);
    anim.set_bool(params::IS_FLYING, state.is_flying);
}

/// Система: равная и противоположная сила пружины на тело под персонажем
///
/// Тела без `ExternalImpulse` (статика, FlatGround) реакцию игнорируют.
pub fn apply_platform_reactions(
    time: Res<Time>,
    mut reactions: EventReader<PlatformReaction>,
    mut bodies: Query<(&Transform, &mut ExternalImpulse), Without<FloatingCapsule>>,
) {
    let delta = time.delta_secs();
    for reaction in reactions.read() {
        let Ok((transform, mut impulse)) = bodies.get_mut(reaction.platform) else {
            continue;
        };
        *impulse += ExternalImpulse::at_point(
            reaction.force * delta,
            reaction.point,
            transform.translation,
        );
    }
}

/// Forms/items меняют тюнинг через state; extra jumps — через тюнинг
pub fn set_extra_jumps(tuning: &mut FloatingCapsule, state: &mut ControllerState, extra_jumps: u32) {
    tuning.max_extra_jumps = extra_jumps;
    state.remaining_extra_jumps = state.remaining_extra_jumps.min(extra_jumps);
}
