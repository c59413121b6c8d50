//! Floating capsule solver — чистые функции одного fixed шага
//!
//! Никакого ECS: на вход тюнинг, state и снимок тела, на выход силы/импульсы.
//! Системы в `controller::systems` только собирают входы и применяют результат.

use bevy::prelude::*;

use super::components::{ControllerState, FloatingCapsule, LookDirectionMode};
use crate::math::{angle_axis, look_rotation, move_towards, planar, shortest_rotation};

/// Grounded-допуск: пружина колеблется около ride height
pub const GROUNDED_HEIGHT_TOLERANCE: f32 = 1.3;

/// После прыжка is_jumping не сбрасывается раньше этого времени
pub const JUMP_GROUND_RESET_DELAY: f32 = 0.2;

/// Grounded ⇔ луч попал и distance ≤ ride_height × 1.3
pub fn check_grounded(hit_distance: Option<f32>, ride_height: f32) -> bool {
    hit_distance.is_some_and(|distance| distance <= ride_height * GROUNDED_HEIGHT_TOLERANCE)
}

/// Скаляр пружины высоты вдоль луча вниз
///
/// x = distance − ride_height, rel = down·v − down·v_other,
/// spring = x·k − rel·c.
pub fn height_spring(
    distance: f32,
    ride_height: f32,
    velocity: Vec3,
    other_velocity: Vec3,
    strength: f32,
    damper: f32,
) -> f32 {
    let down = Vec3::NEG_Y;
    let relative = down.dot(velocity) - down.dot(other_velocity);
    let offset = distance - ride_height;
    offset * strength - relative * damper
}

/// Сила удержания высоты: −gravity·mass + spring·down
pub fn maintain_height_force(spring: f32, gravity: Vec3, mass: f32) -> Vec3 {
    -gravity * mass + spring * Vec3::NEG_Y
}

/// Torsion-spring к целевому повороту: axis·radians·k − ω·c
pub fn upright_torque(
    current: Quat,
    target: Quat,
    angular_velocity: Vec3,
    strength: f32,
    damper: f32,
) -> Vec3 {
    let to_goal = shortest_rotation(target, current);
    let (radians, axis) = angle_axis(to_goal);
    axis * (radians * strength) - angular_velocity * damper
}

/// Направление взгляда по режиму; strafe → forward камеры
pub fn look_direction(
    mode: LookDirectionMode,
    velocity: Vec3,
    previous_velocity: Vec3,
    move_input: Vec3,
    delta: f32,
    strafing: bool,
    camera_forward: Vec3,
) -> Vec3 {
    if strafing {
        let forward = planar(camera_forward);
        if forward.length_squared() < 0.0001 {
            return Vec3::NEG_Z;
        }
        return forward.normalize();
    }

    match mode {
        LookDirectionMode::Velocity => planar(velocity),
        LookDirectionMode::Acceleration => {
            if delta <= 0.0 {
                return Vec3::ZERO;
            }
            (planar(velocity) - planar(previous_velocity)) / delta
        }
        LookDirectionMode::MoveInput => move_input,
    }
}

/// Целевой поворот с учётом вращения платформы
///
/// Ненулевое направление → новая цель, запоминаем yaw цели и yaw платформы.
/// Нулевое → последняя цель + поворот платформы с момента её установки.
pub fn update_target_rotation(state: &mut ControllerState, look: Vec3, platform_yaw: f32) {
    if let Some(rotation) = look_rotation(look, Vec3::Y) {
        state.upright_target = rotation;
        state.last_target_yaw = yaw_of(rotation);
        state.platform_init_yaw = platform_yaw;
    } else {
        let yaw = state.last_target_yaw + (platform_yaw - state.platform_init_yaw);
        state.upright_target = Quat::from_rotation_y(yaw);
    }
}

pub fn yaw_of(rotation: Quat) -> f32 {
    rotation.to_euler(EulerRot::YXZ).0
}

/// Input движения в мировых осях (длина ≤ 1)
///
/// `camera_forward` = ZERO → x вправо (+X), y вперёд (−Z).
pub fn world_move_input(axis: Vec2, camera_forward: Vec3) -> Vec3 {
    let axis = axis.clamp_length_max(1.0);
    let forward = planar(camera_forward).try_normalize().unwrap_or(Vec3::NEG_Z);
    let right = forward.cross(Vec3::Y);
    right * axis.x + forward * axis.y
}

/// Результат шага движения
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveStep {
    pub goal_velocity: Vec3,
    /// Уже умножена на массу и move_force_scale
    pub force: Vec3,
}

/// Движение: goal velocity → нужное ускорение → сила (с клампом по кривым)
#[allow(clippy::too_many_arguments)]
pub fn move_step(
    tuning: &FloatingCapsule,
    goal_velocity: Vec3,
    move_input: Vec3,
    velocity: Vec3,
    mass: f32,
    max_speed: f32,
    speed_factor: f32,
    max_accel_force_factor: f32,
    delta: f32,
) -> MoveStep {
    if delta <= 0.0 {
        return MoveStep {
            goal_velocity,
            force: Vec3::ZERO,
        };
    }

    let unit_goal = move_input;
    let unit_velocity = goal_velocity.normalize_or_zero();
    let vel_dot = unit_goal.dot(unit_velocity);

    let accel = tuning.acceleration * tuning.accel_curve.evaluate(vel_dot);
    let target = unit_goal * max_speed * speed_factor;
    let goal_velocity = move_towards(goal_velocity, target, accel * delta);

    let needed = (goal_velocity - velocity) / delta;
    let max_accel =
        tuning.max_accel_force * tuning.max_accel_curve.evaluate(vel_dot) * max_accel_force_factor;
    let needed = needed.clamp_length_max(max_accel.max(0.0));

    MoveStep {
        goal_velocity,
        force: needed * mass * tuning.move_force_scale,
    }
}

/// Точка приложения силы движения (выше центра → наклон в сторону движения)
pub fn lean_point(position: Vec3, height: f32, lean_factor: f32) -> Vec3 {
    position + Vec3::Y * (height * lean_factor)
}

/// Результат шага прыжка
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct JumpStep {
    /// Множитель гравитации для дополнительной силы (gravity·mass·k)
    pub extra_gravity_factor: f32,
    pub jumped: bool,
    pub air_jump: bool,
}

/// Grounded-бухгалтерия шага (до move/jump)
pub fn update_grounding(
    state: &mut ControllerState,
    grounded: bool,
    max_extra_jumps: u32,
    delta: f32,
) {
    state.is_grounded = grounded;
    if grounded {
        state.time_since_ungrounded = 0.0;
        state.remaining_extra_jumps = max_extra_jumps;
        if state.time_since_jump > JUMP_GROUND_RESET_DELAY {
            state.is_jumping = false;
        }
    } else {
        state.time_since_ungrounded += delta;
    }
}

/// Jump state machine: таймеры, доп. гравитация, buffer + coyote + extra jumps
///
/// Ground jump приоритетнее air jump: в окне coyote extra jump не тратится.
pub fn jump_step(
    tuning: &FloatingCapsule,
    state: &mut ControllerState,
    grounded: bool,
    vertical_velocity: f32,
    jump_held: bool,
    delta: f32,
) -> JumpStep {
    let mut step = JumpStep::default();

    state.time_since_jump_pressed += delta;
    state.time_since_jump += delta;

    if vertical_velocity < 0.0 {
        state.should_maintain_height = true;
        state.jump_ready = true;
        if !grounded {
            step.extra_gravity_factor += tuning.fall_gravity_factor - 1.0;
        }
    } else if vertical_velocity > 0.0 && !grounded {
        if state.is_jumping {
            step.extra_gravity_factor += tuning.rise_gravity_factor - 1.0;
        }
        if !jump_held {
            step.extra_gravity_factor += tuning.low_jump_factor - 1.0;
        }
    }

    if state.time_since_jump_pressed < tuning.jump_buffer {
        let can_ground_jump = state.time_since_ungrounded < tuning.coyote_time;
        let can_air_jump = !grounded && state.remaining_extra_jumps > 0;

        if (can_ground_jump || can_air_jump) && state.jump_ready {
            state.jump_ready = false;
            state.should_maintain_height = false;
            state.is_jumping = true;

            if !can_ground_jump {
                state.remaining_extra_jumps -= 1;
                step.air_jump = true;
            }

            state.time_since_jump_pressed = tuning.jump_buffer;
            state.time_since_jump = 0.0;
            step.jumped = true;
        }
    }

    step
}

/// Flight: скорость к желаемой (camera-relative, вертикаль с кнопки прыжка)
pub fn flight_velocity(
    current: Vec3,
    move_axis: Vec2,
    vertical: f32,
    camera_forward: Vec3,
    max_speed: f32,
    acceleration: f32,
    delta: f32,
) -> Vec3 {
    let forward = camera_forward.try_normalize().unwrap_or(Vec3::NEG_Z);
    let right = forward.cross(Vec3::Y).try_normalize().unwrap_or(Vec3::X);

    let horizontal = forward * move_axis.y + right * move_axis.x;
    let wish = horizontal + Vec3::Y * vertical;
    let desired = wish.normalize_or_zero() * max_speed * wish.length().clamp(0.0, 1.0);

    move_towards(current, desired, acceleration * delta)
}

/// Flight: целевой поворот с креном в сторону горизонтальной скорости
///
/// None — почти нет горизонтальной скорости (держим вертикаль по камере).
pub fn flight_lean_rotation(velocity: Vec3, lean_angle_degrees: f32) -> Option<Quat> {
    let flat = planar(velocity);
    if flat.length_squared() <= 0.01 {
        return None;
    }
    let direction = flat.normalize();
    let lean_axis = Vec3::Y.cross(direction);
    let lean = Quat::from_axis_angle(lean_axis, lean_angle_degrees.to_radians());
    Some(lean * look_rotation(direction, Vec3::Y)?)
}

/// Экспоненциальное сглаживание к target (для анимационных скоростей)
pub fn smooth_towards(current: f32, target: f32, smooth_time: f32, delta: f32) -> f32 {
    if smooth_time <= 0.0 {
        return target;
    }
    let t = 1.0 - (-delta / smooth_time).exp();
    current + (target - current) * t
}
