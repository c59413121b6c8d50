//! Controller компоненты: тюнинг, input, runtime state

use bevy::prelude::*;
use bevy_rapier3d::prelude::{ExternalForce, ExternalImpulse, GravityScale, Velocity};
use serde::{Deserialize, Serialize};

use crate::math::ResponseCurve;
use crate::physics::{HeadlessBody, RayHit};

/// Откуда брать направление взгляда персонажа
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
pub enum LookDirectionMode {
    #[default]
    Velocity,
    Acceleration,
    MoveInput,
}

/// Floating capsule: тюнинг пружин, движения, прыжка и полёта
///
/// Капсула "парит" над землёй на пружине (ride height), вертикаль держит
/// torsion-spring. Вся логика — силы и импульсы на rigid body.
#[derive(Component, Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
#[serde(default)]
#[require(
    ControllerInput,
    ControllerState,
    GroundProbe,
    Velocity,
    ExternalForce,
    ExternalImpulse,
    GravityScale,
    HeadlessBody
)]
pub struct FloatingCapsule {
    // Height spring
    pub ride_height: f32,
    pub ray_to_ground_length: f32,
    pub ride_spring_strength: f32,
    pub ride_spring_damper: f32,

    // Upright spring
    pub look_direction: LookDirectionMode,
    pub upright_spring_strength: f32,
    pub upright_spring_damper: f32,

    // Movement
    pub base_max_speed: f32,
    pub acceleration: f32,
    pub max_accel_force: f32,
    pub lean_factor: f32,
    pub accel_curve: ResponseCurve,
    pub max_accel_curve: ResponseCurve,
    pub move_force_scale: Vec3,

    // Jump
    pub jump_force: f32,
    /// < 1 — облегчённая гравитация на подъёме
    pub rise_gravity_factor: f32,
    pub fall_gravity_factor: f32,
    pub low_jump_factor: f32,
    pub jump_buffer: f32,
    pub coyote_time: f32,
    pub max_extra_jumps: u32,

    // Flight
    pub flight_acceleration: f32,
    /// Градусы
    pub flight_lean_angle: f32,
    pub flight_lean_smooth: f32,

    /// Сглаживание ForwardSpeed/SideSpeed для анимации (сек)
    pub anim_speed_smooth_time: f32,
}

impl Default for FloatingCapsule {
    fn default() -> Self {
        Self {
            ride_height: 1.75,
            ray_to_ground_length: 3.0,
            ride_spring_strength: 50.0,
            ride_spring_damper: 5.0,

            look_direction: LookDirectionMode::Velocity,
            upright_spring_strength: 40.0,
            upright_spring_damper: 5.0,

            base_max_speed: 8.0,
            acceleration: 200.0,
            max_accel_force: 150.0,
            lean_factor: 0.25,
            accel_curve: ResponseCurve::default(),
            max_accel_curve: ResponseCurve::default(),
            move_force_scale: Vec3::new(1.0, 0.0, 1.0),

            jump_force: 10.0,
            rise_gravity_factor: 0.5,
            fall_gravity_factor: 10.0,
            low_jump_factor: 2.5,
            jump_buffer: 0.15,
            coyote_time: 0.25,
            max_extra_jumps: 0,

            flight_acceleration: 25.0,
            flight_lean_angle: 20.0,
            flight_lean_smooth: 6.0,

            anim_speed_smooth_time: 0.08,
        }
    }
}

/// Input контроллера (пишет player input / тесты)
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct ControllerInput {
    /// x — вправо, y — вперёд; длина ≤ 1
    pub move_axis: Vec2,
    /// Кнопка прыжка зажата (low jump, вертикаль полёта)
    pub jump_held: bool,
    /// Нажатие прыжка (edge); контроллер сбрасывает после обработки
    pub jump_pressed: bool,
    /// Горизонтальный forward камеры; ZERO — input в мировых осях
    pub camera_forward: Vec3,
}

impl Default for ControllerInput {
    fn default() -> Self {
        Self {
            move_axis: Vec2::ZERO,
            jump_held: false,
            jump_pressed: false,
            camera_forward: Vec3::ZERO,
        }
    }
}

impl ControllerInput {
    pub fn press_jump(&mut self) {
        self.jump_pressed = true;
        self.jump_held = true;
    }

    pub fn release_jump(&mut self) {
        self.jump_held = false;
    }
}

/// Runtime state контроллера
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct ControllerState {
    pub goal_velocity: Vec3,
    pub previous_velocity: Vec3,
    /// Множитель формы (CharacterForm.move_speed_multiplier)
    pub speed_factor: f32,
    /// Бонус от предметов (MovementSpeed)
    pub speed_bonus: f32,
    pub max_accel_force_factor: f32,

    pub is_grounded: bool,
    pub should_maintain_height: bool,
    pub time_since_jump_pressed: f32,
    pub time_since_ungrounded: f32,
    pub time_since_jump: f32,
    pub jump_ready: bool,
    pub is_jumping: bool,
    pub remaining_extra_jumps: u32,

    pub upright_target: Quat,
    pub last_target_yaw: f32,
    pub platform_init_yaw: f32,
    pub platform: Option<Entity>,

    pub is_flying: bool,
    pub is_strafing: bool,
    /// Таймер отложенного конца strafe (None — не запланирован)
    pub strafe_release_timer: Option<f32>,
    /// false — input движения игнорируется (blink)
    pub movement_enabled: bool,

    pub anim_forward_speed: f32,
    pub anim_side_speed: f32,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            goal_velocity: Vec3::ZERO,
            previous_velocity: Vec3::ZERO,
            speed_factor: 1.0,
            speed_bonus: 0.0,
            max_accel_force_factor: 1.0,

            is_grounded: false,
            should_maintain_height: true,
            // Без auto-jump на первом tick'е
            time_since_jump_pressed: f32::MAX,
            time_since_ungrounded: 0.0,
            time_since_jump: 0.0,
            jump_ready: true,
            is_jumping: false,
            remaining_extra_jumps: 0,

            upright_target: Quat::IDENTITY,
            last_target_yaw: 0.0,
            platform_init_yaw: 0.0,
            platform: None,

            is_flying: false,
            is_strafing: false,
            strafe_release_timer: None,
            movement_enabled: true,

            anim_forward_speed: 0.0,
            anim_side_speed: 0.0,
        }
    }
}

impl ControllerState {
    pub fn current_max_speed(&self, tuning: &FloatingCapsule) -> f32 {
        tuning.base_max_speed + self.speed_bonus
    }

    /// Включить strafe сразу; отменяет отложенный конец
    pub fn set_strafing(&mut self, value: bool) {
        self.is_strafing = value;
        if value {
            self.strafe_release_timer = None;
        }
    }

    /// Запланировать конец strafe через `delay` секунд (перезапускает таймер)
    pub fn end_strafing_after(&mut self, delay: f32) {
        self.strafe_release_timer = Some(delay.max(0.0));
    }

    /// Продвигает таймер конца strafe
    pub fn tick_strafe(&mut self, delta: f32) {
        if let Some(timer) = self.strafe_release_timer.as_mut() {
            *timer -= delta;
            if *timer <= 0.0 {
                self.is_strafing = false;
                self.strafe_release_timer = None;
            }
        }
    }

    pub fn set_movement_enabled(&mut self, enabled: bool) {
        self.movement_enabled = enabled;
    }

    pub fn enable_flight(&mut self, value: bool) {
        self.is_flying = value;
    }
}

/// Результат ground probe текущего tick'а (пишет `probe_ground`)
#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct GroundProbe {
    pub hit: Option<RayHit>,
    /// Скорость тела под персонажем в точке контакта
    pub platform_velocity: Vec3,
    /// Yaw тела под персонажем (0 без платформы)
    pub platform_yaw: f32,
}

/// Event: персонаж прыгнул
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct Jumped {
    pub entity: Entity,
    pub air_jump: bool,
}

/// Event: реакция пружины на тело под персонажем (равная и противоположная)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct PlatformReaction {
    pub platform: Entity,
    pub force: Vec3,
    pub point: Vec3,
}
