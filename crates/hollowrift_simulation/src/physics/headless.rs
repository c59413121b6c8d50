//! Headless интеграция твёрдых тел (без Rapier)
//!
//! Когда rapier context не создан (тесты, headless сервер), тела с `HeadlessBody`
//! интегрируются здесь: semi-implicit Euler по тем же компонентам, что пишет
//! контроллер (`ExternalForce`, `ExternalImpulse`, `GravityScale`, `Velocity`).
//! Коллизий нет — землю держит пружина контроллера над `FlatGround`.
//!
//! Детерминизм: fixed timestep (60Hz), порядок entity не влияет на результат.

use bevy::prelude::*;
use bevy_rapier3d::prelude::{
    ExternalForce, ExternalImpulse, GravityScale, ReadMassProperties, ReadRapierContext, Velocity,
};

/// Гравитация симуляции (совпадает с дефолтом rapier)
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct PhysicsGravity(pub Vec3);

impl Default for PhysicsGravity {
    fn default() -> Self {
        Self(Vec3::new(0.0, -9.81, 0.0))
    }
}

/// Масса/инерция тела для headless интеграции
///
/// С rapier масса читается из `ReadMassProperties`, это значение — fallback.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct HeadlessBody {
    pub mass: f32,
    pub angular_inertia: f32,
}

impl Default for HeadlessBody {
    fn default() -> Self {
        Self {
            mass: 1.0,
            angular_inertia: 1.0,
        }
    }
}

/// Масса тела: rapier (если посчитана) → HeadlessBody → 1.0
pub fn body_mass(read_mass: Option<&ReadMassProperties>, body: Option<&HeadlessBody>) -> f32 {
    if let Some(mass) = read_mass.map(|m| m.get().mass).filter(|m| *m > 0.0) {
        return mass;
    }
    body.map_or(1.0, |b| b.mass.max(f32::EPSILON))
}

/// Один шаг интеграции (чистая функция, для тестов и системы)
#[allow(clippy::too_many_arguments)]
pub fn integrate_body(
    transform: &mut Transform,
    velocity: &mut Velocity,
    force: Option<&ExternalForce>,
    impulse: Option<&ExternalImpulse>,
    gravity: Vec3,
    gravity_scale: f32,
    body: &HeadlessBody,
    delta: f32,
) {
    let mass = body.mass.max(f32::EPSILON);
    let inertia = body.angular_inertia.max(f32::EPSILON);

    let mut linear_acceleration = gravity * gravity_scale;
    let mut angular_acceleration = Vec3::ZERO;
    if let Some(force) = force {
        linear_acceleration += force.force / mass;
        angular_acceleration += force.torque / inertia;
    }

    velocity.linvel += linear_acceleration * delta;
    velocity.angvel += angular_acceleration * delta;

    if let Some(impulse) = impulse {
        velocity.linvel += impulse.impulse / mass;
        velocity.angvel += impulse.torque_impulse / inertia;
    }

    transform.translation += velocity.linvel * delta;

    let rotation_step = velocity.angvel * delta;
    if rotation_step.length_squared() > 0.0 {
        transform.rotation = (Quat::from_scaled_axis(rotation_step) * transform.rotation).normalize();
    }
}

/// Система: headless интеграция (no-op если rapier активен)
///
/// ExternalImpulse сбрасывается после применения (как в rapier),
/// ExternalForce — нет (контроллер перезаписывает её каждый tick).
pub fn integrate_headless_bodies(
    rapier: ReadRapierContext,
    gravity: Res<PhysicsGravity>,
    time: Res<Time>,
    mut bodies: Query<(
        &HeadlessBody,
        &mut Transform,
        &mut Velocity,
        Option<&ExternalForce>,
        Option<&mut ExternalImpulse>,
        Option<&GravityScale>,
    )>,
) {
    if rapier.single().is_ok() {
        return;
    }

    let delta = time.delta_secs();
    if delta <= 0.0 {
        return;
    }

    for (body, mut transform, mut velocity, force, impulse, gravity_scale) in bodies.iter_mut() {
        let scale = gravity_scale.map_or(1.0, |g| g.0);
        integrate_body(
            &mut transform,
            &mut velocity,
            force,
            impulse.as_deref(),
            gravity.0,
            scale,
            body,
            delta,
        );

        if let Some(mut impulse) = impulse {
            if *impulse != ExternalImpulse::default() {
                *impulse = ExternalImpulse::default();
            }
        }
    }
}
