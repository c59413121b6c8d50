//! Physics module: query provider, collision groups, headless integrator
//!
//! Rapier (`bevy_rapier3d`) — основной backend: коллайдеры, тела, raycast.
//! Плагин rapier добавляет бинарник; симуляция и тесты работают и без него
//! через `FlatGround` + `HeadlessCollider` + `integrate_headless_bodies`.

use bevy::prelude::*;

pub mod collision;
pub mod headless;
pub mod queries;

// Re-export основных типов
pub use headless::{body_mass, integrate_headless_bodies, HeadlessBody, PhysicsGravity};
pub use queries::{FlatGround, HeadlessCollider, PhysicsQueries, PhysicsWorld, RayHit};

use crate::SimulationSet;

/// Шаг headless интеграции (конец Movement set, после сил контроллера)
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeadlessPhysicsSet;

pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<PhysicsGravity>()
            .register_type::<HeadlessBody>()
            .register_type::<HeadlessCollider>();

        app.configure_sets(
            FixedUpdate,
            HeadlessPhysicsSet.in_set(SimulationSet::Movement),
        );
        app.add_systems(
            FixedUpdate,
            integrate_headless_bodies.in_set(HeadlessPhysicsSet),
        );
    }
}
