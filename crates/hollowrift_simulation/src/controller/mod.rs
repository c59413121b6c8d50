//! Floating capsule controller
//!
//! Rigid body капсула парит над землёй на пружине:
//! - ride height spring + upright torsion spring
//! - движение через силу к goal velocity (кривые ускорения)
//! - прыжок: buffer, coyote time, extra jumps, fall/rise/low-jump гравитация
//! - полёт (форма с can_fly), strafe, блокировка движения (blink)
//!
//! Математика — `solver` (чистые функции), ECS glue — `systems`.

use bevy::prelude::*;

pub mod components;
pub mod solver;
pub mod systems;

#[cfg(test)]
mod controller_tests;

// Re-export основных типов
pub use components::{
    ControllerInput, ControllerState, FloatingCapsule, GroundProbe, Jumped, LookDirectionMode,
    PlatformReaction,
};
pub use systems::{
    apply_platform_reactions, probe_ground, set_extra_jumps, tick_strafe_timers,
    update_floating_capsules,
};

use crate::physics::HeadlessPhysicsSet;
use crate::SimulationSet;

/// Controller Plugin
///
/// Порядок выполнения (Movement set, до headless интеграции):
/// 1. probe_ground — луч вниз, платформа
/// 2. update_floating_capsules — ExternalForce/Impulse
/// 3. apply_platform_reactions — реакция пружины на тело под ногами
pub struct ControllerPlugin;

impl Plugin for ControllerPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<Jumped>()
            .add_event::<PlatformReaction>()
            .register_type::<FloatingCapsule>()
            .register_type::<ControllerInput>()
            .register_type::<ControllerState>();

        app.add_systems(
            FixedUpdate,
            tick_strafe_timers.in_set(SimulationSet::Input),
        );
        app.add_systems(
            FixedUpdate,
            (probe_ground, update_floating_capsules, apply_platform_reactions)
                .chain()
                .in_set(SimulationSet::Movement)
                .before(HeadlessPhysicsSet),
        );
    }
}
