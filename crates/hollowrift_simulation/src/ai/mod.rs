//! AI decision-making module
//!
//! Chase → Windup → Attack → Chase, Stunned из любого состояния.
//! Attack мгновенный; атаки — strategy enum (melee cone / projectile).

use bevy::prelude::*;

pub mod components;
pub mod events;
pub mod systems;

// Re-export основных типов (по имени: у components и systems одинаковые подмодули)
pub use components::{
    AiAgent, AiAttack, AiAttacks, AiConfig, AiState, AttackKind, MeleeAttack, ProjectileAttack,
};
pub use events::{AiAttackStarted, AiStateChanged, StunRequest};
pub use systems::{
    ai_apply_stun_requests, ai_execute_attacks, ai_face_targets, ai_fsm_update,
    has_line_of_sight, melee_hits, projectile_aim, target_velocity, LOS_TARGET_HEIGHT,
};

use crate::SimulationSet;

/// AI Plugin
///
/// Порядок выполнения (SimulationSet::Ai, после Movement):
/// 1. ai_apply_stun_requests — StunRequest → Stunned
/// 2. ai_fsm_update — таймеры, цель, переходы
/// 3. ai_face_targets — поворот во время windup
/// 4. ai_execute_attacks — AiAttackStarted → урон / снаряд
pub struct AiPlugin;

impl Plugin for AiPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<StunRequest>()
            .add_event::<AiStateChanged>()
            .add_event::<AiAttackStarted>()
            .register_type::<AiAgent>()
            .register_type::<AiConfig>()
            .register_type::<AiAttacks>();

        app.add_systems(
            FixedUpdate,
            (
                ai_apply_stun_requests,
                ai_fsm_update,
                ai_face_targets,
                ai_execute_attacks,
            )
                .chain()
                .in_set(SimulationSet::Ai),
        );
    }
}
