//! Animation parameter bag (граница с animation driver)
//!
//! Симуляция только пишет именованные параметры; кто их читает (rig, blend tree,
//! UI) — внешний collaborator. Триггеры живут один tick: очищаются в начале
//! следующего, поэтому после `app.update()` их ещё видно.

use bevy::prelude::*;
use std::collections::{BTreeMap, BTreeSet};

use crate::SimulationSet;

/// Имена параметров, которые пишет симуляция
pub mod params {
    // AI
    pub const MOVING: &str = "Moving";
    pub const WINDUP: &str = "Windup";
    pub const STUNNED: &str = "Stunned";
    pub const ATTACK: &str = "Attack";
    // Abilities
    pub const IS_ATTACKING: &str = "isAttacking";
    pub const ABILITY_INDEX: &str = "AbilityIndex";
    pub const IS_TRANSFORMED: &str = "isTransformed";
    pub const FORM_AMOUNT: &str = "FormAmount";
    /// + номер слота (AbilitySpeed1..4)
    pub const ABILITY_SPEED_PREFIX: &str = "AbilitySpeed";
    pub const MOVEMENT_SPEED: &str = "MovementSpeed";
    // Controller
    pub const FORWARD_SPEED: &str = "ForwardSpeed";
    pub const SIDE_SPEED: &str = "SideSpeed";
    pub const IS_GROUNDED: &str = "IsGrounded";
    pub const JUMP_REQUESTED: &str = "JumpRequested";
    pub const IS_STRAFING: &str = "IsStrafing";
    pub const IS_FLYING: &str = "isFlying";
    // Combat
    pub const HIT: &str = "Hit";
    pub const DIE: &str = "Die";
}

/// Именованные float/bool/trigger параметры анимации
///
/// BTreeMap — стабильный порядок для snapshot'ов детерминизма.
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct AnimParams {
    floats: BTreeMap<String, f32>,
    bools: BTreeMap<String, bool>,
    triggers: BTreeSet<String>,
}

impl AnimParams {
    pub fn set_float(&mut self, name: &str, value: f32) {
        self.floats.insert(name.to_string(), value);
    }

    pub fn float(&self, name: &str) -> f32 {
        self.floats.get(name).copied().unwrap_or(0.0)
    }

    pub fn set_bool(&mut self, name: &str, value: bool) {
        self.bools.insert(name.to_string(), value);
    }

    pub fn bool(&self, name: &str) -> bool {
        self.bools.get(name).copied().unwrap_or(false)
    }

    pub fn set_trigger(&mut self, name: &str) {
        self.triggers.insert(name.to_string());
    }

    pub fn has_trigger(&self, name: &str) -> bool {
        self.triggers.contains(name)
    }

    /// Забирает триггер (для driver'а); true если был выставлен
    pub fn consume_trigger(&mut self, name: &str) -> bool {
        self.triggers.remove(name)
    }

    pub fn clear_triggers(&mut self) {
        self.triggers.clear();
    }
}

pub struct AnimationPlugin;

impl Plugin for AnimationPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            FixedUpdate,
            clear_animation_triggers.in_set(SimulationSet::Input),
        );
    }
}

/// Система: сброс триггеров прошлого tick'а
pub fn clear_animation_triggers(mut query: Query<&mut AnimParams>) {
    for mut params in query.iter_mut() {
        if !params.triggers.is_empty() {
            params.clear_triggers();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_and_overwrite() {
        let mut anim = AnimParams::default();
        assert_eq!(anim.float(params::FORWARD_SPEED), 0.0);
        assert!(!anim.bool(params::MOVING));

        anim.set_float(params::FORWARD_SPEED, 3.5);
        anim.set_bool(params::MOVING, true);
        anim.set_bool(params::MOVING, false);

        assert_eq!(anim.float(params::FORWARD_SPEED), 3.5);
        assert!(!anim.bool(params::MOVING));
    }

    #[test]
    fn test_trigger_consumed_once() {
        let mut anim = AnimParams::default();
        anim.set_trigger(params::ATTACK);
        assert!(anim.has_trigger(params::ATTACK));
        assert!(anim.consume_trigger(params::ATTACK));
        assert!(!anim.consume_trigger(params::ATTACK));
    }
}
