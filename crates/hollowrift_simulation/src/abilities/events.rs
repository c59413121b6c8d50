//! Ability Events
//!
//! Вход: AbilityInput (нажатие/отпускание слота).
//! Внутренние: AbilityFired (эмиттер стреляет), EmittersStopped (stop_fire).
//! Выход: AbilityHit → урон/stun/предметы, FormChanged.

use bevy::prelude::*;

use super::forms::FormKind;

/// Нажатие (`pressed`) или отпускание слота
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AbilityInput {
    pub entity: Entity,
    pub slot: usize,
    pub pressed: bool,
}

impl AbilityInput {
    pub fn press(entity: Entity, slot: usize) -> Self {
        Self {
            entity,
            slot,
            pressed: true,
        }
    }

    pub fn release(entity: Entity, slot: usize) -> Self {
        Self {
            entity,
            slot,
            pressed: false,
        }
    }
}

/// Эмиттер слота `slot` стреляет в этом tick'е
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AbilityFired {
    pub owner: Entity,
    pub slot: usize,
}

/// Попадание способности по враждебному персонажу
///
/// `direct` — прямое попадание (melee, снаряд, blink).
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AbilityHit {
    pub attacker: Entity,
    pub target: Entity,
    pub slot: usize,
    pub direct: bool,
}

/// stop_fire всех эмиттеров владельца (смена формы)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct EmittersStopped {
    pub owner: Entity,
}

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct FormChanged {
    pub entity: Entity,
    pub form: FormKind,
}
