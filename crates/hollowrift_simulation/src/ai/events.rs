//! AI Events
//!
//! Вход: StunRequest (эмиттеры способностей, on-hit).
//! Выход: AiStateChanged (анимация/UI подписчики), AiAttackStarted (исполнение атаки).

use bevy::prelude::*;

use super::components::AiState;

/// Запрос оглушения агента
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct StunRequest {
    pub entity: Entity,
    pub duration: f32,
}

/// Смена состояния FSM
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AiStateChanged {
    pub entity: Entity,
    pub from: AiState,
    pub to: AiState,
}

/// Windup завершён успешно: исполнить атаку `attack_index` по `target`
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct AiAttackStarted {
    pub agent: Entity,
    pub target: Entity,
    pub attack_index: usize,
}
