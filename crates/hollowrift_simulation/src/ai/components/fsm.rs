//! FSM AI components (state, config, runtime агента).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::animation::AnimParams;
use crate::navigation::NavAgent;

use super::attacks::AiAttacks;

/// AI FSM состояния
///
/// Attack мгновенный: executed → сразу Chase в том же tick'е.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize)]
pub enum AiState {
    /// Начальное состояние: идём к цели
    #[default]
    Chase,
    /// Замах: стоим, поворачиваемся к цели `windup_time` секунд
    Windup,
    Attack,
    /// Оглушён: ничего не делает до конца таймера
    Stunned,
}

/// Параметры AI
#[derive(Component, Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
#[serde(default)]
pub struct AiConfig {
    pub chase_range: f32,
    pub attack_range: f32,
    pub los_max_distance: f32,
    /// Высота точки обзора над origin агента
    pub los_origin_height: f32,
    pub windup_time: f32,
    pub face_target_speed: f32,
    pub target_refresh_interval: f32,
    pub target_search_range: f32,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            chase_range: 30.0,
            attack_range: 2.2,
            los_max_distance: 50.0,
            los_origin_height: 0.0,
            windup_time: 0.3,
            face_target_speed: 12.0,
            target_refresh_interval: 0.25,
            target_search_range: 50.0,
        }
    }
}

/// Runtime AI агента
///
/// `target` — слабая ссылка: entity может исчезнуть между refresh'ами.
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
#[require(AiConfig, AiAttacks, NavAgent, AnimParams)]
pub struct AiAgent {
    pub state: AiState,
    pub target: Option<Entity>,
    pub windup_timer: f32,
    pub stun_timer: f32,
    pub target_refresh_timer: f32,
    /// Куда смотреть во время windup (пишет FSM, читает ai_face_targets)
    pub face_point: Option<Vec3>,
}

impl Default for AiAgent {
    fn default() -> Self {
        Self {
            state: AiState::Chase,
            target: None,
            windup_timer: 0.0,
            stun_timer: 0.0,
            // 0 → поиск цели на первом tick'е
            target_refresh_timer: 0.0,
            face_point: None,
        }
    }
}

impl AiAgent {
    /// Оглушение из любого состояния
    ///
    /// Windup прерывается молча; повторный stun перезапускает таймер.
    pub fn apply_stun(&mut self, duration: f32) {
        self.state = AiState::Stunned;
        self.stun_timer = duration.max(0.0);
        self.windup_timer = 0.0;
        self.face_point = None;
    }

    pub fn begin_windup(&mut self, windup_time: f32) {
        self.state = AiState::Windup;
        self.windup_timer = windup_time.max(0.0);
    }

    pub fn is_stunned(&self) -> bool {
        self.state == AiState::Stunned
    }
}
