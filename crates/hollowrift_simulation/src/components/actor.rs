//! Базовые компоненты персонажей: Actor, Health, Armor, DeathBehavior

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::animation::AnimParams;
use crate::status::ActiveEffects;
use crate::targeting::Faction;

/// Персонаж (игрок, враг, союзник, призванный) — базовый компонент живых существ
///
/// Автоматически добавляет Health, Armor, ActiveEffects, AnimParams, Faction, DeathBehavior
/// через Required Components.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
#[require(Health, Armor, ActiveEffects, AnimParams, Faction, DeathBehavior)]
pub struct Actor;

/// Здоровье персонажа
///
/// Инвариант: 0 ≤ current ≤ max. Создаётся с current = max.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct Health {
    pub current: f32,
    pub max: f32,
}

impl Default for Health {
    fn default() -> Self {
        Self::new(100.0)
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        let max = max.max(0.0);
        Self { current: max, max }
    }

    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    /// Вычитает уже посчитанный урон (после брони)
    pub fn take_damage(&mut self, amount: f32) {
        self.current = (self.current - amount.max(0.0)).max(0.0);
    }

    /// Лечение с clamp к max; возвращает фактически восстановленное
    pub fn heal(&mut self, amount: f32) -> f32 {
        let before = self.current;
        self.current = (self.current + amount.max(0.0)).min(self.max);
        self.current - before
    }

    pub fn is_full(&self) -> bool {
        self.current >= self.max
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            self.current / self.max
        }
    }
}

/// Броня (≥ 0, без верхней границы)
///
/// Урон масштабируется как damage × 100 / (100 + armor).
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct Armor(pub f32);

/// Что делать с телом после смерти
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub enum DeathBehavior {
    /// Вернуть в pool / удалить через `delay` секунд
    Despawn { delay: f32 },
    /// Остаться в мире (игрок)
    Persist,
}

impl Default for DeathBehavior {
    fn default() -> Self {
        Self::Despawn { delay: 2.0 }
    }
}
