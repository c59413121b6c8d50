//! Damage model: события и формула брони
//!
//! Поток:
//! DamageRequest → calculate_damage(armor) → Health → DamageDealt → (health ≤ 0) EntityDied
//! HealRequest → Health (clamp к max) → Healed

use bevy::prelude::*;

/// Запрос на урон (от атак AI, эмиттеров, снарядов, bleed)
///
/// `amount` — сырой урон, броня цели применяется при обработке.
/// `direct` — прямое попадание игрока (camera shake / hit reaction на стороне клиента).
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct DamageRequest {
    pub target: Entity,
    pub source: Option<Entity>,
    pub amount: f32,
    pub direct: bool,
}

/// Запрос на лечение
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct HealRequest {
    pub target: Entity,
    pub amount: f32,
}

/// Событие: урон нанесен
///
/// Генерируется после применения damage к Health.
/// Используется для UI, звуков, эффектов.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct DamageDealt {
    pub attacker: Option<Entity>,
    pub target: Entity,
    pub damage: f32,
    pub direct: bool,
    pub target_died: bool,
}

/// Событие: персонаж вылечен (только если что-то восстановлено)
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct Healed {
    pub target: Entity,
    pub amount: f32,
}

/// Событие: entity умер (health <= 0), ровно один раз за жизнь
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct EntityDied {
    pub entity: Entity,
    pub killer: Option<Entity>,
}

/// Компонент-маркер: entity мертв (Health <= 0)
///
/// AI, controller, abilities и status пропускают таких через `Without<Dead>`.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Dead;

/// Итоговый урон после брони
///
/// Формула: raw × 100 / (100 + armor). Отрицательная броня трактуется как 0.
pub fn calculate_damage(raw_damage: f32, armor: f32) -> f32 {
    let armor = armor.max(0.0);
    raw_damage.max(0.0) * (100.0 / (100.0 + armor))
}
