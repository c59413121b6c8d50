//! Inventory: стакающиеся предметы персонажа

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Период `update` хука предметов (секунды)
pub const ITEM_UPDATE_INTERVAL: f32 = 1.0;
/// Внутренний cooldown HealingArea (в периодах update)
pub const HEALING_AREA_COOLDOWN: f32 = 10.0;
/// Время жизни heal zone
pub const HEAL_ZONE_LIFETIME: f32 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect, Serialize, Deserialize)]
pub enum ItemKind {
    /// Периодическое лечение 3·(2+stacks)
    Healing,
    /// Урон способностей = base + 10·stacks
    FireDamage,
    /// Heal zone при прыжке
    HealingArea,
    /// Скорость способностей (affected_by_attack_speed) = base + stacks
    AttackSpeed,
    /// Дальность способностей = base + stacks
    AttackRange,
    /// Bleed на попадание
    Bleed,
    /// Макс. скорость + stacks
    MovementSpeed,
    /// Extra jumps = stacks
    ExtraJump,
}

impl ItemKind {
    /// Все kind'ы (пул выпадения из сундуков)
    pub const ALL: [ItemKind; 8] = [
        Self::Healing,
        Self::FireDamage,
        Self::HealingArea,
        Self::AttackSpeed,
        Self::AttackRange,
        Self::Bleed,
        Self::MovementSpeed,
        Self::ExtraJump,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Healing => "Healing Item",
            Self::FireDamage => "Fire Damage Item",
            Self::HealingArea => "Healing Area Item",
            Self::AttackSpeed => "Attack Speed Item",
            Self::AttackRange => "Attack Range Item",
            Self::Bleed => "Bleed Item",
            Self::MovementSpeed => "Movement Speed Item",
            Self::ExtraJump => "Extra Jump Item",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub struct ItemStack {
    pub kind: ItemKind,
    pub stacks: u32,
}

/// Предметы персонажа + runtime таймеры хуков
#[derive(Component, Debug, Clone, Default, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Inventory {
    pub items: Vec<ItemStack>,
    /// До следующего периодического update
    pub update_timer: f32,
    /// Внутренний cooldown HealingArea (уменьшается на 1 каждый update)
    pub healing_area_cooldown: f32,
}

impl Inventory {
    /// +1 стак (новый предмет — 1); возвращает стаки после добавления
    pub fn add(&mut self, kind: ItemKind) -> u32 {
        if let Some(stack) = self.items.iter_mut().find(|stack| stack.kind == kind) {
            stack.stacks += 1;
            return stack.stacks;
        }
        self.items.push(ItemStack { kind, stacks: 1 });
        1
    }

    pub fn stacks(&self, kind: ItemKind) -> u32 {
        self.items
            .iter()
            .find(|stack| stack.kind == kind)
            .map_or(0, |stack| stack.stacks)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Параметры bleed для числа стаков: (tick interval, duration)
///
/// Убывающая отдача: interval = 2 / (1 + stacks / (stacks + 10)).
pub fn bleed_parameters(stacks: u32) -> (f32, f32) {
    const BASE_INTERVAL: f32 = 2.0;
    const BASE_DURATION: f32 = 5.0;

    if stacks <= 1 {
        return (BASE_INTERVAL, BASE_DURATION);
    }
    let stacks = stacks as f32;
    let rate_bonus = stacks / (stacks + 10.0);
    (
        BASE_INTERVAL / (1.0 + rate_bonus),
        BASE_DURATION + 0.5 * stacks,
    )
}

/// Лечение Healing предмета за один update
pub fn healing_per_update(stacks: u32) -> f32 {
    3.0 * (2.0 + stacks as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_stacks() {
        let mut inventory = Inventory::default();
        assert_eq!(inventory.add(ItemKind::Bleed), 1);
        assert_eq!(inventory.add(ItemKind::Healing), 1);
        assert_eq!(inventory.add(ItemKind::Bleed), 2);
        assert_eq!(inventory.stacks(ItemKind::Bleed), 2);
        assert_eq!(inventory.stacks(ItemKind::ExtraJump), 0);
        assert_eq!(inventory.items.len(), 2);
    }

    #[test]
    fn test_bleed_parameters() {
        assert_eq!(bleed_parameters(1), (2.0, 5.0));

        let (interval, duration) = bleed_parameters(10);
        // 2 / (1 + 0.5)
        assert!((interval - 4.0 / 3.0).abs() < 1e-5);
        assert_eq!(duration, 10.0);
    }

    #[test]
    fn test_healing_per_update() {
        assert_eq!(healing_per_update(1), 9.0);
        assert_eq!(healing_per_update(3), 15.0);
    }
}
