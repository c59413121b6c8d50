//! Combat module: health/armor damage model, heal, death hook, heal zones
//!
//! ECS ответственность:
//! - Game state: Health, Armor, Dead
//! - Combat rules: armor formula, death ровно один раз
//! - Events: DamageRequest/HealRequest (вход), DamageDealt/Healed/EntityDied (выход)
//!
//! Кто шлёт DamageRequest: AI атаки, эмиттеры способностей, снаряды, bleed.

use bevy::prelude::*;

pub mod damage;
pub mod heal_zone;
pub mod systems;

// Re-export основных типов
pub use damage::{
    calculate_damage, DamageDealt, DamageRequest, Dead, EntityDied, HealRequest, Healed,
};
pub use heal_zone::{tick_heal_zones, HealZone};
pub use systems::{apply_damage_requests, apply_heal_requests, handle_deaths};

use crate::SimulationSet;

/// Combat Plugin
///
/// Регистрирует combat системы в FixedUpdate (Combat set).
///
/// Порядок выполнения:
/// 1. tick_heal_zones — зоны → HealRequest
/// 2. apply_heal_requests — лечение (до урона: хил и смертельный удар в один tick = смерть)
/// 3. apply_damage_requests — броня → Health → DamageDealt / EntityDied
/// 4. handle_deaths — DeathBehavior (отложенный возврат в pool)
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        // Регистрация событий
        app.add_event::<DamageRequest>()
            .add_event::<HealRequest>()
            .add_event::<DamageDealt>()
            .add_event::<Healed>()
            .add_event::<EntityDied>()
            .register_type::<Dead>()
            .register_type::<HealZone>();

        app.add_systems(
            FixedUpdate,
            (
                tick_heal_zones,
                apply_heal_requests,
                apply_damage_requests,
                handle_deaths,
            )
                .chain()
                .in_set(SimulationSet::Combat),
        );
    }
}
