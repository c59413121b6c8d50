//! ECS Components общие для всех доменов
//!
//! Организация:
//! - actor: базовые характеристики персонажа (Actor, Health, Armor, DeathBehavior)
//! - player: player control marker (Player)
//!
//! Доменные компоненты (AI, controller, abilities, ...) живут в своих модулях.

pub mod actor;
pub mod player;

// Re-exports для удобного импорта
pub use actor::*;
pub use player::*;
