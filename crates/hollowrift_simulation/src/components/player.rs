//! Player control marker component
//!
//! Отмечает entity которым управляет игрок через input (в отличие от AI).

use bevy::prelude::*;

use super::actor::{Actor, DeathBehavior, Health};
use crate::controller::FloatingCapsule;
use crate::items::Inventory;
use crate::physics::collision::character_groups;
use crate::physics::HeadlessCollider;
use crate::targeting::{Faction, Targetable};

/// Marker component для player-controlled entity
///
/// - AI systems используют `Without<Player>` (пропускают игрока)
/// - heal zones, spawn director и node builder ищут игрока через `With<Player>`
///
/// В single-player режиме обычно только один entity имеет этот компонент.
#[derive(Component, Debug, Clone, Copy, Default, Reflect)]
#[reflect(Component)]
pub struct Player;

/// Бандл игрока: капсула + цель для врагов + инвентарь
///
/// Способности/формы вешаются отдельно (`Abilities`, `Forms`).
pub fn player_bundle(capsule: FloatingCapsule) -> impl Bundle {
    (
        Name::new("Player"),
        Player,
        Actor,
        Faction::Player,
        Targetable::new(Faction::Player),
        Health::new(100.0),
        capsule,
        Inventory::default(),
        HeadlessCollider::new(0.5),
        character_groups(Faction::Player),
        DeathBehavior::Persist,
    )
}
