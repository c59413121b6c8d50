//! Фракции и враждебность

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Фракция актора (Player / Enemy / Ally)
///
/// Компонент "кто я" для ищущего цель AI и для hit-фильтров эмиттеров.
#[derive(
    Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Reflect, Serialize, Deserialize,
)]
#[reflect(Component)]
pub enum Faction {
    Player,
    #[default]
    Enemy,
    Ally,
}

impl Faction {
    pub fn is_hostile_to(self, other: Faction) -> bool {
        are_hostile(self, other)
    }
}

/// Враждебность фракций
///
/// Симметрична. Своя фракция никогда не враждебна, пара Player/Ally всегда дружественна.
pub fn are_hostile(a: Faction, b: Faction) -> bool {
    if a == b {
        return false;
    }
    !matches!(
        (a, b),
        (Faction::Player, Faction::Ally) | (Faction::Ally, Faction::Player)
    )
}
