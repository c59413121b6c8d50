//! Collision groups — centralised constants для всего проекта
//!
//! ## Архитектура:
//! - **Memberships:** в каких группах объект находится
//! - **Filters:** с какими группами объект взаимодействует
//!
//! ## Группы (rapier Group bits):
//! - GROUP_1: World (стены, препятствия — блокируют LOS)
//! - GROUP_2: Terrain (земля — ground probe контроллера)
//! - GROUP_3: Player
//! - GROUP_4: Enemy
//! - GROUP_5: Ally (союзники, призванные)
//! - GROUP_6: Projectile
//! - GROUP_7: Interactable (сундуки, предметы на земле)

use bevy_rapier3d::prelude::{CollisionGroups, Group};

use crate::targeting::Faction;

// ============================================================================
// Memberships
// ============================================================================

pub const GROUP_WORLD: Group = Group::GROUP_1;
pub const GROUP_TERRAIN: Group = Group::GROUP_2;
pub const GROUP_PLAYER: Group = Group::GROUP_3;
pub const GROUP_ENEMY: Group = Group::GROUP_4;
pub const GROUP_ALLY: Group = Group::GROUP_5;
pub const GROUP_PROJECTILE: Group = Group::GROUP_6;
pub const GROUP_INTERACTABLE: Group = Group::GROUP_7;

// ============================================================================
// Masks
// ============================================================================

/// Ground probe контроллера и walkable sampling
pub const MASK_GROUND: Group = GROUP_WORLD.union(GROUP_TERRAIN);

/// Что блокирует line-of-sight (только геометрия мира, персонажи — нет)
pub const MASK_LOS_BLOCK: Group = GROUP_WORLD.union(GROUP_TERRAIN);

/// Все персонажи
pub const MASK_CHARACTERS: Group = GROUP_PLAYER.union(GROUP_ENEMY).union(GROUP_ALLY);

/// Под сундуком не должно быть стен и других сундуков
pub const MASK_CHEST_BLOCK: Group = GROUP_WORLD.union(GROUP_INTERACTABLE);

/// Снаряды сталкиваются с геометрией и персонажами, но не друг с другом
pub const MASK_PROJECTILE: Group = MASK_GROUND.union(MASK_CHARACTERS);

// ============================================================================
// Helper Functions
// ============================================================================

pub fn faction_group(faction: Faction) -> Group {
    match faction {
        Faction::Player => GROUP_PLAYER,
        Faction::Enemy => GROUP_ENEMY,
        Faction::Ally => GROUP_ALLY,
    }
}

/// Группы персонажей, враждебных фракции (для hit-запросов эмиттеров)
pub fn hostile_mask(faction: Faction) -> Group {
    [Faction::Player, Faction::Enemy, Faction::Ally]
        .into_iter()
        .filter(|other| faction.is_hostile_to(*other))
        .fold(Group::NONE, |mask, other| mask | faction_group(other))
}

/// Персонаж: своя группа, коллайдит с миром и всеми персонажами
pub fn character_groups(faction: Faction) -> CollisionGroups {
    CollisionGroups::new(faction_group(faction), MASK_GROUND | MASK_CHARACTERS)
}

/// Персонаж на время blink-рывка: проходит сквозь врагов
pub fn dashing_character_groups(faction: Faction) -> CollisionGroups {
    let groups = character_groups(faction);
    CollisionGroups::new(
        groups.memberships,
        groups.filters.difference(hostile_mask(faction)),
    )
}

pub fn projectile_groups() -> CollisionGroups {
    CollisionGroups::new(GROUP_PROJECTILE, MASK_PROJECTILE)
}

/// Сундуки/предметы: находятся только interact-запросом, ни с чем не сталкиваются
pub fn interactable_groups() -> CollisionGroups {
    CollisionGroups::new(GROUP_INTERACTABLE, Group::NONE)
}

pub fn terrain_groups() -> CollisionGroups {
    CollisionGroups::new(GROUP_TERRAIN, Group::ALL)
}

pub fn obstacle_groups() -> CollisionGroups {
    CollisionGroups::new(GROUP_WORLD, Group::ALL)
}

/// Название группы для debug логов
pub fn get_group_name(group: Group) -> &'static str {
    if group == GROUP_WORLD {
        "World"
    } else if group == GROUP_TERRAIN {
        "Terrain"
    } else if group == GROUP_PLAYER {
        "Player"
    } else if group == GROUP_ENEMY {
        "Enemy"
    } else if group == GROUP_ALLY {
        "Ally"
    } else if group == GROUP_PROJECTILE {
        "Projectile"
    } else if group == GROUP_INTERACTABLE {
        "Interactable"
    } else {
        "Unknown"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostile_mask_follows_faction_rules() {
        assert_eq!(hostile_mask(Faction::Enemy), GROUP_PLAYER | GROUP_ALLY);
        assert_eq!(hostile_mask(Faction::Player), GROUP_ENEMY);
        assert_eq!(hostile_mask(Faction::Ally), GROUP_ENEMY);
    }

    #[test]
    fn test_dashing_player_passes_through_enemies() {
        let groups = dashing_character_groups(Faction::Player);
        assert!(!groups.filters.intersects(GROUP_ENEMY));
        assert!(groups.filters.contains(GROUP_TERRAIN));
        assert!(groups.filters.contains(GROUP_ALLY));
    }

    #[test]
    fn test_los_ignores_characters() {
        assert!(!MASK_LOS_BLOCK.intersects(MASK_CHARACTERS));
        assert_eq!(get_group_name(GROUP_TERRAIN), "Terrain");
    }

    #[test]
    fn test_interactables_invisible_to_ground_and_los() {
        let groups = interactable_groups();
        assert!(!MASK_GROUND.intersects(groups.memberships));
        assert!(!MASK_LOS_BLOCK.intersects(groups.memberships));
        assert!(!MASK_PROJECTILE.intersects(groups.memberships));
        assert!(MASK_CHEST_BLOCK.contains(GROUP_INTERACTABLE));
    }
}
