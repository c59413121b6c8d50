//! Spawn cards: что директор может купить

use bevy::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::pool::{prototypes, PrototypeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
pub enum HullSize {
    #[default]
    Small,
    Medium,
    Large,
}

impl HullSize {
    /// Радиус свободного места под персонажа
    pub fn radius(self) -> f32 {
        match self {
            Self::Small => 0.5,
            Self::Medium => 1.0,
            Self::Large => 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnCard {
    pub name: String,
    pub prototype: PrototypeId,
    pub cost: f32,
    pub hull: HullSize,
    pub is_flying: bool,
    /// Высота над anchor для летающих
    pub air_height: f32,
    /// Допустимая планарная дистанция от игрока
    pub min_distance: f32,
    pub max_distance: f32,
    /// Не спавнить на виду у наблюдателя (камера)
    pub hide_from_observer: bool,
}

impl Default for SpawnCard {
    fn default() -> Self {
        Self {
            name: "Grunt".to_string(),
            prototype: PrototypeId::new(prototypes::MELEE_ENEMY),
            cost: 10.0,
            hull: HullSize::Small,
            is_flying: false,
            air_height: 20.0,
            min_distance: 15.0,
            max_distance: 60.0,
            hide_from_observer: true,
        }
    }
}

impl SpawnCard {
    pub fn new(name: &str, prototype: &str, cost: f32) -> Self {
        Self {
            name: name.to_string(),
            prototype: PrototypeId::new(prototype),
            cost,
            ..default()
        }
    }

    pub fn with_hull(mut self, hull: HullSize) -> Self {
        self.hull = hull;
        self
    }

    pub fn with_distance(mut self, min: f32, max: f32) -> Self {
        self.min_distance = min.max(0.0);
        self.max_distance = max.max(self.min_distance);
        self
    }

    pub fn flying(mut self, air_height: f32) -> Self {
        self.is_flying = true;
        self.air_height = air_height;
        self
    }

    pub fn visible_spawn(mut self) -> Self {
        self.hide_from_observer = false;
        self
    }

    pub fn in_distance(&self, distance: f32) -> bool {
        distance >= self.min_distance && distance <= self.max_distance
    }
}

/// Набор карт директора
#[derive(Debug, Clone, PartialEq, Default, Reflect, Serialize, Deserialize)]
pub struct SpawnCardPool {
    pub cards: Vec<SpawnCard>,
}

impl SpawnCardPool {
    pub fn new(cards: Vec<SpawnCard>) -> Self {
        Self { cards }
    }

    /// Случайная (равновероятно) карта с cost <= credits
    pub fn affordable(&self, credits: f32, rng: &mut impl Rng) -> Option<&SpawnCard> {
        let affordable: Vec<&SpawnCard> =
            self.cards.iter().filter(|card| card.cost <= credits).collect();
        if affordable.is_empty() {
            return None;
        }
        Some(affordable[rng.gen_range(0..affordable.len())])
    }

    pub fn cheapest(&self) -> Option<f32> {
        self.cards.iter().map(|card| card.cost).reduce(f32::min)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_affordable_filters_by_cost() {
        let pool = SpawnCardPool::new(vec![
            SpawnCard::new("Grunt", prototypes::MELEE_ENEMY, 10.0),
            SpawnCard::new("Archer", prototypes::RANGED_ENEMY, 25.0),
        ]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        assert!(pool.affordable(5.0, &mut rng).is_none());
        for _ in 0..20 {
            assert_eq!(pool.affordable(12.0, &mut rng).unwrap().name, "Grunt");
        }
        assert_eq!(pool.cheapest(), Some(10.0));
    }

    #[test]
    fn test_affordable_picks_every_card_eventually() {
        let pool = SpawnCardPool::new(vec![
            SpawnCard::new("Grunt", prototypes::MELEE_ENEMY, 10.0),
            SpawnCard::new("Archer", prototypes::RANGED_ENEMY, 25.0),
        ]);
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let archers = (0..100)
            .filter(|_| pool.affordable(100.0, &mut rng).unwrap().name == "Archer")
            .count();
        assert!(archers > 20 && archers < 80);
    }

    #[test]
    fn test_hull_radius() {
        assert_eq!(HullSize::Small.radius(), 0.5);
        assert_eq!(HullSize::Medium.radius(), 1.0);
        assert_eq!(HullSize::Large.radius(), 2.0);
    }
}
