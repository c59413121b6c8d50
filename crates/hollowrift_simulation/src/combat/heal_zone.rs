//! HealZone: область, лечащая игрока пока он внутри
//!
//! Вход в зону → лечение сразу, дальше каждые `tick_interval` секунд.
//! Выход → таймер сбрасывается. Время жизни зоны — через pool (`DespawnAfter`).

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::{Dead, HealRequest};
use crate::components::Player;
use crate::pool::Dormant;

#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct HealZone {
    pub radius: f32,
    pub tick_interval: f32,
    pub heal_per_tick: f32,
    /// Игрок внутри зоны (None — пусто)
    #[serde(skip)]
    pub occupant: Option<Entity>,
    #[serde(skip)]
    pub timer: f32,
}

impl Default for HealZone {
    fn default() -> Self {
        Self {
            radius: 3.0,
            tick_interval: 1.0,
            heal_per_tick: 5.0,
            occupant: None,
            timer: 0.0,
        }
    }
}

impl HealZone {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            ..default()
        }
    }

    /// Продвигает зону на dt; true если в этот шаг нужно лечить
    ///
    /// `player` — игрок в радиусе зоны на этом шаге (None — никого).
    pub fn advance(&mut self, player: Option<Entity>, delta: f32) -> bool {
        match (self.occupant, player) {
            (_, None) => {
                self.occupant = None;
                self.timer = 0.0;
                false
            }
            (Some(current), Some(entity)) if current == entity => {
                self.timer -= delta;
                if self.timer <= 0.0 {
                    self.timer += self.tick_interval;
                    true
                } else {
                    false
                }
            }
            (_, Some(entity)) => {
                // Новый occupant: лечение сразу
                self.occupant = Some(entity);
                self.timer = self.tick_interval;
                true
            }
        }
    }
}

/// Система: лечение игроков внутри heal zones
pub fn tick_heal_zones(
    time: Res<Time>,
    mut zones: Query<(&Transform, &mut HealZone), Without<Dormant>>,
    players: Query<(Entity, &Transform), (With<Player>, Without<Dead>)>,
    mut heal_requests: EventWriter<HealRequest>,
) {
    let delta = time.delta_secs();

    for (zone_transform, mut zone) in zones.iter_mut() {
        let center = zone_transform.translation;
        let radius_sq = zone.radius * zone.radius;

        let inside = players
            .iter()
            .find(|(_, transform)| transform.translation.distance_squared(center) <= radius_sq)
            .map(|(entity, _)| entity);

        if zone.advance(inside, delta) {
            if let Some(target) = zone.occupant {
                heal_requests.write(HealRequest {
                    target,
                    amount: zone.heal_per_tick,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heals_on_enter_then_every_interval() {
        let player = Entity::from_raw(1);
        let mut zone = HealZone::default();

        assert!(zone.advance(Some(player), 0.25), "heal immediately on enter");

        let mut heals = 0;
        for _ in 0..8 {
            if zone.advance(Some(player), 0.25) {
                heals += 1;
            }
        }
        // 2 секунды внутри → ещё 2 тика
        assert_eq!(heals, 2);
    }

    #[test]
    fn test_leaving_resets() {
        let player = Entity::from_raw(1);
        let mut zone = HealZone::default();

        assert!(zone.advance(Some(player), 0.1));
        assert!(!zone.advance(None, 0.1));
        assert_eq!(zone.occupant, None);
        assert!(zone.advance(Some(player), 0.1), "re-enter heals immediately");
    }
}
