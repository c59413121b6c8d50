//! Реестр целей и выбор лучшей цели
//!
//! Реестр принадлежит миру (Resource), а не процессу: создаётся вместе с App,
//! умирает вместе с ним. Хранит только `Entity` — не владеет целями.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::faction::{are_hostile, Faction};

/// Бонус приманки — перекрывает любую разницу priority/distance
pub const LURE_SCORE_BONUS: f32 = 10_000.0;
pub const PRIORITY_SCORE_WEIGHT: f32 = 100.0;
pub const DISTANCE_SCORE_WEIGHT: f32 = 5.0;

/// Кандидаты ближе этого (sqr) считаются "самим собой"
pub const SELF_EXCLUSION_SQR: f32 = 0.01;

/// Цель для AI: фракция, приоритет, радиус притяжения, приманка
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct Targetable {
    pub faction: Faction,
    /// Выше = привлекательнее
    pub priority: i32,
    /// 0 = без ограничения
    pub max_attract_range: f32,
    /// Decoy/taunt: AI выбирает её почти всегда
    pub is_lure: bool,
}

impl Default for Targetable {
    fn default() -> Self {
        Self {
            faction: Faction::Enemy,
            priority: 0,
            max_attract_range: 0.0,
            is_lure: false,
        }
    }
}

impl Targetable {
    pub fn new(faction: Faction) -> Self {
        Self {
            faction,
            ..default()
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn lure(mut self) -> Self {
        self.is_lure = true;
        self
    }

    pub fn with_attract_range(mut self, range: f32) -> Self {
        self.max_attract_range = range;
        self
    }
}

/// Снимок цели на момент запроса
#[derive(Debug, Clone, Copy)]
pub struct TargetCandidate {
    pub position: Vec3,
    pub targetable: Targetable,
}

/// Реестр живых целей (insertion order = scan order)
#[derive(Resource, Debug, Default)]
pub struct TargetRegistry {
    entries: Vec<Entity>,
}

impl TargetRegistry {
    pub fn register(&mut self, entity: Entity) {
        if !self.entries.contains(&entity) {
            self.entries.push(entity);
        }
    }

    pub fn unregister(&mut self, entity: Entity) {
        self.entries.retain(|&e| e != entity);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.entries.contains(&entity)
    }

    /// Лучшая враждебная цель или None
    ///
    /// `lookup` возвращает None для уничтоженных/неактивных — такие записи
    /// вычищаются из реестра (cleanup на каждом запросе, O(n)).
    pub fn best_target<F>(
        &mut self,
        from: Vec3,
        seeker_faction: Faction,
        max_range: f32,
        mut lookup: F,
    ) -> Option<Entity>
    where
        F: FnMut(Entity) -> Option<TargetCandidate>,
    {
        let mut candidates = Vec::with_capacity(self.entries.len());
        self.entries.retain(|&entity| match lookup(entity) {
            Some(candidate) => {
                candidates.push((entity, candidate));
                true
            }
            None => false,
        });

        select_best_target(from, seeker_faction, max_range, &candidates)
    }
}

/// Score кандидата или None если он не подходит
///
/// Фильтры по порядку: сам себя, не враг, дальше max_range, дальше собственного
/// max_attract_range цели.
pub fn score_target(
    from: Vec3,
    seeker_faction: Faction,
    max_range: f32,
    candidate: &TargetCandidate,
) -> Option<f32> {
    let offset = candidate.position - from;
    if offset.length_squared() < SELF_EXCLUSION_SQR {
        return None;
    }

    let target = &candidate.targetable;
    if !are_hostile(seeker_faction, target.faction) {
        return None;
    }

    let distance = offset.length();
    if distance > max_range {
        return None;
    }
    if target.max_attract_range > 0.0 && distance > target.max_attract_range {
        return None;
    }

    let mut score = target.priority as f32 * PRIORITY_SCORE_WEIGHT;
    if target.is_lure {
        score += LURE_SCORE_BONUS;
    }
    score -= distance * DISTANCE_SCORE_WEIGHT;
    Some(score)
}

/// Линейный скан; при равенстве score побеждает первый
pub fn select_best_target(
    from: Vec3,
    seeker_faction: Faction,
    max_range: f32,
    candidates: &[(Entity, TargetCandidate)],
) -> Option<Entity> {
    let mut best: Option<(Entity, f32)> = None;

    for (entity, candidate) in candidates {
        let Some(score) = score_target(from, seeker_faction, max_range, candidate) else {
            continue;
        };
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((*entity, score)),
        }
    }

    best.map(|(entity, _)| entity)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(x: f32, targetable: Targetable) -> TargetCandidate {
        TargetCandidate {
            position: Vec3::new(x, 0.0, 0.0),
            targetable,
        }
    }

    fn entity(index: u32) -> Entity {
        Entity::from_raw(index)
    }

    #[test]
    fn test_closer_target_wins() {
        let candidates = [
            (entity(1), candidate(10.0, Targetable::new(Faction::Player))),
            (entity(2), candidate(5.0, Targetable::new(Faction::Player))),
        ];
        let best = select_best_target(Vec3::ZERO, Faction::Enemy, 50.0, &candidates);
        assert_eq!(best, Some(entity(2)));
    }

    #[test]
    fn test_lure_beats_priority_at_equal_distance() {
        for priority in [0, 1, 50, 99] {
            let candidates = [
                (
                    entity(1),
                    candidate(8.0, Targetable::new(Faction::Player).with_priority(priority)),
                ),
                (entity(2), candidate(8.0, Targetable::new(Faction::Ally).lure())),
            ];
            let best = select_best_target(Vec3::ZERO, Faction::Enemy, 50.0, &candidates);
            assert_eq!(best, Some(entity(2)), "priority {}", priority);
        }
    }

    #[test]
    fn test_tie_keeps_first_in_scan_order() {
        let candidates = [
            (entity(7), candidate(5.0, Targetable::new(Faction::Player))),
            (entity(3), candidate(-5.0, Targetable::new(Faction::Player))),
        ];
        let best = select_best_target(Vec3::ZERO, Faction::Enemy, 50.0, &candidates);
        assert_eq!(best, Some(entity(7)));
    }

    #[test]
    fn test_filters_self_friendly_and_out_of_range() {
        let candidates = [
            // Сам себя (та же позиция)
            (entity(1), candidate(0.05, Targetable::new(Faction::Player))),
            // Союзник
            (entity(2), candidate(3.0, Targetable::new(Faction::Enemy))),
            // Дальше max_range
            (entity(3), candidate(60.0, Targetable::new(Faction::Player))),
            // Дальше собственного attract range
            (
                entity(4),
                candidate(20.0, Targetable::new(Faction::Player).with_attract_range(10.0)),
            ),
        ];
        let best = select_best_target(Vec3::ZERO, Faction::Enemy, 50.0, &candidates);
        assert_eq!(best, None);
    }

    #[test]
    fn test_registry_deduplicates_and_cleans_up() {
        let mut registry = TargetRegistry::default();
        registry.register(entity(1));
        registry.register(entity(1));
        registry.register(entity(2));
        assert_eq!(registry.len(), 2);

        // entity(1) "уничтожен" — lookup возвращает None
        let best = registry.best_target(Vec3::ZERO, Faction::Enemy, 50.0, |e| {
            (e == entity(2)).then(|| candidate(4.0, Targetable::new(Faction::Player)))
        });

        assert_eq!(best, Some(entity(2)));
        assert_eq!(registry.len(), 1);
        assert!(!registry.contains(entity(1)));
    }

    #[test]
    fn test_lure_far_beats_priority_near() {
        let candidates = [
            (
                entity(1),
                candidate(20.0, Targetable::new(Faction::Player).with_priority(5)),
            ),
            (entity(2), candidate(40.0, Targetable::new(Faction::Player).lure())),
        ];
        let best = select_best_target(Vec3::ZERO, Faction::Enemy, 50.0, &candidates);
        assert_eq!(best, Some(entity(2)));
    }
}
