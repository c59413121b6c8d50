//! Spawn nodes: точки вокруг последней walkable позиции игрока
//!
//! Узлы строятся один раз (или после `clear`) вокруг anchor. Валидность
//! проверяется на каждый запрос: свободное место под hull, дистанция,
//! невидимость для наблюдателя.

use bevy::prelude::*;
use rand::Rng;
use std::f32::consts::TAU;
use thiserror::Error;

use super::cards::SpawnCard;
use crate::math::planar;
use crate::navigation::WalkableArea;
use crate::physics::collision::{GROUP_WORLD, MASK_LOS_BLOCK};
use crate::physics::PhysicsQueries;

/// Радиус поиска walkable точки под игроком
pub const ANCHOR_SAMPLE_RADIUS: f32 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PlacementError {
    #[error("no walkable point near the spawn anchor")]
    NoWalkablePoint,
    #[error("no spawn node satisfies the card constraints")]
    NoValidNode,
    #[error("no free flat ground for a chest")]
    NoChestPosition,
}

#[derive(Resource, Debug, Clone, PartialEq)]
pub struct SpawnNodeSet {
    pub nodes: Vec<Vec3>,
    /// Последняя walkable позиция игрока
    pub anchor: Option<Vec3>,
    pub node_count: usize,
    pub sample_radius: f32,
}

impl Default for SpawnNodeSet {
    fn default() -> Self {
        Self::new(300, 100.0)
    }
}

impl SpawnNodeSet {
    pub fn new(node_count: usize, sample_radius: f32) -> Self {
        Self {
            nodes: Vec::new(),
            anchor: None,
            node_count,
            sample_radius,
        }
    }

    /// Обновляет anchor; вне walkable area anchor остаётся прежним
    pub fn update_anchor(&mut self, area: &WalkableArea, player: Vec3) -> Result<Vec3, PlacementError> {
        match area.sample_nearest_walkable(player, ANCHOR_SAMPLE_RADIUS) {
            Some(point) => {
                self.anchor = Some(point);
                Ok(point)
            }
            None => self.anchor.ok_or(PlacementError::NoWalkablePoint),
        }
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn is_built(&self) -> bool {
        !self.nodes.is_empty()
    }

    /// Случайные walkable точки вокруг anchor (попыток ≤ count × 10)
    pub fn build(&mut self, area: &WalkableArea, rng: &mut impl Rng) -> Result<usize, PlacementError> {
        let anchor = self.anchor.ok_or(PlacementError::NoWalkablePoint)?;
        self.nodes.clear();

        let max_attempts = self.node_count * 10;
        let mut attempts = 0;
        while self.nodes.len() < self.node_count && attempts < max_attempts {
            attempts += 1;
            let offset = planar(random_in_unit_sphere(rng) * self.sample_radius);
            if let Some(point) = area.sample_nearest_walkable(anchor + offset, self.sample_radius) {
                self.nodes.push(point);
            }
        }

        crate::logger::log(&format!(
            "🗺️ Built {} spawn nodes around {:.1?} ({} attempts)",
            self.nodes.len(),
            anchor,
            attempts
        ));
        Ok(self.nodes.len())
    }

    /// Случайный валидный узел для карты
    ///
    /// `observer` — глаз наблюдателя; None — проверка видимости пропускается.
    pub fn valid_node(
        &self,
        card: &SpawnCard,
        physics: &impl PhysicsQueries,
        observer: Option<Vec3>,
        rng: &mut impl Rng,
    ) -> Result<Vec3, PlacementError> {
        let anchor = self.anchor.ok_or(PlacementError::NoWalkablePoint)?;
        if card.is_flying {
            return Ok(self.flying_node(anchor, card, rng));
        }

        let radius = card.hull.radius();
        let valid: Vec<Vec3> = self
            .nodes
            .iter()
            .copied()
            .filter(|node| physics.overlap_sphere(*node, radius, GROUP_WORLD).is_empty())
            .filter(|node| card.in_distance(planar(*node - anchor).length()))
            .filter(|node| {
                !card.hide_from_observer
                    || observer.map_or(true, |eye| !is_visible_from(physics, eye, *node))
            })
            .collect();

        if valid.is_empty() {
            return Err(PlacementError::NoValidNode);
        }
        Ok(valid[rng.gen_range(0..valid.len())])
    }

    /// Летающие: точка на кольце [min, max] вокруг anchor на высоте air_height
    fn flying_node(&self, anchor: Vec3, card: &SpawnCard, rng: &mut impl Rng) -> Vec3 {
        let angle = rng.gen_range(0.0..TAU);
        let distance = if card.max_distance > card.min_distance {
            rng.gen_range(card.min_distance..card.max_distance)
        } else {
            card.min_distance
        };
        anchor + Vec3::new(angle.cos() * distance, card.air_height, angle.sin() * distance)
    }
}

/// Узел виден наблюдателю: луч глаз → узел (+1 м) ничем не перекрыт
pub fn is_visible_from(physics: &impl PhysicsQueries, eye: Vec3, node: Vec3) -> bool {
    let target = node + Vec3::Y;
    let direction = target - eye;
    let distance = direction.length();
    if distance < 0.01 {
        return true;
    }
    physics
        .cast_ray(eye, direction, distance, MASK_LOS_BLOCK, None)
        .is_none()
}

fn random_in_unit_sphere(rng: &mut impl Rng) -> Vec3 {
    loop {
        let candidate = Vec3::new(
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
            rng.gen_range(-1.0..=1.0),
        );
        if candidate.length_squared() <= 1.0 {
            return candidate;
        }
    }
}
