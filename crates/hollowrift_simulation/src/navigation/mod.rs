//! Navigation provider: NavAgent + walkable area
//!
//! Граница с navmesh. Headless реализация:
//! - `WalkableArea` — прямоугольник на плоскости (sample_nearest_walkable)
//! - `steer_nav_agents` — прямая к destination, clamp к walkable area
//!
//! AI пишет только `set_destination` / `stop`; кто реально ведёт агента — не его дело.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::Dead;
use crate::math::planar;
use crate::SimulationSet;

/// Агент навигации (kinematic: двигает Transform сам)
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct NavAgent {
    pub destination: Option<Vec3>,
    pub is_stopped: bool,
    /// m/s
    pub speed: f32,
    /// Текущая скорость (читается AI для упреждения)
    pub velocity: Vec3,
    pub stopping_distance: f32,
}

impl Default for NavAgent {
    fn default() -> Self {
        Self {
            destination: None,
            is_stopped: true,
            speed: 3.5,
            velocity: Vec3::ZERO,
            stopping_distance: 0.0,
        }
    }
}

impl NavAgent {
    pub fn new(speed: f32) -> Self {
        Self {
            speed,
            ..default()
        }
    }

    pub fn set_destination(&mut self, destination: Vec3) {
        self.destination = Some(destination);
        self.is_stopped = false;
    }

    pub fn stop(&mut self) {
        self.is_stopped = true;
        self.velocity = Vec3::ZERO;
    }

    pub fn is_moving(&self) -> bool {
        !self.is_stopped && self.velocity.length_squared() > 1e-6
    }
}

/// Walkable поверхность (прямоугольник XZ на высоте `height`)
#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WalkableArea {
    pub min: Vec2,
    pub max: Vec2,
    pub height: f32,
}

impl Default for WalkableArea {
    fn default() -> Self {
        Self {
            min: Vec2::splat(-100.0),
            max: Vec2::splat(100.0),
            height: 0.0,
        }
    }
}

impl WalkableArea {
    pub fn new(min: Vec2, max: Vec2, height: f32) -> Self {
        Self { min, max, height }
    }

    /// Ближайшая точка поверхности к `point` (без ограничения радиуса)
    pub fn clamp(&self, point: Vec3) -> Vec3 {
        Vec3::new(
            point.x.clamp(self.min.x, self.max.x),
            self.height,
            point.z.clamp(self.min.y, self.max.y),
        )
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.z >= self.min.y && point.z <= self.max.y
    }

    /// Ближайшая walkable точка в радиусе `radius` или None
    pub fn sample_nearest_walkable(&self, point: Vec3, radius: f32) -> Option<Vec3> {
        let nearest = self.clamp(point);
        (nearest.distance(point) <= radius).then_some(nearest)
    }
}

pub struct NavigationPlugin;

impl Plugin for NavigationPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<NavAgent>();

        app.add_systems(
            FixedUpdate,
            steer_nav_agents.in_set(SimulationSet::Movement),
        );
    }
}

/// Система: headless steering агентов
///
/// Прямая к destination со скоростью `speed`, поворот по направлению движения,
/// clamp к walkable area (если она есть).
pub fn steer_nav_agents(
    time: Res<Time>,
    area: Option<Res<WalkableArea>>,
    mut agents: Query<(&mut NavAgent, &mut Transform), Without<Dead>>,
) {
    let delta = time.delta_secs();
    if delta <= 0.0 {
        return;
    }

    for (mut agent, mut transform) in agents.iter_mut() {
        let Some(destination) = agent.destination else {
            agent.velocity = Vec3::ZERO;
            continue;
        };
        if agent.is_stopped {
            agent.velocity = Vec3::ZERO;
            continue;
        }

        let to_destination = planar(destination - transform.translation);
        let distance = to_destination.length();
        if distance <= agent.stopping_distance.max(0.01) {
            agent.velocity = Vec3::ZERO;
            continue;
        }

        let step = (agent.speed * delta).min(distance);
        let direction = to_destination / distance;
        let mut next = transform.translation + direction * step;
        if let Some(area) = area.as_ref() {
            let clamped = area.clamp(next);
            next.x = clamped.x;
            next.z = clamped.z;
        }

        agent.velocity = (next - transform.translation) / delta;
        transform.translation = next;

        if let Some(rotation) = crate::math::look_rotation(direction, Vec3::Y) {
            transform.rotation = rotation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_nearest_walkable_within_radius() {
        let area = WalkableArea::new(Vec2::splat(-10.0), Vec2::splat(10.0), 0.0);

        let inside = area.sample_nearest_walkable(Vec3::new(3.0, 1.0, 4.0), 2.0);
        assert_eq!(inside, Some(Vec3::new(3.0, 0.0, 4.0)));

        let edge = area.sample_nearest_walkable(Vec3::new(11.0, 0.0, 0.0), 2.0);
        assert_eq!(edge, Some(Vec3::new(10.0, 0.0, 0.0)));

        assert!(area.sample_nearest_walkable(Vec3::new(20.0, 0.0, 0.0), 2.0).is_none());
    }

    #[test]
    fn test_agent_stop_clears_velocity() {
        let mut agent = NavAgent::new(4.0);
        agent.set_destination(Vec3::X);
        agent.velocity = Vec3::X;
        assert!(agent.is_moving());

        agent.stop();
        assert!(!agent.is_moving());
        assert_eq!(agent.destination, Some(Vec3::X));
    }
}
