//! Physics query provider: raycast + overlap
//!
//! Граница с физическим движком. Два источника геометрии объединяются:
//! - rapier context (если `RapierPhysicsPlugin` добавлен)
//! - headless proxy: `FlatGround` плоскость + сферы `HeadlessCollider`
//!
//! Для каждого запроса берётся ближайшее попадание из обоих источников, поэтому
//! одна и та же логика AI/контроллера работает и в игре, и в headless тестах.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy_rapier3d::prelude::{Collider, CollisionGroups, Group, QueryFilter, ReadRapierContext};

use super::collision::{GROUP_TERRAIN, GROUP_WORLD};
use crate::pool::Dormant;

/// Результат raycast
///
/// `entity` = None для `FlatGround` (у плоскости нет entity).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub entity: Option<Entity>,
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
}

/// Физические запросы, которые нужны симуляции
pub trait PhysicsQueries {
    /// Ближайшее попадание луча по группам `mask`, `exclude` игнорируется
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: Group,
        exclude: Option<Entity>,
    ) -> Option<RayHit>;

    /// Entities чьи коллайдеры пересекают сферу (отсортированы по Entity)
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: Group) -> Vec<Entity>;

    /// То же для вертикальной/произвольной капсулы `a`–`b`
    fn overlap_capsule(&self, a: Vec3, b: Vec3, radius: f32, mask: Group) -> Vec<Entity>;
}

/// Бесконечная горизонтальная плоскость земли (headless, группа Terrain)
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct FlatGround {
    pub height: f32,
}

impl Default for FlatGround {
    fn default() -> Self {
        Self { height: 0.0 }
    }
}

/// Сферический proxy-коллайдер для headless запросов
///
/// Membership берётся из `CollisionGroups` (без него — World).
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct HeadlessCollider {
    pub radius: f32,
}

impl HeadlessCollider {
    pub fn new(radius: f32) -> Self {
        Self { radius }
    }
}

/// Пересечение луча со сферой (direction нормализован)
///
/// Луч, стартующий внутри сферы, попадает в точку старта (distance 0).
pub fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let offset = origin - center;
    let c = offset.length_squared() - radius * radius;
    if c <= 0.0 {
        return Some(0.0);
    }

    let b = offset.dot(direction);
    if b > 0.0 {
        return None;
    }

    let discriminant = b * b - c;
    if discriminant < 0.0 {
        return None;
    }
    Some(-b - discriminant.sqrt())
}

/// Ближайшая к `point` точка отрезка `a`–`b`
pub fn closest_point_on_segment(point: Vec3, a: Vec3, b: Vec3) -> Vec3 {
    let segment = b - a;
    let length_squared = segment.length_squared();
    if length_squared <= f32::EPSILON {
        return a;
    }
    let t = ((point - a).dot(segment) / length_squared).clamp(0.0, 1.0);
    a + segment * t
}

/// Пересечение луча с горизонтальной плоскостью сверху
pub fn ray_ground(origin: Vec3, direction: Vec3, height: f32) -> Option<f32> {
    if direction.y >= -f32::EPSILON || origin.y < height {
        return None;
    }
    Some((origin.y - height) / -direction.y)
}

fn closer(a: Option<RayHit>, b: Option<RayHit>) -> Option<RayHit> {
    match (a, b) {
        (Some(a), Some(b)) => Some(if b.distance < a.distance { b } else { a }),
        (a, None) => a,
        (None, b) => b,
    }
}

/// SystemParam: rapier context + headless proxy геометрия
#[derive(SystemParam)]
pub struct PhysicsWorld<'w, 's> {
    rapier: ReadRapierContext<'w, 's>,
    ground: Option<Res<'w, FlatGround>>,
    proxies: Query<
        'w,
        's,
        (
            Entity,
            &'static Transform,
            &'static HeadlessCollider,
            Option<&'static CollisionGroups>,
        ),
        Without<Dormant>,
    >,
}

impl PhysicsWorld<'_, '_> {
    /// Есть ли rapier context (иначе — чисто headless режим)
    pub fn has_rapier(&self) -> bool {
        self.rapier.single().is_ok()
    }

    fn proxy_membership(groups: Option<&CollisionGroups>) -> Group {
        groups.map_or(GROUP_WORLD, |g| g.memberships)
    }

    fn rapier_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: Group,
        exclude: Option<Entity>,
    ) -> Option<RayHit> {
        let context = self.rapier.single().ok()?;

        let mut filter = QueryFilter::new()
            .exclude_sensors()
            .groups(CollisionGroups::new(Group::ALL, mask));
        if let Some(entity) = exclude {
            filter = filter.exclude_collider(entity).exclude_rigid_body(entity);
        }

        let (entity, hit) =
            context.cast_ray_and_get_normal(origin, direction, max_distance, true, filter)?;
        Some(RayHit {
            entity: Some(entity),
            point: hit.point,
            normal: hit.normal,
            distance: hit.time_of_impact,
        })
    }

    fn ground_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: Group,
    ) -> Option<RayHit> {
        let ground = self.ground.as_ref()?;
        if !mask.intersects(GROUP_TERRAIN) {
            return None;
        }

        let distance = ray_ground(origin, direction, ground.height)?;
        (distance <= max_distance).then(|| RayHit {
            entity: None,
            point: origin + direction * distance,
            normal: Vec3::Y,
            distance,
        })
    }

    fn proxy_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: Group,
        exclude: Option<Entity>,
    ) -> Option<RayHit> {
        let mut best: Option<RayHit> = None;

        for (entity, transform, collider, groups) in self.proxies.iter() {
            if Some(entity) == exclude || !Self::proxy_membership(groups).intersects(mask) {
                continue;
            }

            let center = transform.translation;
            let Some(distance) = ray_sphere(origin, direction, center, collider.radius) else {
                continue;
            };
            if distance > max_distance {
                continue;
            }

            let point = origin + direction * distance;
            let normal = (point - center).try_normalize().unwrap_or(-direction);
            best = closer(
                best,
                Some(RayHit {
                    entity: Some(entity),
                    point,
                    normal,
                    distance,
                }),
            );
        }

        best
    }
}

impl PhysicsQueries for PhysicsWorld<'_, '_> {
    fn cast_ray(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: Group,
        exclude: Option<Entity>,
    ) -> Option<RayHit> {
        let direction = direction.try_normalize()?;
        if max_distance <= 0.0 {
            return None;
        }

        let hit = self.rapier_ray(origin, direction, max_distance, mask, exclude);
        let hit = closer(hit, self.ground_ray(origin, direction, max_distance, mask));
        closer(
            hit,
            self.proxy_ray(origin, direction, max_distance, mask, exclude),
        )
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: Group) -> Vec<Entity> {
        let mut found = Vec::new();

        if let Ok(context) = self.rapier.single() {
            let shape = Collider::ball(radius);
            let filter = QueryFilter::new()
                .exclude_sensors()
                .groups(CollisionGroups::new(Group::ALL, mask));
            context.intersections_with_shape(center, Quat::IDENTITY, &shape, filter, |entity| {
                found.push(entity);
                true
            });
        }

        for (entity, transform, collider, groups) in self.proxies.iter() {
            if !Self::proxy_membership(groups).intersects(mask) {
                continue;
            }
            let reach = radius + collider.radius;
            if transform.translation.distance_squared(center) <= reach * reach {
                found.push(entity);
            }
        }

        found.sort();
        found.dedup();
        found
    }

    fn overlap_capsule(&self, a: Vec3, b: Vec3, radius: f32, mask: Group) -> Vec<Entity> {
        let mut found = Vec::new();
        let center = (a + b) * 0.5;

        if let Ok(context) = self.rapier.single() {
            let shape = Collider::capsule(a - center, b - center, radius);
            let filter = QueryFilter::new()
                .exclude_sensors()
                .groups(CollisionGroups::new(Group::ALL, mask));
            context.intersections_with_shape(center, Quat::IDENTITY, &shape, filter, |entity| {
                found.push(entity);
                true
            });
        }

        for (entity, transform, collider, groups) in self.proxies.iter() {
            if !Self::proxy_membership(groups).intersects(mask) {
                continue;
            }
            let reach = radius + collider.radius;
            let nearest = closest_point_on_segment(transform.translation, a, b);
            if transform.translation.distance_squared(nearest) <= reach * reach {
                found.push(entity);
            }
        }

        found.sort();
        found.dedup();
        found
    }
}
