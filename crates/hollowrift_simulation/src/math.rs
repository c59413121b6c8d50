//! Векторная/кватернионная математика для контроллера и AI
//!
//! Всё здесь — чистые функции без side effects (детерминизм при одинаковых входах).
//! Вырожденные входы (нулевые векторы, почти равные скорости) решаются через epsilon fallback,
//! деления на ноль нет.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Порог |a| в lead solve, ниже — скорости считаем равными
pub const LEAD_EPSILON: f32 = 0.0001;

/// Кратчайший поворот из `b` в `a` (a * b⁻¹ с выбором полусферы)
///
/// Кватернионы q и -q задают один поворот; без проверки знака torsion-spring
/// иногда крутит персонажа "длинной дорогой" (> 180°).
pub fn shortest_rotation(a: Quat, b: Quat) -> Quat {
    if a.dot(b) < 0.0 {
        a * (-b).inverse()
    } else {
        a * b.inverse()
    }
}

/// Угол (радианы) и нормализованная ось поворота
///
/// Для identity возвращает (0, X) — ось не важна при нулевом угле.
pub fn angle_axis(rotation: Quat) -> (f32, Vec3) {
    let (axis, angle) = rotation.normalize().to_axis_angle();
    let axis = axis.normalize_or_zero();
    if axis == Vec3::ZERO {
        return (0.0, Vec3::X);
    }
    (angle, axis)
}

/// Двигает `current` к `target` не дальше чем на `max_delta`
pub fn move_towards(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let delta = target - current;
    let distance = delta.length();
    if distance <= max_delta || distance < f32::EPSILON {
        target
    } else {
        current + delta / distance * max_delta
    }
}

pub fn move_towards_f32(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

/// Горизонтальная проекция (y = 0)
pub fn planar(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Rotation, у которой forward (-Z в Bevy) смотрит вдоль `direction`
///
/// None для нулевого направления (вызывающий оставляет текущий поворот).
pub fn look_rotation(direction: Vec3, up: Vec3) -> Option<Quat> {
    let forward = direction.try_normalize()?;
    if forward.cross(up).length_squared() < 1e-8 {
        return None;
    }
    Some(Transform::IDENTITY.looking_to(forward, up).rotation)
}

/// Направление упреждающего выстрела по линейно экстраполированной цели
///
/// Решаем |toTarget + v·t| = s·t:
/// a = |v|² − s², b = 2·(v·toTarget), c = |toTarget|².
/// Fallback на прямое направление: |a| < eps, дискриминант < 0, оба корня < 0.
pub fn lead_direction(
    shooter_pos: Vec3,
    target_pos: Vec3,
    target_velocity: Vec3,
    projectile_speed: f32,
) -> Vec3 {
    let to_target = target_pos - shooter_pos;
    let direct = to_target.normalize_or_zero();

    let a = target_velocity.dot(target_velocity) - projectile_speed * projectile_speed;
    let b = 2.0 * target_velocity.dot(to_target);
    let c = to_target.dot(to_target);

    if a.abs() < LEAD_EPSILON {
        return direct;
    }

    let discriminant = b * b - 4.0 * a * c;
    if discriminant < 0.0 {
        return direct;
    }

    let sqrt = discriminant.sqrt();
    let t1 = (-b - sqrt) / (2.0 * a);
    let t2 = (-b + sqrt) / (2.0 * a);

    // Наименьший неотрицательный корень
    let mut t = t1.min(t2);
    if t < 0.0 {
        t = t1.max(t2);
    }
    if t < 0.0 {
        return direct;
    }

    let aim_point = target_pos + target_velocity * t;
    let aim = (aim_point - shooter_pos).normalize_or_zero();
    if aim == Vec3::ZERO {
        direct
    } else {
        aim
    }
}

/// Кусочно-линейная кривая (замена AnimationCurve из редактора)
///
/// Ключи отсортированы по x; за пределами — clamp к крайним значениям.
#[derive(Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
pub struct ResponseCurve {
    pub keys: Vec<(f32, f32)>,
}

impl ResponseCurve {
    pub fn constant(value: f32) -> Self {
        Self {
            keys: vec![(0.0, value)],
        }
    }

    pub fn new(mut keys: Vec<(f32, f32)>) -> Self {
        keys.sort_by(|a, b| a.0.total_cmp(&b.0));
        Self { keys }
    }

    pub fn evaluate(&self, x: f32) -> f32 {
        let Some(&(first_x, first_y)) = self.keys.first() else {
            return 1.0;
        };
        if x <= first_x {
            return first_y;
        }

        for window in self.keys.windows(2) {
            let (x0, y0) = window[0];
            let (x1, y1) = window[1];
            if x <= x1 {
                let span = x1 - x0;
                if span <= f32::EPSILON {
                    return y1;
                }
                return y0 + (y1 - y0) * (x - x0) / span;
            }
        }

        self.keys.last().map(|&(_, y)| y).unwrap_or(1.0)
    }
}

impl Default for ResponseCurve {
    fn default() -> Self {
        Self::constant(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: Vec3, b: Vec3) -> bool {
        (a - b).length() < 1e-4
    }

    #[test]
    fn test_lead_stationary_target_is_direct() {
        let shooter = Vec3::new(1.0, 2.0, 3.0);
        let target = Vec3::new(10.0, 2.0, -4.0);
        let direct = (target - shooter).normalize();

        for speed in [0.5, 5.0, 25.0, 300.0] {
            let dir = lead_direction(shooter, target, Vec3::ZERO, speed);
            assert!(approx(dir, direct), "speed {} → {:?}", speed, dir);
        }
    }

    #[test]
    fn test_lead_equal_speeds_falls_back_to_direct() {
        let shooter = Vec3::ZERO;
        let target = Vec3::new(0.0, 0.0, -20.0);
        let velocity = Vec3::new(10.0, 0.0, 0.0);

        let dir = lead_direction(shooter, target, velocity, 10.0);
        assert!(dir.is_finite());
        assert!(approx(dir, Vec3::NEG_Z));
    }

    #[test]
    fn test_lead_no_intercept_falls_back_to_direct() {
        // Цель убегает быстрее снаряда — пересечения нет
        let dir = lead_direction(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), Vec3::new(50.0, 0.0, 0.0), 5.0);
        assert!(approx(dir, Vec3::X));
    }

    #[test]
    fn test_lead_hits_moving_target() {
        let shooter = Vec3::ZERO;
        let target = Vec3::new(0.0, 0.0, -20.0);
        let velocity = Vec3::new(5.0, 0.0, 0.0);
        let speed = 25.0;

        let dir = lead_direction(shooter, target, velocity, speed);
        assert!(dir.x > 0.0, "должны целиться с упреждением вправо");

        // Проверяем что снаряд и цель встречаются: решаем t по оси Z
        let t = 20.0 / (-dir.z * speed);
        let projectile = dir * speed * t;
        let target_at_t = target + velocity * t;
        assert!((projectile - target_at_t).length() < 1e-2);
    }

    #[test]
    fn test_lead_same_position_no_nan() {
        let dir = lead_direction(Vec3::ONE, Vec3::ONE, Vec3::ZERO, 10.0);
        assert_eq!(dir, Vec3::ZERO);
    }

    #[test]
    fn test_shortest_rotation_picks_short_path() {
        let a = Quat::from_rotation_y(0.3);
        let b = -Quat::from_rotation_y(0.1); // тот же поворот, другая полусфера
        let (angle, _) = angle_axis(shortest_rotation(a, b));
        assert!((angle - 0.2).abs() < 1e-4, "angle = {}", angle);
    }

    #[test]
    fn test_move_towards_clamps() {
        let v = move_towards(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), 3.0);
        assert!(approx(v, Vec3::new(3.0, 0.0, 0.0)));
        let v = move_towards(Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0), 3.0);
        assert!(approx(v, Vec3::X));
    }

    #[test]
    fn test_response_curve_interpolates_and_clamps() {
        let curve = ResponseCurve::new(vec![(1.0, 1.0), (-1.0, 2.0)]);
        assert_eq!(curve.evaluate(-5.0), 2.0);
        assert_eq!(curve.evaluate(5.0), 1.0);
        assert!((curve.evaluate(0.0) - 1.5).abs() < 1e-6);
    }

    #[test]
    fn test_look_rotation_faces_direction() {
        let rotation = look_rotation(Vec3::X, Vec3::Y).unwrap();
        assert!(approx(rotation * Vec3::NEG_Z, Vec3::X));
        assert!(look_rotation(Vec3::ZERO, Vec3::Y).is_none());
    }
}
