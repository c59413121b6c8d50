//! AI атаки: strategy enum вместо иерархии (melee cone, projectile с упреждением)

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Melee: урон только текущей цели внутри range и конуса
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeAttack {
    pub damage: f32,
    pub range: f32,
    /// Полный угол конуса (градусы)
    pub hit_angle: f32,
}

impl Default for MeleeAttack {
    fn default() -> Self {
        Self {
            damage: 15.0,
            range: 2.0,
            hit_angle: 60.0,
        }
    }
}

impl MeleeAttack {
    /// Цель внутри конуса перед агентом (forward = −Z)
    pub fn in_cone(&self, agent: &Transform, target_position: Vec3) -> bool {
        let Some(to_target) = (target_position - agent.translation).try_normalize() else {
            return true;
        };
        let angle = agent.forward().as_vec3().angle_between(to_target).to_degrees();
        angle <= self.hit_angle * 0.5
    }
}

/// Projectile: pooled снаряд, опциональное упреждение по скорости цели
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileAttack {
    pub speed: f32,
    pub damage: f32,
    pub aim_height: f32,
    /// Точка вылета относительно агента (локальные оси)
    pub muzzle_offset: Vec3,
    pub use_leading: bool,
}

impl Default for ProjectileAttack {
    fn default() -> Self {
        Self {
            speed: 25.0,
            damage: 10.0,
            aim_height: 1.0,
            muzzle_offset: Vec3::new(0.0, 1.2, -0.6),
            use_leading: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub enum AttackKind {
    Melee(MeleeAttack),
    Projectile(ProjectileAttack),
}

/// Атака + её независимый cooldown
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub struct AiAttack {
    pub kind: AttackKind,
    pub cooldown: f32,
    #[serde(skip)]
    pub timer: f32,
}

impl AiAttack {
    pub const DEFAULT_COOLDOWN: f32 = 1.2;

    pub fn melee(melee: MeleeAttack) -> Self {
        Self {
            kind: AttackKind::Melee(melee),
            cooldown: Self::DEFAULT_COOLDOWN,
            timer: 0.0,
        }
    }

    pub fn projectile(projectile: ProjectileAttack) -> Self {
        Self {
            kind: AttackKind::Projectile(projectile),
            cooldown: Self::DEFAULT_COOLDOWN,
            timer: 0.0,
        }
    }

    pub fn with_cooldown(mut self, cooldown: f32) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn tick(&mut self, delta: f32) {
        self.timer = (self.timer - delta).max(0.0);
    }

    pub fn is_ready(&self) -> bool {
        self.timer <= 0.0
    }

    pub fn trigger_cooldown(&mut self) {
        self.timer = self.cooldown;
    }

    /// Готова и применима к цели на дистанции `distance`
    ///
    /// Melee требует цель в своём range; projectile — только наличие цели.
    pub fn can_use(&self, distance: Option<f32>) -> bool {
        if !self.is_ready() {
            return false;
        }
        let Some(distance) = distance else {
            return false;
        };
        match self.kind {
            AttackKind::Melee(melee) => distance <= melee.range,
            AttackKind::Projectile(_) => true,
        }
    }
}

/// Набор атак агента (порядок объявления = приоритет)
#[derive(Component, Debug, Clone, Default, PartialEq, Reflect, Serialize, Deserialize)]
#[reflect(Component)]
pub struct AiAttacks(pub Vec<AiAttack>);

impl AiAttacks {
    pub fn new(attacks: impl IntoIterator<Item = AiAttack>) -> Self {
        Self(attacks.into_iter().collect())
    }

    pub fn tick(&mut self, delta: f32) {
        for attack in self.0.iter_mut() {
            attack.tick(delta);
        }
    }

    pub fn any_ready(&self, distance: Option<f32>) -> bool {
        self.0.iter().any(|attack| attack.can_use(distance))
    }

    /// Первая готовая атака в порядке объявления
    pub fn first_ready(&self, distance: Option<f32>) -> Option<usize> {
        self.0.iter().position(|attack| attack.can_use(distance))
    }
}
