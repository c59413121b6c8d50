//! Эмиттеры способностей: strategy enum + runtime компоненты
//!
//! Конфиг эмиттера живёт в Ability; состояние, которое переживает tick
//! (рывок, призванные), — отдельными компонентами на владельце.

use bevy::prelude::*;
use bevy_rapier3d::prelude::CollisionGroups;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use super::forms::FormKind;

/// Melee: сфера radius = range × radius_multiplier в fire point
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeEmitter {
    pub radius_multiplier: f32,
    /// Fire point в локальных осях владельца
    pub offset: Vec3,
}

impl Default for MeleeEmitter {
    fn default() -> Self {
        Self {
            radius_multiplier: 2.0,
            offset: Vec3::new(0.0, 1.0, -1.0),
        }
    }
}

/// Projectile: pooled снаряд, дальность range × base_range
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileEmitter {
    pub launch_speed: f32,
    pub base_range: f32,
    pub offset: Vec3,
}

impl Default for ProjectileEmitter {
    fn default() -> Self {
        Self {
            launch_speed: 25.0,
            base_range: 10.0,
            offset: Vec3::new(0.3, 1.4, -0.6),
        }
    }
}

/// Hitscan: луч base_range × range, первое враждебное попадание
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct HitscanEmitter {
    pub base_range: f32,
    /// Период урона в continuous режиме (primary зажат)
    pub tick_interval: f32,
    pub offset: Vec3,
}

impl Default for HitscanEmitter {
    fn default() -> Self {
        Self {
            base_range: 100.0,
            tick_interval: 0.1,
            offset: Vec3::new(0.3, 1.4, -0.6),
        }
    }
}

/// Blink: рывок сквозь врагов
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct BlinkEmitter {
    pub distance: f32,
    pub duration: f32,
    pub extension_multiplier: f32,
    pub hit_radius: f32,
    pub hit_height: f32,
    pub lock_control: bool,
}

impl Default for BlinkEmitter {
    fn default() -> Self {
        Self {
            distance: 8.0,
            duration: 0.08,
            extension_multiplier: 1.0,
            hit_radius: 0.75,
            hit_height: 1.8,
            lock_control: true,
        }
    }
}

impl BlinkEmitter {
    pub fn speed(&self) -> f32 {
        self.distance / self.duration.max(0.0001)
    }
}

/// Summon: призыв союзников из pool'а
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct SummonEmitter {
    pub all_at_once: bool,
    pub max_active: usize,
    pub spawn_distance: f32,
    /// Случайный разброс точки вокруг spawn_distance
    pub spawn_radius: f32,
    pub duration: f32,
    pub replace_oldest: bool,
    pub sample_radius: f32,
    pub fallback_distance: f32,
}

impl Default for SummonEmitter {
    fn default() -> Self {
        Self {
            all_at_once: false,
            max_active: 1,
            spawn_distance: 2.5,
            spawn_radius: 1.0,
            duration: 10.0,
            replace_oldest: true,
            sample_radius: 2.0,
            fallback_distance: 1.5,
        }
    }
}

/// Transform: временная форма
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformEmitter {
    pub form: FormKind,
    pub blend: f32,
    pub duration: f32,
}

impl Default for TransformEmitter {
    fn default() -> Self {
        Self {
            form: FormKind::Alternate,
            blend: 0.25,
            duration: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub enum Emitter {
    Melee(MeleeEmitter),
    Projectile(ProjectileEmitter),
    Hitscan(HitscanEmitter),
    Blink(BlinkEmitter),
    Summon(SummonEmitter),
    Transform(TransformEmitter),
}

impl Default for Emitter {
    fn default() -> Self {
        Self::Melee(MeleeEmitter::default())
    }
}

impl Emitter {
    /// Стреляет сразу при нажатии, без атаки (activity нулевой длины или рывок)
    pub fn is_instant(&self) -> bool {
        matches!(self, Self::Transform(_) | Self::Blink(_) | Self::Summon(_))
    }

    /// Период continuous огня (только hitscan)
    pub fn continuous_interval(&self) -> Option<f32> {
        match self {
            Self::Hitscan(hitscan) => Some(hitscan.tick_interval.max(0.0)),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Melee(_) => "melee",
            Self::Projectile(_) => "projectile",
            Self::Hitscan(_) => "hitscan",
            Self::Blink(_) => "blink",
            Self::Summon(_) => "summon",
            Self::Transform(_) => "transform",
        }
    }
}

/// Активный рывок (есть компонент — идёт рывок)
#[derive(Component, Debug, Clone, PartialEq)]
pub struct BlinkDash {
    pub slot: usize,
    pub direction: Vec3,
    pub speed: f32,
    pub remaining: f32,
    pub extension: f32,
    pub extended: bool,
    pub hit_radius: f32,
    pub hit_height: f32,
    pub lock_control: bool,
    /// Каждый враг получает урон один раз за рывок
    pub hit: Vec<Entity>,
    /// Группы до рывка (восстанавливаются в конце)
    pub restore_groups: Option<CollisionGroups>,
    /// Рывок закончен (дистанция) или отменён (stop_fire)
    pub finished: bool,
}

impl BlinkDash {
    pub fn new(slot: usize, emitter: &BlinkEmitter, direction: Vec3) -> Self {
        Self {
            slot,
            direction,
            speed: emitter.speed(),
            remaining: emitter.distance,
            extension: emitter.distance * emitter.extension_multiplier,
            extended: false,
            hit_radius: emitter.hit_radius,
            hit_height: emitter.hit_height,
            lock_control: emitter.lock_control,
            hit: Vec::new(),
            restore_groups: None,
            finished: false,
        }
    }

    /// Продвигает рывок на dt
    pub fn advance(&mut self, delta: f32) {
        self.remaining -= self.speed * delta;
        if self.remaining <= 0.0 {
            self.finished = true;
        }
    }

    /// Новые попадания; первое попадание за рывок продлевает его один раз
    pub fn register_hits(&mut self, candidates: impl IntoIterator<Item = Entity>) -> Vec<Entity> {
        let mut fresh = Vec::new();
        for entity in candidates {
            if self.hit.contains(&entity) {
                continue;
            }
            self.hit.push(entity);
            fresh.push(entity);
        }

        if !fresh.is_empty() && !self.extended {
            self.extended = true;
            self.remaining += self.extension;
            self.finished = self.remaining <= 0.0;
        }
        fresh
    }
}

/// Призванные владельцем (старые первыми)
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct SummonTracker {
    pub active: VecDeque<Entity>,
}

/// Призванный союзник: живёт `lifetime`, потом исчезает (fade)
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Summon {
    pub owner: Entity,
    pub lifetime: f32,
    pub age: f32,
    pub fading: bool,
}

impl Summon {
    pub fn new(owner: Entity, lifetime: f32) -> Self {
        Self {
            owner,
            lifetime,
            age: 0.0,
            fading: false,
        }
    }
}

/// Fade призванного: задержка + растворение, потом возврат в pool
pub const SUMMON_FADE_TIME: f32 = 1.0 + 0.4;
