//! StatusEffect и контейнер ActiveEffects

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Вид эффекта (ключ: не больше одного активного эффекта каждого вида)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Reflect, Serialize, Deserialize,
)]
pub enum StatusKind {
    /// Периодический урон damage_per_tick × stacks
    Bleed,
}

/// Стакающийся периодический эффект
///
/// Refresh: stacks = max(текущие, входящие), длительность заменяется.
/// Tick: duration -= dt, tick_timer += dt; срабатывает не чаще раза за update
/// (timer -= interval, остаток переносится).
#[derive(Debug, Clone, Copy, PartialEq, Reflect, Serialize, Deserialize)]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub stacks: u32,
    pub remaining_duration: f32,
    pub tick_interval: f32,
    pub tick_timer: f32,
    /// Величина на один стак за tick (урон для Bleed)
    pub magnitude: f32,
    /// Кто наложил (для EntityDied.killer)
    pub source: Option<Entity>,
}

impl StatusEffect {
    pub fn bleed(damage_per_tick: f32, tick_interval: f32, stacks: u32, duration: f32) -> Self {
        Self {
            kind: StatusKind::Bleed,
            stacks,
            remaining_duration: duration,
            tick_interval,
            tick_timer: 0.0,
            magnitude: damage_per_tick,
            source: None,
        }
    }

    pub fn with_source(mut self, source: Entity) -> Self {
        self.source = Some(source);
        self
    }

    pub fn refresh(&mut self, stacks: u32, duration: f32) {
        self.stacks = self.stacks.max(stacks);
        self.remaining_duration = duration;
    }

    /// Продвигает таймеры; true если на этом шаге был tick
    pub fn advance(&mut self, delta: f32) -> bool {
        self.remaining_duration -= delta;
        self.tick_timer += delta;

        if self.tick_timer >= self.tick_interval {
            self.tick_timer -= self.tick_interval;
            return true;
        }
        false
    }

    /// Величина одного tick'а с учётом стаков
    pub fn tick_amount(&self) -> f32 {
        self.magnitude * self.stacks as f32
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_duration <= 0.0
    }
}

/// Активные эффекты персонажа (kind → effect)
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct ActiveEffects {
    effects: BTreeMap<StatusKind, StatusEffect>,
}

impl ActiveEffects {
    /// Новый вид — вставка с обнулённым tick_timer, существующий — refresh
    pub fn apply(&mut self, mut effect: StatusEffect) {
        match self.effects.get_mut(&effect.kind) {
            Some(existing) => {
                existing.refresh(effect.stacks, effect.remaining_duration);
                if effect.source.is_some() {
                    existing.source = effect.source;
                }
            }
            None => {
                effect.tick_timer = 0.0;
                self.effects.insert(effect.kind, effect);
            }
        }
    }

    pub fn get(&self, kind: StatusKind) -> Option<&StatusEffect> {
        self.effects.get(&kind)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }

    /// Tick всех эффектов; истёкшие удаляются ПОСЛЕ своего tick'а
    ///
    /// Возвращает сработавшие на этом шаге эффекты (снимок после advance).
    pub fn tick(&mut self, delta: f32) -> Vec<StatusEffect> {
        let mut fired = Vec::new();
        for effect in self.effects.values_mut() {
            if effect.advance(delta) {
                fired.push(*effect);
            }
        }
        self.effects.retain(|_, effect| !effect.is_expired());
        fired
    }
}
