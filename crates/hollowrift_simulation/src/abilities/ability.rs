//! Ability + 4-слотовый набор Abilities
//!
//! Слот 0 — primary (hold-to-repeat), слоты 1..3 — активные способности.
//! Анимационные события заменены `fire_point`: доля activity, на которой
//! эмиттер стреляет.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::emitters::{Emitter, SummonTracker};

/// Максимум слотов
pub const ABILITY_SLOTS: usize = 4;
/// Задержка конца strafe после атаки
pub const STRAFE_RELEASE_DELAY: f32 = 0.25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AbilityError {
    #[error("ability slot {0} does not exist")]
    InvalidSlot(usize),
    #[error("ability slot {0} is on cooldown")]
    OnCooldown(usize),
    #[error("ability slot {0} is blocked by another activity")]
    Busy(usize),
}

#[derive(Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct Ability {
    pub name: String,
    pub emitter: Emitter,

    pub base_cooldown: f32,
    pub cooldown: f32,
    pub base_range: f32,
    pub range: f32,
    pub base_speed: f32,
    pub speed: f32,
    pub base_damage: f32,
    pub damage: f32,
    pub affected_by_attack_speed: bool,
    /// Some(duration) — попадание оглушает AI
    pub stun_on_hit: Option<f32>,

    /// Длина activity при speed = 1 (секунды)
    pub activity: f32,
    /// Доля activity, на которой стреляет эмиттер; None — сразу при нажатии
    pub fire_point: Option<f32>,

    #[serde(skip)]
    pub cooldown_timer: f32,
    #[serde(skip)]
    pub is_playing: bool,
    #[serde(skip)]
    pub play_timer: f32,
    /// Эмиттер уже выстрелил в текущем цикле
    #[serde(skip)]
    pub fired: bool,
}

impl Default for Ability {
    fn default() -> Self {
        Self {
            name: "Main Attack".to_string(),
            emitter: Emitter::default(),
            base_cooldown: 1.0,
            cooldown: 1.0,
            base_range: 1.0,
            range: 1.0,
            base_speed: 1.0,
            speed: 1.0,
            base_damage: 10.0,
            damage: 10.0,
            affected_by_attack_speed: false,
            stun_on_hit: None,
            activity: 0.6,
            fire_point: Some(0.5),
            cooldown_timer: 0.0,
            is_playing: false,
            play_timer: 0.0,
            fired: false,
        }
    }
}

impl Ability {
    pub fn new(name: &str, emitter: Emitter) -> Self {
        Self {
            name: name.to_string(),
            emitter,
            ..default()
        }
    }

    pub fn with_cooldown(mut self, cooldown: f32) -> Self {
        self.base_cooldown = cooldown;
        self.cooldown = cooldown;
        self
    }

    pub fn with_damage(mut self, damage: f32) -> Self {
        self.base_damage = damage;
        self.damage = damage;
        self
    }

    pub fn with_range(mut self, range: f32) -> Self {
        self.base_range = range;
        self.range = range;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.base_speed = speed;
        self.speed = speed;
        self
    }

    pub fn with_activity(mut self, activity: f32, fire_point: Option<f32>) -> Self {
        self.activity = activity.max(0.0);
        self.fire_point = fire_point.map(|point| point.clamp(0.0, 1.0));
        self
    }

    pub fn with_stun(mut self, duration: f32) -> Self {
        self.stun_on_hit = Some(duration);
        self
    }

    pub fn affected_by_attack_speed(mut self) -> Self {
        self.affected_by_attack_speed = true;
        self
    }

    /// Длина activity с учётом скорости
    pub fn activity_length(&self) -> f32 {
        self.activity / self.speed.max(0.0001)
    }

    pub fn is_ready(&self) -> bool {
        self.cooldown_timer <= 0.0
    }

    fn restart_cycle(&mut self) {
        self.play_timer = 0.0;
        self.fired = false;
    }

    /// Конец activity: cooldown стартует только здесь
    fn finish_activity(&mut self) {
        self.is_playing = false;
        self.play_timer = 0.0;
        self.cooldown_timer = self.cooldown;
    }

    /// Fire point цикла достигнут (один раз за цикл)
    fn fire_point_reached(&mut self) -> bool {
        let Some(point) = self.fire_point else {
            return false;
        };
        if self.fired || self.play_timer < point * self.activity_length() {
            return false;
        }
        self.fired = true;
        true
    }
}

/// Что должен сделать вызывающий после try_use / tick
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AbilityActions {
    /// Слоты, чьи эмиттеры стреляют сейчас
    pub fired: Vec<usize>,
    /// Атака началась (слот)
    pub started: Option<usize>,
    /// Атака закончилась
    pub stopped: bool,
}

impl AbilityActions {
    fn fire(mut self, slot: usize) -> Self {
        self.fired.push(slot);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fired.is_empty() && self.started.is_none() && !self.stopped
    }
}

/// Набор способностей текущей формы
#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
#[require(SummonTracker)]
pub struct Abilities {
    pub slots: Vec<Ability>,
    pub is_attacking: bool,
    /// Слот текущей атаки (AbilityIndex аниматора)
    pub active_slot: usize,
    pub attack_held: bool,
    /// Continuous hitscan: время до следующего выстрела
    pub hitscan_timer: f32,
}

impl Default for Abilities {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Abilities {
    pub fn new(slots: Vec<Ability>) -> Self {
        let mut slots = slots;
        if slots.len() > ABILITY_SLOTS {
            crate::logger::log_warning(&format!(
                "⚠️ {} abilities given, only {} slots used",
                slots.len(),
                ABILITY_SLOTS
            ));
            slots.truncate(ABILITY_SLOTS);
        }
        Self {
            slots,
            is_attacking: false,
            active_slot: 0,
            attack_held: false,
            hitscan_timer: 0.0,
        }
    }

    pub fn get(&self, slot: usize) -> Option<&Ability> {
        self.slots.get(slot)
    }

    fn start_attack(&mut self, slot: usize, actions: &mut AbilityActions) {
        self.is_attacking = true;
        self.active_slot = slot;
        if let Some(ability) = self.slots.get_mut(slot) {
            ability.restart_cycle();
        }
        actions.started = Some(slot);
    }

    fn stop_attack(&mut self, actions: &mut AbilityActions) {
        self.is_attacking = false;
        actions.stopped = true;
    }

    /// Нажатие слота
    ///
    /// - слот 0: hold, старт цикла если не атакуем
    /// - Transform/Blink/Summon: стреляют сразу, без атаки; activity
    ///   длится до следующего tick'а (Blink — до конца рывка)
    /// - остальные: блок если играет, cooldown или идёт атака
    ///
    /// Cooldown всегда стартует после конца activity, не при нажатии.
    pub fn try_use(&mut self, slot: usize) -> Result<AbilityActions, AbilityError> {
        let mut actions = AbilityActions::default();
        let Some(ability) = self.slots.get(slot) else {
            return Err(AbilityError::InvalidSlot(slot));
        };

        if slot == 0 {
            self.attack_held = true;
            let fire_now = ability.fire_point.is_none();
            let interval = ability.emitter.continuous_interval();

            if !self.is_attacking {
                self.start_attack(0, &mut actions);
            }
            if fire_now {
                actions = actions.fire(0);
                if let Some(interval) = interval {
                    self.hitscan_timer = interval;
                }
            }
            return Ok(actions);
        }

        if ability.emitter.is_instant() && !self.is_attacking {
            if ability.is_playing {
                return Err(AbilityError::Busy(slot));
            }
            if !ability.is_ready() {
                return Err(AbilityError::OnCooldown(slot));
            }
            if let Some(ability) = self.slots.get_mut(slot) {
                ability.is_playing = true;
                ability.play_timer = 0.0;
            }
            return Ok(actions.fire(slot));
        }

        if ability.is_playing || self.is_attacking {
            return Err(AbilityError::Busy(slot));
        }
        if !ability.is_ready() {
            return Err(AbilityError::OnCooldown(slot));
        }

        let fire_now = ability.fire_point.is_none();
        if let Some(ability) = self.slots.get_mut(slot) {
            ability.is_playing = true;
        }
        self.start_attack(slot, &mut actions);
        if fire_now {
            if let Some(ability) = self.slots.get_mut(slot) {
                ability.fired = true;
            }
            actions = actions.fire(slot);
        }
        Ok(actions)
    }

    /// Отпускание слота (значимо только для primary)
    pub fn release(&mut self, slot: usize) {
        if slot == 0 {
            self.attack_held = false;
            self.hitscan_timer = 0.0;
        }
    }

    /// Один шаг: cooldown'ы, fire point'ы, конец activity
    pub fn tick(&mut self, delta: f32) -> AbilityActions {
        let mut actions = AbilityActions::default();

        for ability in self.slots.iter_mut() {
            if ability.cooldown_timer > 0.0 {
                ability.cooldown_timer = (ability.cooldown_timer - delta).max(0.0);
            }
        }

        // Primary: hold-to-repeat
        if self.is_attacking && self.active_slot == 0 {
            if let Some(primary) = self.slots.get_mut(0) {
                primary.play_timer += delta;
                if primary.fire_point_reached() {
                    actions.fired.push(0);
                }
                if primary.play_timer >= primary.activity_length() {
                    if self.attack_held {
                        primary.restart_cycle();
                    } else {
                        self.stop_attack(&mut actions);
                    }
                }
            }
        }

        // Continuous hitscan пока primary зажат
        let interval = self
            .slots
            .first()
            .and_then(|primary| primary.emitter.continuous_interval());
        if let Some(interval) = interval {
            if self.attack_held {
                self.hitscan_timer -= delta;
                if self.hitscan_timer <= 0.0 {
                    self.hitscan_timer = (self.hitscan_timer + interval).max(0.0);
                    if !actions.fired.contains(&0) {
                        actions.fired.push(0);
                    }
                }
            }
        }

        for slot in 1..self.slots.len() {
            let ability = &mut self.slots[slot];
            if !ability.is_playing {
                continue;
            }
            if ability.emitter.is_instant() {
                // Blink заканчивают системы рывка
                if !matches!(ability.emitter, Emitter::Blink(_)) {
                    ability.finish_activity();
                }
                continue;
            }
            ability.play_timer += delta;
            if ability.fire_point_reached() {
                actions.fired.push(slot);
            }
            if ability.play_timer >= ability.activity_length() {
                ability.finish_activity();
                self.stop_attack(&mut actions);
            }
        }

        actions
    }

    /// Конец activity мгновенной способности (рывок закончен или отменён)
    ///
    /// false — слот не играет или не мгновенный.
    pub fn finish_instant(&mut self, slot: usize) -> bool {
        match self.slots.get_mut(slot) {
            Some(ability) if ability.is_playing && ability.emitter.is_instant() => {
                ability.finish_activity();
                true
            }
            _ => false,
        }
    }

    /// Прервать все activity (смена формы)
    ///
    /// Атаки обрываются без cooldown; мгновенные уже выстрелили, их
    /// cooldown стартует.
    pub fn interrupt(&mut self) -> bool {
        let was_attacking = self.is_attacking;
        self.is_attacking = false;
        self.attack_held = false;
        self.hitscan_timer = 0.0;
        for ability in self.slots.iter_mut() {
            if ability.is_playing && ability.emitter.is_instant() {
                ability.finish_activity();
            }
            ability.is_playing = false;
            ability.restart_cycle();
        }
        was_attacking
    }
}
