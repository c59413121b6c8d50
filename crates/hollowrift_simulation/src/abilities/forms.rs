//! Формы персонажа (base / alternate)
//!
//! Геймплей формы применяется сразу при смене, визуальный blend
//! (`amount` 0 → 1) догоняет за blend time. Набор способностей активной формы
//! живёт в `Abilities`, неактивной — здесь.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::ability::Ability;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Reflect, Serialize, Deserialize)]
pub enum FormKind {
    #[default]
    Base,
    Alternate,
}

impl FormKind {
    /// Целевой visual amount формы
    pub fn amount(self) -> f32 {
        match self {
            Self::Base => 0.0,
            Self::Alternate => 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Reflect, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterForm {
    pub move_speed_multiplier: f32,
    pub damage_multiplier: f32,
    pub can_fly: bool,
    pub abilities: Vec<Ability>,
}

impl Default for CharacterForm {
    fn default() -> Self {
        Self {
            move_speed_multiplier: 1.0,
            damage_multiplier: 1.0,
            can_fly: false,
            abilities: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
struct FormBlend {
    start: f32,
    target: f32,
    elapsed: f32,
    duration: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
struct TimedForm {
    remaining: f32,
    blend_out: f32,
}

#[derive(Component, Debug, Clone, PartialEq, Reflect)]
#[reflect(Component)]
pub struct Forms {
    pub base: CharacterForm,
    pub alternate: CharacterForm,
    pub active: FormKind,
    /// Visual blend amount (0 base, 1 alternate)
    pub amount: f32,
    blend: Option<FormBlend>,
    timed: Option<TimedForm>,
    pending: Option<(FormKind, f32)>,
}

impl Forms {
    pub fn new(base: CharacterForm, alternate: CharacterForm) -> Self {
        Self {
            base,
            alternate,
            active: FormKind::Base,
            amount: 0.0,
            blend: None,
            timed: None,
            pending: None,
        }
    }

    pub fn form(&self, kind: FormKind) -> &CharacterForm {
        match kind {
            FormKind::Base => &self.base,
            FormKind::Alternate => &self.alternate,
        }
    }

    pub fn form_mut(&mut self, kind: FormKind) -> &mut CharacterForm {
        match kind {
            FormKind::Base => &mut self.base,
            FormKind::Alternate => &mut self.alternate,
        }
    }

    pub fn current(&self) -> &CharacterForm {
        self.form(self.active)
    }

    pub fn damage_multiplier(&self) -> f32 {
        self.current().damage_multiplier
    }

    /// Запросить смену формы (применяется системой в этом же tick'е)
    pub fn request(&mut self, kind: FormKind, blend_time: f32) {
        self.pending = Some((kind, blend_time.max(0.0)));
    }

    /// Форма на `duration` секунд, потом обратно в base
    pub fn apply_timed(&mut self, kind: FormKind, blend_in: f32, duration: f32, blend_out: f32) {
        self.request(kind, blend_in);
        self.timed = Some(TimedForm {
            remaining: duration.max(0.0),
            blend_out: blend_out.max(0.0),
        });
    }

    pub fn take_pending(&mut self) -> Option<(FormKind, f32)> {
        self.pending.take()
    }

    pub fn has_timed_form(&self) -> bool {
        self.timed.is_some()
    }

    /// Начать visual blend к форме `kind`
    pub fn begin_blend(&mut self, kind: FormKind, blend_time: f32) {
        let target = kind.amount();
        if blend_time <= 0.0 {
            self.amount = target;
            self.blend = None;
            return;
        }
        self.blend = Some(FormBlend {
            start: self.amount,
            target,
            elapsed: 0.0,
            duration: blend_time,
        });
    }

    /// Шаг: visual blend + таймер временной формы
    pub fn tick(&mut self, delta: f32) {
        if let Some(blend) = self.blend.as_mut() {
            blend.elapsed += delta;
            let t = (blend.elapsed / blend.duration).clamp(0.0, 1.0);
            self.amount = blend.start + (blend.target - blend.start) * t;
            if t >= 1.0 {
                self.amount = blend.target;
                self.blend = None;
            }
        }

        if let Some(timed) = self.timed.as_mut() {
            timed.remaining -= delta;
            if timed.remaining <= 0.0 {
                let blend_out = timed.blend_out;
                self.timed = None;
                self.request(FormKind::Base, blend_out);
            }
        }
    }
}
