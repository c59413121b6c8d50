//! Status effects: стакающиеся периодические эффекты (bleed)
//!
//! ECS ответственность:
//! - `ApplyStatus` event → `ActiveEffects::apply` (refresh или insert)
//! - каждый fixed tick: advance таймеров, сработавшие → `DamageRequest` (не direct)
//! - истёкшие удаляются после своего последнего tick'а

use bevy::prelude::*;

pub mod effect;

pub use effect::{ActiveEffects, StatusEffect, StatusKind};

use crate::combat::{apply_damage_requests, DamageRequest, Dead};
use crate::SimulationSet;

/// Event: наложить эффект на персонажа
#[derive(Event, Debug, Clone, Copy)]
pub struct ApplyStatus {
    pub target: Entity,
    pub effect: StatusEffect,
}

/// Status Plugin
///
/// Выполняется в Combat set до применения урона, чтобы bleed-урон этого tick'а
/// прошёл через тот же damage pipeline.
pub struct StatusPlugin;

impl Plugin for StatusPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ApplyStatus>();

        app.add_systems(
            FixedUpdate,
            (apply_status_requests, tick_status_effects)
                .chain()
                .in_set(SimulationSet::Combat)
                .before(apply_damage_requests),
        );
    }
}

/// Система: ApplyStatus → ActiveEffects
pub fn apply_status_requests(
    mut requests: EventReader<ApplyStatus>,
    mut targets: Query<&mut ActiveEffects, Without<Dead>>,
) {
    for request in requests.read() {
        let Ok(mut effects) = targets.get_mut(request.target) else {
            continue;
        };
        effects.apply(request.effect);
    }
}

/// Система: tick эффектов
pub fn tick_status_effects(
    time: Res<Time>,
    mut targets: Query<(Entity, &mut ActiveEffects), Without<Dead>>,
    mut damage_requests: EventWriter<DamageRequest>,
) {
    let delta = time.delta_secs();

    for (entity, mut effects) in targets.iter_mut() {
        if effects.is_empty() {
            continue;
        }

        for fired in effects.tick(delta) {
            match fired.kind {
                StatusKind::Bleed => {
                    damage_requests.write(DamageRequest {
                        target: entity,
                        source: fired.source,
                        amount: fired.tick_amount(),
                        direct: false,
                    });
                }
            }
        }
    }
}
