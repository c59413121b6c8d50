//! Targeting module: фракции, реестр целей, выбор цели
//!
//! ECS ответственность:
//! - `Targetable` компонент регистрируется в `TargetRegistry` при добавлении
//! - удаление компонента (despawn, возврат в pool) — unregister
//! - мёртвые/неактивные вычищаются лениво при каждом запросе

use bevy::prelude::*;

pub mod faction;
pub mod registry;

pub use faction::{are_hostile, Faction};
pub use registry::{
    score_target, select_best_target, TargetCandidate, TargetRegistry, Targetable,
};

use crate::combat::Dead;
use crate::SimulationSet;

/// Targeting Plugin
///
/// Реестр живёт в мире — `init_resource` здесь, teardown вместе с App.
pub struct TargetingPlugin;

impl Plugin for TargetingPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<TargetRegistry>()
            .register_type::<Targetable>()
            .register_type::<Faction>();

        app.add_systems(
            FixedUpdate,
            (register_new_targets, unregister_removed_targets)
                .chain()
                .in_set(SimulationSet::Input),
        );
    }
}

/// Система: регистрация новых `Targetable`
pub fn register_new_targets(
    mut registry: ResMut<TargetRegistry>,
    added: Query<Entity, Added<Targetable>>,
) {
    for entity in added.iter() {
        registry.register(entity);
    }
}

/// Система: unregister при удалении компонента / despawn
pub fn unregister_removed_targets(
    mut registry: ResMut<TargetRegistry>,
    mut removed: RemovedComponents<Targetable>,
) {
    for entity in removed.read() {
        registry.unregister(entity);
    }
}

/// Lookup для `TargetRegistry::best_target` поверх ECS query
///
/// Мёртвые и удалённые entity → None (будут вычищены из реестра).
pub fn lookup_candidate(
    targets: &Query<(&Targetable, &Transform), Without<Dead>>,
    entity: Entity,
) -> Option<TargetCandidate> {
    targets
        .get(entity)
        .ok()
        .map(|(targetable, transform)| TargetCandidate {
            position: transform.translation,
            targetable: *targetable,
        })
}
