//! Items module: стакающиеся предметы и их hooks
//!
//! Hooks:
//! - pickup — эффект только подобранного kind'а (урон/скорость/дальность/прыжки)
//! - update — раз в секунду (Healing, cooldown HealingArea)
//! - jump — HealingArea оставляет heal zone
//! - hit — Bleed накладывает статус на цель
//!
//! Предметы выпадают из сундуков (`loot`) и подбираются interact'ом.

use bevy::prelude::*;

pub mod inventory;
pub mod loot;
pub mod systems;

#[cfg(test)]
mod items_tests;
#[cfg(test)]
mod loot_tests;

pub use inventory::{
    bleed_parameters, healing_per_update, Inventory, ItemKind, ItemStack, HEALING_AREA_COOLDOWN,
    HEAL_ZONE_LIFETIME, ITEM_UPDATE_INTERVAL,
};
pub use loot::{
    interact_point, item_pickup_prototype, perform_interactions, tick_loot, ItemPickup, Loot,
    INTERACT_RADIUS, INTERACT_RANGE, LOOT_DROP_HEIGHT, LOOT_OPEN_DELAY, PICKUP_RADIUS,
};
pub use systems::{apply_pickup, item_on_hit, item_on_jump, pick_up_items, tick_item_updates};

use crate::combat::HealZone;
use crate::pool::{prototypes, PoolRegistry, PoolSettings};
use crate::status::apply_status_requests;
use crate::SimulationSet;

/// Event: персонаж подобрал предмет
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct ItemPickedUp {
    pub entity: Entity,
    pub kind: ItemKind,
}

/// Event: персонаж нажал interact
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct InteractRequest {
    pub entity: Entity,
}

/// Радиус heal zone от HealingArea
pub const HEAL_ZONE_RADIUS: f32 = 3.0;

/// Items Plugin
///
/// - perform_interactions → pick_up_items — Input set
/// - tick_loot — Cleanup set
/// - tick_item_updates, item_on_jump — Abilities set (Jumped пишет Movement)
/// - item_on_hit — Combat set, до apply_status_requests
#[derive(Default)]
pub struct ItemsPlugin {
    pub heal_zone_pool: PoolSettings,
    pub pickup_pool: PoolSettings,
}

impl Plugin for ItemsPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<ItemPickedUp>()
            .add_event::<InteractRequest>()
            .register_type::<Inventory>()
            .register_type::<Loot>()
            .register_type::<ItemPickup>();

        app.init_resource::<PoolRegistry>();
        {
            let mut registry = app.world_mut().resource_mut::<PoolRegistry>();
            registry.register(prototypes::HEAL_ZONE, self.heal_zone_pool, |entity| {
                entity.insert((Name::new("HealZone"), HealZone::new(HEAL_ZONE_RADIUS)));
            });
            registry.register(prototypes::ITEM_PICKUP, self.pickup_pool, item_pickup_prototype);
        }

        app.add_systems(
            FixedUpdate,
            (perform_interactions, pick_up_items)
                .chain()
                .in_set(SimulationSet::Input),
        );
        app.add_systems(FixedUpdate, tick_loot.in_set(SimulationSet::Cleanup));
        app.add_systems(
            FixedUpdate,
            (tick_item_updates, item_on_jump)
                .chain()
                .in_set(SimulationSet::Abilities),
        );
        app.add_systems(
            FixedUpdate,
            item_on_hit
                .in_set(SimulationSet::Combat)
                .before(apply_status_requests),
        );
    }
}
