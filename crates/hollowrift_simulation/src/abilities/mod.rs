//! Abilities module: 4 слота способностей, эмиттеры, формы
//!
//! ECS ответственность:
//! - `Abilities` — слоты текущей формы (cooldown, activity, hold-to-repeat primary)
//! - `Emitter` — strategy enum: Melee, Projectile, Hitscan, Blink, Summon, Transform
//! - `Forms` — base/alternate форма, обмен наборов способностей
//! - `AbilityHit` → DamageRequest (× множитель формы) + StunRequest
//!
//! Ability владеет эмиттером; эмиттер знает владельца только через event.

use bevy::prelude::*;

pub mod ability;
pub mod emitters;
pub mod events;
pub mod forms;
pub mod systems;


// Re-export основных типов
pub use ability::{Abilities, Ability, AbilityActions, AbilityError, ABILITY_SLOTS};
pub use emitters::{
    BlinkDash, BlinkEmitter, Emitter, HitscanEmitter, MeleeEmitter, ProjectileEmitter, Summon,
    SummonEmitter, SummonTracker, TransformEmitter,
};
pub use events::{AbilityFired, AbilityHit, AbilityInput, EmittersStopped, FormChanged};
pub use forms::{CharacterForm, FormKind, Forms};
pub use systems::*;

use crate::ai::{AiAgent, AiAttack, AiAttacks, MeleeAttack};
use crate::combat::apply_damage_requests;
use crate::components::{Actor, DeathBehavior, Health};
use crate::navigation::NavAgent;
use crate::physics::collision::character_groups;
use crate::physics::HeadlessCollider;
use crate::pool::{prototypes, PoolRegistry, PoolSettings};
use crate::status::apply_status_requests;
use crate::targeting::{Faction, Targetable};
use crate::SimulationSet;

/// Бандл призванного союзника (prototype `summon`)
pub fn summon_prototype(entity: &mut bevy::ecs::system::EntityCommands) {
    entity.insert((
        Name::new("Summon"),
        Actor,
        Faction::Ally,
        Targetable::new(Faction::Ally),
        Health::new(60.0),
        AiAgent::default(),
        AiAttacks::new([AiAttack::melee(MeleeAttack::default())]),
        NavAgent::new(5.0),
        HeadlessCollider::new(0.5),
        character_groups(Faction::Ally),
        DeathBehavior::Despawn { delay: 0.0 },
    ));
}

/// Abilities Plugin
///
/// Порядок выполнения (SimulationSet::Abilities):
/// 1. handle_ability_input — нажатия → try_use
/// 2. tick_abilities — cooldown, fire point, конец activity
/// 3. эмиттеры: melee, projectile, hitscan, summon, blink start
/// 4. fire_transform_emitters → apply_form_switches → stop_emitters
///    (смена формы после остальных эмиттеров: слот читается до обмена наборов)
/// 5. tick_blink_dashes → end_blink_dashes, tick_summons
///
/// apply_ability_hits — Combat set, до status/damage (снаряды попадают в Projectiles).
#[derive(Default)]
pub struct AbilitiesPlugin {
    pub summon_pool: PoolSettings,
}

impl Plugin for AbilitiesPlugin {
    fn build(&self, app: &mut App) {
        app.add_event::<AbilityInput>()
            .add_event::<AbilityFired>()
            .add_event::<AbilityHit>()
            .add_event::<EmittersStopped>()
            .add_event::<FormChanged>()
            .register_type::<Abilities>()
            .register_type::<Forms>()
            .register_type::<Summon>();

        app.init_resource::<PoolRegistry>();
        app.world_mut()
            .resource_mut::<PoolRegistry>()
            .register(prototypes::SUMMON, self.summon_pool, summon_prototype);

        app.add_systems(
            FixedUpdate,
            (
                handle_ability_input,
                tick_abilities,
                fire_melee_emitters,
                fire_projectile_emitters,
                fire_hitscan_emitters,
                fire_summon_emitters,
                start_blink_dashes,
                fire_transform_emitters,
                apply_form_switches,
                stop_emitters,
                tick_blink_dashes,
                end_blink_dashes,
                tick_summons,
            )
                .chain()
                .in_set(SimulationSet::Abilities),
        );
        app.add_systems(
            FixedUpdate,
            apply_ability_hits
                .in_set(SimulationSet::Combat)
                .before(apply_status_requests)
                .before(apply_damage_requests),
        );
    }
}
