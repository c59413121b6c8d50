//! HOLLOWRIFT Simulation Core
//!
//! ECS-симуляция на Bevy 0.16: third-person action ядро без рендера.
//!
//! Подсистемы:
//! - controller — floating capsule (пружины, прыжок, полёт)
//! - ai — Chase/Windup/Attack/Stunned, LOS, упреждение
//! - abilities — 4 слота, эмиттеры, формы
//! - combat/status/items — урон, броня, bleed, предметы
//! - spawning/pool — директор спавна, сундуки, переиспользуемые entity
//!
//! Движок (рендер, анимация, UI) — внешний слой, читает компоненты и события.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

// Публичные модули
pub mod abilities;
pub mod ai;
pub mod animation;
pub mod combat;
pub mod components;
pub mod config;
pub mod controller;
pub mod items;
pub mod logger;
pub mod math;
pub mod navigation;
pub mod physics;
pub mod pool;
pub mod projectile;
pub mod spawning;
pub mod status;
pub mod targeting;

// Re-export базовых типов для удобства
pub use abilities::{Abilities, Ability, AbilitiesPlugin, AbilityInput, Emitter, Forms};
pub use ai::{AiAgent, AiConfig, AiPlugin, AiState};
pub use combat::{CombatPlugin, DamageRequest, Dead, EntityDied};
pub use components::*;
pub use config::{ConfigError, SimulationConfig};
pub use controller::{ControllerInput, ControllerPlugin, FloatingCapsule};
pub use items::{InteractRequest, Inventory, ItemKind, ItemsPlugin};
pub use navigation::{NavigationPlugin, WalkableArea};
pub use physics::{FlatGround, PhysicsPlugin};
pub use pool::{PoolPlugin, PoolRegistry};
pub use projectile::ProjectilePlugin;
pub use spawning::{CombatDirector, SpawningPlugin};
pub use status::StatusPlugin;
pub use targeting::{Faction, TargetRegistry, Targetable, TargetingPlugin};

/// Порядок подсистем внутри одного fixed tick'а
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// Регистрация целей, prewarm pool'ов, сброс триггеров, подбор предметов
    Input,
    /// Контроллер, навигация, headless интеграция
    Movement,
    Ai,
    Abilities,
    Projectiles,
    /// Статусы → хил → урон → смерть
    Combat,
    /// Отложенный despawn, спавн директора
    Cleanup,
}

/// Главный plugin симуляции (объединяет все подсистемы)
#[derive(Default)]
pub struct SimulationPlugin {
    pub config: SimulationConfig,
}

impl SimulationPlugin {
    pub fn with_config(config: SimulationConfig) -> Self {
        Self { config }
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let config = &self.config;
        logger::set_log_level(config.log_level);

        app.insert_resource(config.clone())
            .insert_resource(Time::<Fixed>::from_hz(config.fixed_hz));

        // create_headless_app уже мог посеять RNG — не перезаписываем
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(config.seed));
        }
        if let Some(area) = config.walkable_area {
            if !app.world().contains_resource::<WalkableArea>() {
                app.insert_resource(area);
            }
        }

        app.configure_sets(
            FixedUpdate,
            (
                SimulationSet::Input,
                SimulationSet::Movement,
                SimulationSet::Ai,
                SimulationSet::Abilities,
                SimulationSet::Projectiles,
                SimulationSet::Combat,
                SimulationSet::Cleanup,
            )
                .chain(),
        );

        app.register_type::<Player>()
            .register_type::<Actor>()
            .register_type::<Health>()
            .register_type::<Armor>()
            .register_type::<DeathBehavior>();

        // PoolPlugin первым: остальные регистрируют прототипы в его реестре
        app.add_plugins((
            PoolPlugin,
            TargetingPlugin,
            PhysicsPlugin,
            NavigationPlugin,
            ControllerPlugin,
            AiPlugin,
            AbilitiesPlugin {
                summon_pool: config.pools.summons,
            },
            ProjectilePlugin {
                pool: config.pools.projectiles,
            },
            CombatPlugin,
            StatusPlugin,
            ItemsPlugin {
                heal_zone_pool: config.pools.heal_zones,
                pickup_pool: config.pools.item_pickups,
            },
            SpawningPlugin {
                config: config.director.clone(),
                enemy_ai: config.ai.clone(),
                enemy_pool: config.pools.enemies,
                chests: config.chests,
                chest_pool: config.pools.chests,
            },
            animation::AnimationPlugin,
        ));

        logger::log_info(&format!(
            "🚀 Simulation plugin built (seed {}, {} Hz)",
            config.seed, config.fixed_hz
        ));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Длительность одного fixed tick'а при 60 Hz
pub fn fixed_timestep() -> Duration {
    Duration::from_secs_f64(1.0 / 60.0)
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Время двигается вручную ровно на один fixed tick за `app.update()`
/// (первый update — нулевой delta, FixedUpdate не запускается).
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    logger::init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .insert_resource(Time::<Fixed>::from_duration(fixed_timestep()))
        .insert_resource(TimeUpdateStrategy::ManualDuration(fixed_timestep()));

    app
}

/// Snapshot мира для сравнения детерминизма
///
/// Debug-представление компонента `T` всех entities, отсортированных по индексу.
pub fn world_snapshot<T: Component>(world: &mut World) -> Vec<u8>
where
    T: std::fmt::Debug,
{
    let mut snapshot = Vec::new();

    let mut query = world.query::<(Entity, &T)>();
    let mut entities: Vec<_> = query.iter(world).collect();
    entities.sort_by_key(|(entity, _)| entity.index());

    for (entity, component) in entities {
        snapshot.extend_from_slice(&entity.index().to_le_bytes());
        snapshot.extend_from_slice(format!("{:?}", component).as_bytes());
    }

    snapshot
}
