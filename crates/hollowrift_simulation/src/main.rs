//! Headless симуляция HOLLOWRIFT
//!
//! Запускает Bevy App без рендера: rapier физика, игрок, директор спавна.
//!
//! ```text
//! hollowrift_simulation [config.ron] [ticks]
//! ```

use bevy::prelude::*;
use bevy::transform::TransformPlugin;
use bevy_rapier3d::prelude::*;

use hollowrift_simulation::logger;
use hollowrift_simulation::physics::collision::terrain_groups;
use hollowrift_simulation::{
    create_headless_app, player_bundle, AiAgent, CombatDirector, Player, SimulationConfig,
    SimulationPlugin,
};

fn main() {
    let mut args = std::env::args().skip(1);

    let config = match args.next() {
        Some(path) => match SimulationConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                eprintln!("Failed to load {}: {}", path, err);
                std::process::exit(1);
            }
        },
        None => SimulationConfig::default(),
    };
    let ticks: u32 = args.next().and_then(|arg| arg.parse().ok()).unwrap_or(1000);

    println!(
        "Starting HOLLOWRIFT headless simulation (seed: {}, ticks: {})",
        config.seed, ticks
    );

    let mut app = create_headless_app(config.seed);
    app.add_plugins(TransformPlugin)
        .add_plugins(RapierPhysicsPlugin::<NoUserData>::default().in_fixed_schedule())
        .add_plugins(SimulationPlugin::with_config(config.clone()));

    // Земля (rapier) + игрок в центре арены
    app.world_mut().spawn((
        Name::new("Ground"),
        Collider::cuboid(200.0, 0.5, 200.0),
        Transform::from_xyz(0.0, -0.5, 0.0),
        terrain_groups(),
    ));
    app.world_mut().spawn((
        player_bundle(config.player_controller.clone()),
        Transform::from_xyz(0.0, config.player_controller.ride_height, 0.0),
    ));

    for tick in 0..ticks {
        app.update();

        if tick % 100 == 0 {
            let world = app.world_mut();
            let enemies = world
                .query_filtered::<Entity, (With<AiAgent>, Without<Player>)>()
                .iter(world)
                .count();
            let credits = world.resource::<CombatDirector>().credits;
            logger::log_info(&format!(
                "Tick {}: {} entities, {} AI agents, {:.1} credits",
                tick,
                world.entities().len(),
                enemies,
                credits
            ));
        }
    }

    println!("Simulation complete!");
}
