use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;

use intersection_sim::simulation::{
    append_record, random_vehicle, IntersectionGeometry, LightPolicy, SimConfig, SimWorld,
    VehicleId, VehicleRecord,
};

const DEFAULT_LOG_FILTER: &str = "warn,intersection_sim=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LightMode {
    /// Every phase lasts the same time
    Fixed,
    /// Phase length follows the load of the green direction
    Adaptive,
}

#[derive(Parser)]
#[command(name = "intersection_sim")]
#[command(about = "Four-way signalized intersection simulation with optional UI")]
struct Cli {
    /// Run with the Bevy game engine UI
    #[arg(long)]
    ui: bool,

    /// Number of simulation ticks to run in headless mode
    #[arg(long, default_value = "1000")]
    ticks: u32,

    /// Time delta per tick in seconds
    #[arg(long, default_value = "0.1")]
    delta: f32,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Traffic light timing policy
    #[arg(long, value_enum, default_value = "fixed")]
    lights: LightMode,

    /// Capacity of each lane queue
    #[arg(long, default_value = "100")]
    queue_capacity: usize,

    /// Minimum distance between following vehicles
    #[arg(long, default_value = "30.0")]
    safe_distance: f32,

    /// Disable the built-in spawner (only ingested vehicles move)
    #[arg(long)]
    no_spawn: bool,

    /// Vehicle record file to drain every tick, or to append to with --generate
    #[arg(long)]
    vehicle_file: Option<PathBuf>,

    /// Append this many random vehicle records to --vehicle-file and exit
    #[arg(long)]
    generate: Option<u32>,

    /// Print the queue summary and map every N ticks (0 disables)
    #[arg(long, default_value = "0")]
    report_every: u32,

    /// Wall-clock pause between ticks in milliseconds
    #[arg(long, default_value = "0")]
    pace_ms: u64,
}

impl Cli {
    fn config(&self) -> SimConfig {
        SimConfig {
            queue_capacity: self.queue_capacity,
            safe_distance: self.safe_distance,
            light_policy: match self.lights {
                LightMode::Fixed => LightPolicy::fixed(),
                LightMode::Adaptive => LightPolicy::adaptive(),
            },
            spawn_enabled: !self.no_spawn,
            ..SimConfig::default()
        }
    }

    fn world(&self) -> SimWorld {
        match self.seed {
            Some(seed) => SimWorld::new_with_seed(self.config(), seed),
            None => SimWorld::new(self.config()),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.ui {
        #[cfg(feature = "ui")]
        {
            run_with_ui(cli.world());
            return Ok(());
        }
        #[cfg(not(feature = "ui"))]
        {
            eprintln!("Error: UI feature is not enabled. Rebuild with --features ui");
            std::process::exit(1);
        }
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER))
        .init();

    if let Some(count) = cli.generate {
        let Some(path) = cli.vehicle_file.as_deref() else {
            bail!("--generate needs --vehicle-file");
        };
        return generate_records(path, count, &cli.config(), cli.seed);
    }

    run_headless(&cli)
}

/// Append `count` random vehicles to a record file for a running simulation to pick up
fn generate_records(path: &Path, count: u32, config: &SimConfig, seed: Option<u64>) -> Result<()> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };
    let geometry = IntersectionGeometry::from_config(config);

    for id in 0..count {
        let vehicle = random_vehicle(VehicleId(id), config, &geometry, &mut rng);
        append_record(path, &VehicleRecord::from(&vehicle))
            .with_context(|| format!("Failed to generate vehicle {}", id))?;
    }

    info!("Appended {} vehicle records to {}", count, path.display());
    Ok(())
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(cli: &Cli) -> Result<()> {
    info!(
        "Running intersection simulation in headless mode: {} ticks, {}s per tick",
        cli.ticks, cli.delta
    );

    let mut world = cli.world();

    for tick in 1..=cli.ticks {
        if let Some(path) = cli.vehicle_file.as_deref() {
            match world.ingest_file(path) {
                Ok(0) => {}
                Ok(admitted) => info!("Ingested {} vehicles from {}", admitted, path.display()),
                Err(e) => warn!("Vehicle file ingest failed: {:#}", e),
            }
        }

        world.tick(cli.delta);

        if cli.report_every > 0 && tick % cli.report_every == 0 {
            println!("--- After tick {} ({:.1}s simulated time) ---", tick, world.time);
            world.print_summary();
            world.draw_map();
        }

        if cli.pace_ms > 0 {
            std::thread::sleep(Duration::from_millis(cli.pace_ms));
        }
    }

    world
        .stats
        .log_summary(world.time, world.vehicle_count(), world.lights.phase_changes());
    Ok(())
}

#[cfg(feature = "ui")]
fn run_with_ui(world: SimWorld) {
    use bevy::log::LogPlugin;
    use bevy::prelude::*;

    println!("Starting Intersection Sim UI...");
    println!();
    println!("Controls:");
    println!("  SPACE       - Force the next light phase");
    println!("  ESC         - Exit");
    println!();

    let resolution = (
        world.config.window_width as u32,
        world.config.window_height as u32,
    );

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(LogPlugin {
                    filter: "warn,intersection_sim=debug".to_string(),
                    level: bevy::log::Level::DEBUG,
                    ..default()
                })
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Intersection Sim".into(),
                        resolution: resolution.into(),
                        ..default()
                    }),
                    ..default()
                }),
        )
        .insert_resource(intersection_sim::ui::SimWorldResource(world))
        .add_plugins(intersection_sim::ui::IntersectionUIPlugin)
        .run();
}
