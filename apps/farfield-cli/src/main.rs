use std::path::PathBuf;
use std::time::Instant;

use clap::{Parser, Subcommand};
use glam::Vec3;
use tracing_subscriber::EnvFilter;

use farfield_gen::{Basin, CarveOverlay, Channel};
use farfield_world::{WorldConfig, WorldStream};

#[derive(Parser)]
#[command(name = "farfield-cli", about = "CLI driver for farfield world streaming")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON config file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// World seed applied to both generators
    #[arg(short, long, default_value = "0")]
    seed: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print engine version and crate info
    Info,
    /// Warm up the world around the origin and report readiness
    Warmup {
        /// Carve a demo lake and river before building
        #[arg(long)]
        water: bool,
    },
    /// Warm up, then walk the observer east and report streaming stats
    Walk {
        /// Number of frames to simulate
        #[arg(short, long, default_value = "600")]
        frames: u32,
        /// Observer speed in meters per frame
        #[arg(long, default_value = "1.5")]
        speed: f32,
    },
    /// Sample terrain height at a world point
    Sample {
        x: f32,
        z: f32,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<WorldConfig> {
    let config = match &cli.config {
        Some(path) => serde_json::from_reader(std::fs::File::open(path)?)?,
        None => WorldConfig::default(),
    };
    Ok(config.with_seed(cli.seed))
}

fn demo_overlay() -> CarveOverlay {
    CarveOverlay::new(2.0)
        .with_basin(Basin {
            x: 140.0,
            z: -60.0,
            radius: 26.0,
            depth: 1.4,
        })
        .with_basin(Basin {
            x: -180.0,
            z: 120.0,
            radius: 18.0,
            depth: 1.1,
        })
        .with_channel(Channel {
            points: vec![
                glam::Vec2::new(140.0, -34.0),
                glam::Vec2::new(90.0, 40.0),
                glam::Vec2::new(30.0, 130.0),
            ],
            width: 7.0,
            depth: 0.8,
        })
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("farfield-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("stream: {}", farfield_stream::crate_info());
            println!("world: {}", farfield_world::crate_info());
            let config = load_config(&cli)?;
            println!(
                "terrain: chunk={}m segments={} radius={}",
                config.terrain.chunk_size, config.terrain.segments, config.terrain.load_radius
            );
            println!(
                "scatter: chunk={}m radius={}",
                config.scatter.chunk_size, config.scatter.stream_radius
            );
        }
        Commands::Warmup { water } => {
            let config = load_config(&cli)?;
            let mut world = WorldStream::new(config);
            if water {
                world.register_carve_overlay(demo_overlay())?;
            }

            let start = Instant::now();
            let ready = world.warmup(Vec3::ZERO);
            println!(
                "warmup: ready={} progress={:.2} elapsed={:?}",
                ready,
                world.progress(),
                start.elapsed()
            );
            println!(
                "terrain chunks: {}  scatter chunks: {}  items: {}  colliders: {}",
                world.terrain().ready_count(),
                world.scatter().ready_count(),
                world.scatter_items().count(),
                world.colliders().len()
            );
        }
        Commands::Walk { frames, speed } => {
            let config = load_config(&cli)?;
            let mut world = WorldStream::new(config);
            world.register_carve_overlay(demo_overlay())?;
            world.warmup(Vec3::ZERO);

            let mut observer = Vec3::ZERO;
            let start = Instant::now();
            for frame in 0..frames {
                observer.x += speed;
                observer.y = world.height_at(observer.x, observer.z);
                world.update(observer, 1.0 / 60.0);

                if frame % 120 == 0 {
                    println!(
                        "frame {frame}: x={:.0} ground={:.2} progress={:.2} colliders={}",
                        observer.x,
                        observer.y,
                        world.progress(),
                        world.colliders().len()
                    );
                }
            }
            println!(
                "walked {:.0}m in {frames} frames ({:?} total)",
                observer.x,
                start.elapsed()
            );
        }
        Commands::Sample { x, z } => {
            let config = load_config(&cli)?;
            let world = WorldStream::new(config);
            // Nothing is streamed yet; this exercises the procedural
            // fallback the same way a teleport would.
            println!("height({x}, {z}) = {:.3}", world.height_at(x, z));
        }
    }

    Ok(())
}
