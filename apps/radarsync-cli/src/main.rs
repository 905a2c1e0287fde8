use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use glam::Vec2;
use radarsync_client::{ClientConfig, RadarClient};
use radarsync_common::{BlipShape, EntityId, ManualClock, MapId, Rgba8, Timestamp, Transform2};
use radarsync_ecs::{BlipSource, ComponentStore, Projectile, RadarConsole};
use radarsync_kernel::World;
use radarsync_protocol::LoopbackChannel;
use radarsync_server::RadarServer;
use radarsync_tools::{DropCounters, ReportInspector};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "radarsync-cli", about = "CLI tool for radarsync operations")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and effective client defaults
    Info,
    /// Run a simulated radar session over a loopback channel
    Simulate {
        /// Number of ticks to simulate
        #[arg(short, long, default_value = "40")]
        ticks: u64,
        /// Milliseconds per tick
        #[arg(long, default_value = "50")]
        tick_ms: u64,
        /// Crew blips aboard the ship
        #[arg(short, long, default_value = "6")]
        blips: usize,
        /// Console range in world units
        #[arg(short, long, default_value = "100")]
        range: f32,
        /// Client config file (YAML)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Dump the final raw report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Demo scene: a spinning ship carrying the console, a station with a
/// beacon, loose debris, a projectile on another map and an orphaned shield.
struct Scene {
    world: World,
    components: ComponentStore,
    ship: EntityId,
    console: EntityId,
}

fn build_scene(crew: usize, range: f32) -> anyhow::Result<Scene> {
    let mut world = World::new();
    let mut components = ComponentStore::new();

    let ship = world.spawn_grid(MapId(0), Transform2::default());
    let console = world.spawn_child(ship, Transform2::default())?;
    components.set_radar_console(console, RadarConsole { max_range: range });

    for i in 0..crew {
        let angle = i as f32 / crew.max(1) as f32 * std::f32::consts::TAU;
        let id = world.spawn_child(ship, Transform2::from_position(Vec2::from_angle(angle) * 5.0))?;
        components.set_blip_source(
            id,
            BlipSource {
                shape: BlipShape::ALL[i % BlipShape::ALL.len()],
                color: Rgba8::GREEN,
                ..BlipSource::default()
            },
        );
    }

    let station = world.spawn_grid(MapId(0), Transform2::new(Vec2::new(60.0, 0.0), 0.4));
    let beacon = world.spawn_child(station, Transform2::from_position(Vec2::new(2.0, 2.0)))?;
    components.set_blip_source(
        beacon,
        BlipSource {
            visible_from_other_grids: true,
            shape: BlipShape::Star,
            color: Rgba8::CYAN,
            scale: 2.0,
            ..BlipSource::default()
        },
    );

    for (i, distance) in [20.0_f32, 75.0, 140.0].into_iter().enumerate() {
        let debris = world.spawn(
            MapId(0),
            Transform2::from_position(Vec2::from_angle(i as f32) * distance),
        );
        components.set_blip_source(
            debris,
            BlipSource {
                require_no_grid: true,
                shape: BlipShape::Ring,
                color: Rgba8::WHITE,
                scale: 0.5,
                ..BlipSource::default()
            },
        );
    }

    let shooter = world.spawn(MapId(1), Transform2::default());
    let bolt = world.spawn(MapId(1), Transform2::from_position(Vec2::new(3.0, 3.0)));
    components.set_blip_source(
        bolt,
        BlipSource {
            visible_from_other_grids: true,
            ..BlipSource::default()
        },
    );
    components.set_projectile(
        bolt,
        Projectile {
            shooter: Some(shooter),
        },
    );

    let shield = world.spawn(MapId(0), Transform2::from_position(Vec2::new(-10.0, 4.0)));
    components.set_blip_source(
        shield,
        BlipSource {
            visible_from_other_grids: true,
            ..BlipSource::default()
        },
    );
    components.tag_shield(shield);

    Ok(Scene {
        world,
        components,
        ship,
        console,
    })
}

fn simulate(
    ticks: u64,
    tick_ms: u64,
    crew: usize,
    range: f32,
    config: ClientConfig,
    json: bool,
) -> anyhow::Result<()> {
    println!("Simulating {ticks} ticks of {tick_ms} ms, {crew} crew, range {range}");

    let mut scene = build_scene(crew, range)?;
    let mut channel = LoopbackChannel::new();
    let session = channel.connect();
    let mut server = RadarServer::with_observer(DropCounters::new());
    let clock = ManualClock::new(Timestamp::ZERO);
    let mut client = RadarClient::with_observer(config, &clock, DropCounters::new());

    let mut requests = 0;
    let mut replies = 0;
    for tick in 0..ticks {
        let _span = tracing::info_span!("tick", tick).entered();
        clock.set(Timestamp::from_millis(tick.saturating_mul(tick_ms)));

        let t = tick as f32 * tick_ms as f32 / 1000.0;
        scene
            .world
            .set_transform(scene.ship, Transform2::new(Vec2::new(t * 4.0, 0.0), t * 0.5))?;

        if client.request_via(&mut channel, session, scene.console)? {
            requests += 1;
        }
        server.pump(&mut channel, &scene.world, &scene.components)?;
        replies += client.pump(&mut channel, session)?;
    }

    let raw = client.raw_blips(Some(scene.console));
    let world_blips = client.current_world_blips(Some(scene.console), &scene.world);

    println!("Requests sent: {requests}, reports received: {replies}");
    println!("{}", ReportInspector::summary(Some(scene.console), &raw));
    for blip in &world_blips {
        println!(
            "  {:?} at ({:.2}, {:.2}) scale={:.2}",
            blip.shape, blip.position.x, blip.position.y, blip.scale
        );
    }
    println!("Server {}", server.observer());
    println!("Client {}", client.observer());

    if json {
        println!("{}", serde_json::to_string_pretty(&raw)?);
    }
    Ok(())
}

/// Total simulated time, rejecting a zero tick and clocks that overflow.
fn simulated_duration(ticks: u64, tick_ms: u64) -> anyhow::Result<Duration> {
    if tick_ms == 0 {
        anyhow::bail!("tick_ms must be positive");
    }
    let Some(total_ms) = ticks.checked_mul(tick_ms) else {
        anyhow::bail!("{ticks} ticks of {tick_ms} ms overflows the simulated clock");
    };
    Ok(Duration::from_millis(total_ms))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            let defaults = ClientConfig::default();
            println!("radarsync-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("request interval: {:?}", defaults.request_interval());
            println!("stale after: {:?}", defaults.stale_after());
            println!("shapes: {:?}", BlipShape::ALL);
        }
        Commands::Simulate {
            ticks,
            tick_ms,
            blips,
            range,
            config,
            json,
        } => {
            let config = match config {
                Some(path) => ClientConfig::load(&path)?,
                None => ClientConfig::default(),
            };
            tracing::debug!(?config, "client config");
            let total = simulated_duration(ticks, tick_ms)?;
            tracing::info!(?total, "simulated duration");
            simulate(ticks, tick_ms, blips, range, config, json)?;
        }
    }

    Ok(())
}
