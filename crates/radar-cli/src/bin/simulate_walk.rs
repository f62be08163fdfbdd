//! Live simulation: an agent walks towards the nearest target while the
//! engine keeps every route current.
//!
//! Usage:
//!   cargo run -p radar-cli --bin simulate_walk -- --area demos/crypt.json --targets demos/targets.json --start 1,10

use anyhow::{Context, Result};
use clap::Parser;
use radar_cli::{load_area, parse_coord, StepWalker, Walker};
use radar_core::TargetTable;
use radar_engine::{init_tracing, AgentSource, AreaTracker, EngineConfig, SharedAgent};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time;

/// Walk an agent through an area with live routing
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Area file (.json snapshot or ASCII picture)
    #[arg(long)]
    area: PathBuf,

    /// Target description table (defaults to RADAR_TARGETS_PATH)
    #[arg(long)]
    targets: Option<PathBuf>,

    /// Starting tile as x,y
    #[arg(long)]
    start: String,

    /// Entity sightings as label=x,y, reported after the first tick
    #[arg(long)]
    entity: Vec<String>,

    /// Simulation ticks
    #[arg(long, default_value_t = 100)]
    ticks: u32,

    /// Milliseconds per tick
    #[arg(long, default_value_t = 200)]
    tick_ms: u64,

    /// Tiles walked per tick
    #[arg(long, default_value_t = 2)]
    speed: usize,

    /// Log as JSON lines
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing("radar_engine=debug", args.json)?;
    let config = EngineConfig::from_env();

    let targets_path = args.targets.clone().unwrap_or_else(|| config.targets_path.clone());
    let table = TargetTable::load(&targets_path)
        .with_context(|| format!("loading {}", targets_path.display()))?;
    let area = load_area(&args.area)?;

    let mut sightings = Vec::new();
    for raw in &args.entity {
        let (label, coord) = raw
            .split_once('=')
            .with_context(|| format!("expected label=x,y but got {raw:?}"))?;
        sightings.push((label.to_string(), parse_coord(coord)?));
    }

    let agent = Arc::new(SharedAgent::new(parse_coord(&args.start)?));
    let tracker = AreaTracker::new(config, agent.clone(), table, Handle::current());
    tracker.area_change(area)?;

    let mut walker = StepWalker::new(args.speed);
    let mut ticker = time::interval(Duration::from_millis(args.tick_ms));

    for tick in 0..args.ticks {
        ticker.tick().await;
        if tick == 1 {
            for (label, coord) in sightings.drain(..) {
                let added = tracker.entity_added(&label, coord);
                tracing::info!("Entity {} at {} added {} destinations", label, coord, added.len());
            }
        }

        let routes = tracker.manager().snapshot();
        let Some(position) = agent.position() else {
            continue;
        };
        let nearest = routes
            .iter()
            .filter(|(_, route)| route.origin() == Some(position))
            .min_by_key(|(_, route)| route.len());

        let Some((destination, route)) = nearest else {
            tracing::info!("Tick {}: at {}, waiting for routes", tick, position);
            continue;
        };
        if route.len() <= 1 {
            tracing::info!("Tick {}: reached {}", tick, destination);
            break;
        }

        let next = walker.step(position, Some(&route.path));
        agent.set_position(next);
        tracing::info!(
            "Tick {}: {} -> {} ({} tiles left to {}, {} routes live)",
            tick,
            position,
            next,
            route.len() - 1,
            destination,
            routes.len()
        );
    }

    tracker.stop();
    Ok(())
}
