//! Cluster every target an area offers and print the representative points.
//!
//! Usage:
//!   cargo run -p radar-cli --bin cluster_targets -- --area demos/crypt.json --targets demos/targets.json

use anyhow::{Context, Result};
use clap::Parser;
use radar_cli::load_area;
use radar_core::{RawTargetIndex, TargetClusterer, TargetTable, WalkabilityGrid};
use radar_engine::{init_tracing, EngineConfig};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Resolve and cluster the targets of one area
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Area file (.json snapshot or ASCII picture)
    #[arg(long)]
    area: PathBuf,

    /// Target description table (defaults to RADAR_TARGETS_PATH)
    #[arg(long)]
    targets: Option<PathBuf>,

    /// Area name used for target resolution (defaults to the file's)
    #[arg(long)]
    name: Option<String>,
}

fn main() -> Result<()> {
    init_tracing("radar_core=info", false)?;
    let args = Args::parse();
    let config = EngineConfig::from_env();

    let targets_path = args.targets.unwrap_or(config.targets_path);
    let table = TargetTable::load(&targets_path)
        .with_context(|| format!("loading {}", targets_path.display()))?;

    let area = load_area(&args.area)?;
    let area_name = args.name.unwrap_or(area.name);
    let grid = Arc::new(WalkabilityGrid::from_rows(area.grid)?);
    let mut index = area.labels;
    index.merge(RawTargetIndex::from_tiles(
        &area.tiles,
        area.tile_columns,
        config.include_tile_paths,
    ));

    let targets = table.for_area(&area_name);
    tracing::info!("{} targets active in {}", targets.len(), area_name);

    let clusterer = TargetClusterer::new(grid, config.cluster);
    let clustered: BTreeMap<String, _> = clusterer
        .cluster_all(&index, targets.values())
        .into_iter()
        .collect();

    println!("{}", serde_json::to_string_pretty(&clustered)?);
    Ok(())
}
