//! One-shot route query against an area file.
//!
//! Prints every first-scan batch, coarsest first, followed by the exact path.
//!
//! Usage:
//!   cargo run -p radar-cli --bin find_path -- --area demos/cave.txt --from 1,1 --to 18,10

use anyhow::Result;
use clap::Parser;
use radar_cli::{load_area, parse_coord};
use radar_core::{path_cost, PathFinder, WalkabilityGrid};
use radar_engine::{init_tracing, EngineConfig};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Find a walking route between two tiles
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Area file (.json snapshot or ASCII picture)
    #[arg(long)]
    area: PathBuf,

    /// Origin as x,y
    #[arg(long)]
    from: String,

    /// Destination as x,y
    #[arg(long)]
    to: String,

    /// Print the result as JSON instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Serialize)]
struct BatchReport {
    level: Option<u8>,
    steps: usize,
    cost: u32,
    millis: u128,
    path: Vec<radar_core::GridCoord>,
}

fn main() -> Result<()> {
    init_tracing("radar_engine=info", false)?;
    let args = Args::parse();
    let config = EngineConfig::from_env();

    let from = parse_coord(&args.from)?;
    let to = parse_coord(&args.to)?;
    let area = load_area(&args.area)?;
    let grid = Arc::new(WalkabilityGrid::from_rows(area.grid)?);
    let finder = PathFinder::new(grid, config.pathfinder);

    let mut reports = Vec::new();
    let started = Instant::now();
    for batch in finder.run_first_scan(from, to) {
        reports.push(BatchReport {
            level: Some(batch.level),
            steps: batch.path.len().saturating_sub(1),
            cost: path_cost(&batch.path),
            millis: started.elapsed().as_millis(),
            path: batch.path,
        });
    }
    let started = Instant::now();
    let exact = finder.find_path(from, to);
    reports.push(BatchReport {
        level: None,
        steps: exact.len().saturating_sub(1),
        cost: path_cost(&exact),
        millis: started.elapsed().as_millis(),
        path: exact,
    });

    if args.json {
        println!("{}", serde_json::to_string_pretty(&reports)?);
        return Ok(());
    }

    println!("Route {} -> {} on {}", from, to, args.area.display());
    for report in &reports {
        let label = match report.level {
            Some(level) => format!("level {level}"),
            None => "exact".to_string(),
        };
        if report.path.is_empty() {
            println!("  {label:>8}: no path ({} ms)", report.millis);
        } else {
            println!(
                "  {label:>8}: {} steps, cost {} ({} ms)",
                report.steps, report.cost, report.millis
            );
        }
    }
    Ok(())
}
