//! Engine configuration from environment.

use radar_core::{ClusterConfig, PathFinderConfig};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// How often a tracking worker looks at the agent position.
    pub poll_interval: Duration,
    /// How often a paused worker checks whether it may resume.
    pub pause_check_interval: Duration,
    pub pathfinder: PathFinderConfig,
    pub cluster: ClusterConfig,
    /// Start routing automatically on area change.
    pub pathfinding_enabled: bool,
    /// Index terrain tile paths as target labels in addition to detail names.
    pub include_tile_paths: bool,
    pub targets_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            pause_check_interval: Duration::from_millis(1000),
            pathfinder: PathFinderConfig::default(),
            cluster: ClusterConfig::default(),
            pathfinding_enabled: true,
            include_tile_paths: false,
            targets_path: PathBuf::from("targets.json"),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Parse a comma-separated level list such as `5,4,3,2,1`. Zero, unparsable
/// and empty lists are rejected as a whole, as is any list that does not end
/// at the tile level 1.
pub fn parse_levels(raw: &str) -> Option<Vec<u8>> {
    let levels = raw
        .split(',')
        .map(|part| part.trim().parse::<u8>().ok().filter(|level| *level > 0))
        .collect::<Option<Vec<u8>>>()?;
    if levels.last() == Some(&1) {
        Some(levels)
    } else {
        None
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let levels = env::var("RADAR_SCAN_LEVELS")
            .ok()
            .and_then(|raw| parse_levels(&raw))
            .unwrap_or(defaults.pathfinder.levels);

        Self {
            poll_interval: Duration::from_millis(env_or("RADAR_POLL_INTERVAL_MS", 100)),
            pause_check_interval: Duration::from_millis(env_or("RADAR_PAUSE_CHECK_MS", 1000)),
            pathfinder: PathFinderConfig {
                levels,
                corridor_margin: env_or("RADAR_CORRIDOR_MARGIN", defaults.pathfinder.corridor_margin),
            },
            cluster: ClusterConfig {
                max_iterations: env_or("RADAR_KMEANS_MAX_ITERATIONS", defaults.cluster.max_iterations),
                seed: env_or("RADAR_KMEANS_SEED", defaults.cluster.seed),
                ..defaults.cluster
            },
            pathfinding_enabled: env_or("RADAR_PATHFINDING_ENABLED", defaults.pathfinding_enabled),
            include_tile_paths: env_or("RADAR_INCLUDE_TILE_PATHS", defaults.include_tile_paths),
            targets_path: env::var("RADAR_TARGETS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.targets_path),
        }
    }
}
