//! Area lifecycle: target resolution, clustering and entity events.
//!
//! On every area change the tracker rebuilds the grid and pathfinder, works
//! out which targets the area offers, clusters their raw coordinates and
//! (when enabled) starts routing to every representative location.

use crate::agent::AgentSource;
use crate::config::EngineConfig;
use crate::error::{AreaError, RouteError};
use crate::manager::RouteManager;
use radar_core::{
    pattern, GridCoord, PathFinder, RawTargetIndex, TargetClusterer, TargetDescription, TargetKind,
    TargetLocations, TargetTable, TileLabels, WalkabilityGrid,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Arc, RwLock};
use tokio::runtime::Handle;

/// Everything the host reports about a freshly entered area.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AreaSnapshot {
    pub name: String,
    /// Walkability codes, `grid[y][x]`.
    pub grid: Vec<Vec<u8>>,
    /// Raw label -> coordinates already known for the area.
    #[serde(default)]
    pub labels: RawTargetIndex,
    /// Per-terrain-tile labels, row-major over `tile_columns`.
    #[serde(default)]
    pub tiles: Vec<TileLabels>,
    #[serde(default)]
    pub tile_columns: usize,
}

struct ActiveArea {
    name: String,
    finder: Arc<PathFinder>,
    clusterer: TargetClusterer,
    index: RawTargetIndex,
    targets: HashMap<String, TargetDescription>,
    locations: HashMap<String, TargetLocations>,
}

impl ActiveArea {
    fn resolve(&mut self, table: &TargetTable) {
        self.targets = table.for_area(&self.name);
        self.locations = self.clusterer.cluster_all(&self.index, self.targets.values());
        tracing::info!(
            "Area {}: {} of {} targets present",
            self.name,
            self.locations.len(),
            self.targets.len()
        );
    }

    /// Distinct representative locations over all targets, ordered.
    fn destinations(&self) -> Vec<GridCoord> {
        self.locations
            .values()
            .flat_map(|l| l.locations.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

pub struct AreaTracker {
    config: EngineConfig,
    manager: Arc<RouteManager>,
    table: RwLock<TargetTable>,
    area: RwLock<Option<ActiveArea>>,
}

impl AreaTracker {
    /// Route workers run on `runtime`; the tracker itself may be driven from
    /// any thread.
    pub fn new(
        config: EngineConfig,
        agent: Arc<dyn AgentSource>,
        table: TargetTable,
        runtime: Handle,
    ) -> Self {
        let manager = Arc::new(RouteManager::new(agent, &config, runtime));
        Self {
            config,
            manager,
            table: RwLock::new(table),
            area: RwLock::new(None),
        }
    }

    pub fn manager(&self) -> &Arc<RouteManager> {
        &self.manager
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn area_name(&self) -> Option<String> {
        self.read_area().as_ref().map(|area| area.name.clone())
    }

    /// Clustered locations of every present target, keyed by target name.
    pub fn locations(&self) -> HashMap<String, TargetLocations> {
        self.read_area()
            .as_ref()
            .map(|area| area.locations.clone())
            .unwrap_or_default()
    }

    /// Switch to a new area. The previous session is stopped even when the
    /// snapshot turns out to be malformed.
    pub fn area_change(&self, snapshot: AreaSnapshot) -> Result<(), AreaError> {
        self.manager.stop();
        let mut slot = self.area.write().unwrap_or_else(|p| p.into_inner());
        *slot = None;

        let grid = Arc::new(WalkabilityGrid::from_rows(snapshot.grid)?);
        let mut index = snapshot.labels;
        index.merge(RawTargetIndex::from_tiles(
            &snapshot.tiles,
            snapshot.tile_columns,
            self.config.include_tile_paths,
        ));
        tracing::info!(
            "Entered area {} ({}x{}, {} labels)",
            snapshot.name,
            grid.width(),
            grid.height(),
            index.len()
        );

        let mut area = ActiveArea {
            name: snapshot.name,
            finder: Arc::new(PathFinder::new(grid.clone(), self.config.pathfinder.clone())),
            clusterer: TargetClusterer::new(grid, self.config.cluster.clone()),
            index,
            targets: HashMap::new(),
            locations: HashMap::new(),
        };
        area.resolve(&self.read_table());
        self.start_routing(&area);
        *slot = Some(area);
        Ok(())
    }

    /// Replace the description table and resolve the current area again.
    pub fn reload_targets(&self, table: TargetTable) {
        *self.table.write().unwrap_or_else(|p| p.into_inner()) = table;

        let mut slot = self.area.write().unwrap_or_else(|p| p.into_inner());
        let Some(area) = slot.as_mut() else {
            return;
        };
        self.manager.stop();
        area.resolve(&self.read_table());
        self.start_routing(area);
    }

    pub fn reload_targets_from(&self, path: impl AsRef<Path>) -> Result<(), AreaError> {
        let table = TargetTable::load(path)?;
        self.reload_targets(table);
        Ok(())
    }

    /// Restart routing for the current area with the same destinations.
    pub fn restart(&self) -> Result<u64, RouteError> {
        let finder = self
            .read_area()
            .as_ref()
            .map(|area| area.finder.clone())
            .ok_or(RouteError::NotStarted)?;
        self.manager.restart(finder)
    }

    pub fn stop(&self) {
        self.manager.stop();
    }

    /// A tracked entity showed up at `coord`. Returns the representative
    /// locations that were new and got a route requested.
    pub fn entity_added(&self, label: &str, coord: GridCoord) -> Vec<GridCoord> {
        let mut slot = self.area.write().unwrap_or_else(|p| p.into_inner());
        let Some(area) = slot.as_mut() else {
            return Vec::new();
        };

        let mut tracked: Vec<TargetDescription> = area
            .targets
            .values()
            .filter(|t| t.kind == TargetKind::Entity && pattern::matches(&t.name, label))
            .cloned()
            .collect();
        if tracked.is_empty() {
            return Vec::new();
        }
        if !area.clusterer.grid().contains(coord) {
            tracing::warn!("Entity {} at {} lies outside area {}", label, coord, area.name);
            return Vec::new();
        }
        if !area.index.insert(label, coord) {
            return Vec::new();
        }
        tracked.sort_by(|a, b| a.name.cmp(&b.name));

        let mut added = Vec::new();
        for target in tracked {
            let clustered = match area.clusterer.cluster_target(&area.index, &target) {
                Ok(Some(clustered)) => clustered,
                Ok(None) => continue,
                Err(err) => {
                    tracing::warn!("Entity {} for {} rejected: {}", label, target.name, err);
                    continue;
                }
            };
            let before = area
                .locations
                .get(&target.name)
                .map(|l| l.locations.clone())
                .unwrap_or_default();
            for location in &clustered.locations {
                if !before.contains(location) && !added.contains(location) {
                    added.push(*location);
                }
            }
            area.locations.insert(target.name.clone(), clustered);
        }

        if self.config.pathfinding_enabled && self.manager.is_running() {
            for destination in &added {
                if let Err(err) = self.manager.add_route(*destination) {
                    tracing::warn!("Could not route to {}: {}", destination, err);
                }
            }
        }
        added
    }

    /// Cluster `name` on the current area without touching any session.
    pub(crate) fn cluster_current(
        &self,
        name: &str,
        expected_count: usize,
    ) -> Result<Option<TargetLocations>, radar_core::ClusterError> {
        let slot = self.read_area();
        let Some(area) = slot.as_ref() else {
            return Ok(None);
        };
        let display_name = area
            .targets
            .get(name)
            .map(|t| t.label().to_string())
            .unwrap_or_else(|| name.to_string());
        let locations = area.clusterer.cluster(&area.index, name, expected_count)?;
        Ok(locations.map(|locations| TargetLocations {
            display_name,
            locations,
        }))
    }

    fn start_routing(&self, area: &ActiveArea) {
        if !self.config.pathfinding_enabled {
            return;
        }
        self.manager.start(area.finder.clone(), area.destinations());
    }

    fn read_area(&self) -> std::sync::RwLockReadGuard<'_, Option<ActiveArea>> {
        self.area.read().unwrap_or_else(|p| p.into_inner())
    }

    fn read_table(&self) -> std::sync::RwLockReadGuard<'_, TargetTable> {
        self.table.read().unwrap_or_else(|p| p.into_inner())
    }
}
