//! Target descriptions and the per-area raw label index.

use crate::models::GridCoord;
use crate::pattern;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Grid tiles per terrain tile.
pub const TILE_TO_GRID: i32 = 23;

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("failed to read target descriptions: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid target descriptions: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetKind {
    /// Static tile pattern resolved once per area.
    #[default]
    Tile,
    /// World entity whose locations arrive while the area is live.
    Entity,
}

/// One destination class an area can offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TargetDescription {
    /// Wildcard pattern over tile labels or entity paths.
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default = "default_expected_count")]
    pub expected_count: usize,
    #[serde(default, rename = "TargetType")]
    pub kind: TargetKind,
}

fn default_expected_count() -> usize {
    1
}

impl TargetDescription {
    /// Display name, falling back to the raw name when none is configured.
    pub fn label(&self) -> &str {
        if self.display_name.trim().is_empty() {
            &self.name
        } else {
            &self.display_name
        }
    }
}

/// Clustered representative points for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetLocations {
    pub display_name: String,
    pub locations: Vec<GridCoord>,
}

/// Area-name pattern -> descriptions, as stored in `targets.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetTable {
    areas: HashMap<String, Vec<TargetDescription>>,
}

impl TargetTable {
    pub fn new(areas: HashMap<String, Vec<TargetDescription>>) -> Self {
        Self { areas }
    }

    pub fn from_json(json: &str) -> Result<Self, TargetError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, TargetError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Descriptions whose area pattern matches `area_name`, keyed by target name.
    ///
    /// Patterns are visited in sorted order so a name defined under several
    /// matching patterns resolves the same way every time; the last one wins.
    pub fn for_area(&self, area_name: &str) -> HashMap<String, TargetDescription> {
        let mut patterns: Vec<&String> = self.areas.keys().collect();
        patterns.sort();

        let mut active = HashMap::new();
        for area_pattern in patterns {
            if !pattern::matches(area_pattern, area_name) {
                continue;
            }
            for description in &self.areas[area_pattern] {
                active.insert(description.name.clone(), description.clone());
            }
        }
        active
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}

/// Labels attached to one terrain tile by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileLabels {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub detail_name: Option<String>,
}

/// Raw label -> grid coordinates for the current area.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawTargetIndex {
    labels: HashMap<String, Vec<GridCoord>>,
}

impl RawTargetIndex {
    pub fn new(labels: HashMap<String, Vec<GridCoord>>) -> Self {
        Self { labels }
    }

    /// Derive labels from per-tile metadata laid out row-major over `columns`
    /// terrain tiles. Detail names are always indexed; tile paths only when
    /// `include_tile_paths` is set.
    pub fn from_tiles(tiles: &[TileLabels], columns: usize, include_tile_paths: bool) -> Self {
        let mut index = Self::default();
        if columns == 0 {
            return index;
        }
        for (tile_number, tile) in tiles.iter().enumerate() {
            let coord = GridCoord::new(
                (tile_number % columns) as i32 * TILE_TO_GRID,
                (tile_number / columns) as i32 * TILE_TO_GRID,
            );
            if include_tile_paths {
                if let Some(path) = tile.path.as_deref().filter(|p| !p.is_empty()) {
                    index.labels.entry(path.to_string()).or_default().push(coord);
                }
            }
            if let Some(name) = tile.detail_name.as_deref().filter(|n| !n.is_empty()) {
                index.labels.entry(name.to_string()).or_default().push(coord);
            }
        }
        index
    }

    /// Add a coordinate under `label`. Returns false when it was already known.
    pub fn insert(&mut self, label: &str, coord: GridCoord) -> bool {
        let coords = self.labels.entry(label.to_string()).or_default();
        if coords.contains(&coord) {
            return false;
        }
        coords.push(coord);
        true
    }

    /// Fold every coordinate of `other` into this index.
    pub fn merge(&mut self, other: RawTargetIndex) {
        for (label, coords) in other.labels {
            for coord in coords {
                self.insert(&label, coord);
            }
        }
    }

    pub fn get(&self, label: &str) -> Option<&[GridCoord]> {
        self.labels.get(label).map(Vec::as_slice)
    }

    /// All coordinates of every label matching the wildcard `name`.
    pub fn matching(&self, name: &str) -> Vec<GridCoord> {
        let mut labels: Vec<&String> = self
            .labels
            .keys()
            .filter(|label| pattern::matches(name, label))
            .collect();
        labels.sort();
        labels
            .into_iter()
            .flat_map(|label| self.labels[label].iter().copied())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}
