pub mod cluster;
pub mod grid;
pub mod models;
pub mod pathfinder;
pub mod pattern;
pub mod spiral;
pub mod targets;

pub use cluster::{kmeans, ClusterConfig, ClusterError, TargetClusterer};
pub use grid::{is_walkable_code, GridError, WalkabilityGrid, WALKABLE_CODES};
pub use models::{GridBounds, GridCoord};
pub use pathfinder::{
    octile_distance, path_cost, FirstScan, PathFinder, PathFinderConfig, ScanBatch, DIAGONAL_COST,
    STRAIGHT_COST,
};
pub use spiral::{spiral, Spiral};
pub use targets::{
    RawTargetIndex, TargetDescription, TargetError, TargetKind, TargetLocations, TargetTable,
    TileLabels, TILE_TO_GRID,
};
