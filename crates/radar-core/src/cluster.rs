//! Reduction of raw target coordinates to a few walkable representatives.
//!
//! Raw matches for one target can number in the hundreds (every tile of a
//! large structure carries the label). They are grouped with k-means, each
//! group's centroid is pulled towards its walkable members, and the result is
//! snapped onto a walkable tile so a route can actually end there.

use crate::grid::WalkabilityGrid;
use crate::models::GridCoord;
use crate::spiral::spiral;
use crate::targets::{RawTargetIndex, TargetDescription, TargetLocations};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ClusterError {
    #[error("coordinate {coord} of '{target}' lies outside the {width}x{height} grid")]
    MalformedInput {
        target: String,
        coord: GridCoord,
        width: usize,
        height: usize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub max_iterations: usize,
    /// Seed for k-means++ initialisation.
    pub seed: u64,
    /// Centroid weight of a walkable member.
    pub walkable_weight: f64,
    /// Centroid weight of an unwalkable member.
    pub unwalkable_weight: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            max_iterations: 100,
            seed: 0x5eed_c1,
            walkable_weight: 100.0,
            unwalkable_weight: 1.0,
        }
    }
}

fn distance_squared(a: (f64, f64), b: (f64, f64)) -> f64 {
    let dx = a.0 - b.0;
    let dy = a.1 - b.1;
    dx * dx + dy * dy
}

fn nearest(point: (f64, f64), centroids: &[(f64, f64)]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (idx, centroid) in centroids.iter().enumerate() {
        let dist = distance_squared(point, *centroid);
        if dist < best_dist {
            best = idx;
            best_dist = dist;
        }
    }
    best
}

/// k-means++ seeding: first centroid uniform, later ones proportional to the
/// squared distance from the closest centroid picked so far.
fn seed_centroids(points: &[(f64, f64)], k: usize, rng: &mut StdRng) -> Vec<(f64, f64)> {
    let mut centroids = Vec::with_capacity(k);
    centroids.push(points[rng.random_range(0..points.len())]);

    let mut weights: Vec<f64> = points
        .iter()
        .map(|p| distance_squared(*p, centroids[0]))
        .collect();
    while centroids.len() < k {
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            break;
        }
        let mut pick = rng.random::<f64>() * total;
        let mut chosen = points.len() - 1;
        for (idx, weight) in weights.iter().enumerate() {
            if *weight <= 0.0 {
                continue;
            }
            if pick < *weight {
                chosen = idx;
                break;
            }
            pick -= weight;
            chosen = idx;
        }
        let centroid = points[chosen];
        centroids.push(centroid);
        for (weight, point) in weights.iter_mut().zip(points) {
            *weight = weight.min(distance_squared(*point, centroid));
        }
    }
    centroids
}

/// Assign each point to one of at most `k` clusters. Returns the cluster index
/// of every point, in input order.
pub fn kmeans(points: &[(f64, f64)], k: usize, max_iterations: usize, seed: u64) -> Vec<usize> {
    if points.is_empty() || k == 0 {
        return Vec::new();
    }
    let mut rng = StdRng::seed_from_u64(seed);
    let mut centroids = seed_centroids(points, k, &mut rng);
    let mut assignments = vec![usize::MAX; points.len()];

    for _ in 0..max_iterations.max(1) {
        let mut changed = false;
        for (assignment, point) in assignments.iter_mut().zip(points) {
            let cluster = nearest(*point, &centroids);
            if *assignment != cluster {
                *assignment = cluster;
                changed = true;
            }
        }
        if !changed {
            break;
        }

        let mut sums = vec![(0.0, 0.0, 0usize); centroids.len()];
        for (assignment, point) in assignments.iter().zip(points) {
            let sum = &mut sums[*assignment];
            sum.0 += point.0;
            sum.1 += point.1;
            sum.2 += 1;
        }
        for (centroid, (sx, sy, count)) in centroids.iter_mut().zip(sums) {
            // An emptied cluster keeps its last centroid.
            if count > 0 {
                *centroid = (sx / count as f64, sy / count as f64);
            }
        }
    }
    assignments
}

/// Clusters raw target coordinates against one area's grid.
#[derive(Debug, Clone)]
pub struct TargetClusterer {
    grid: Arc<WalkabilityGrid>,
    config: ClusterConfig,
}

impl TargetClusterer {
    pub fn new(grid: Arc<WalkabilityGrid>, config: ClusterConfig) -> Self {
        Self { grid, config }
    }

    pub fn grid(&self) -> &Arc<WalkabilityGrid> {
        &self.grid
    }

    /// Representative walkable points for every label matching `target_name`.
    ///
    /// `Ok(None)` means nothing matched the name at all, which callers treat as
    /// an unknown target; `Ok(Some(vec![]))` means the target exists but has
    /// nothing to show.
    pub fn cluster(
        &self,
        index: &RawTargetIndex,
        target_name: &str,
        expected_count: usize,
    ) -> Result<Option<Vec<GridCoord>>, ClusterError> {
        let raw = index.matching(target_name);
        if raw.is_empty() {
            return Ok(None);
        }
        if let Some(coord) = raw.iter().find(|c| !self.grid.contains(**c)) {
            return Err(ClusterError::MalformedInput {
                target: target_name.to_string(),
                coord: *coord,
                width: self.grid.width(),
                height: self.grid.height(),
            });
        }
        Ok(Some(self.cluster_points(&raw, expected_count)))
    }

    pub fn cluster_target(
        &self,
        index: &RawTargetIndex,
        target: &TargetDescription,
    ) -> Result<Option<TargetLocations>, ClusterError> {
        let locations = self.cluster(index, &target.name, target.expected_count)?;
        Ok(locations.map(|locations| TargetLocations {
            display_name: target.label().to_string(),
            locations,
        }))
    }

    /// Cluster every description. Absent targets are left out; malformed ones
    /// are logged and skipped so the rest still resolve.
    pub fn cluster_all<'a, I>(&self, index: &RawTargetIndex, targets: I) -> HashMap<String, TargetLocations>
    where
        I: IntoIterator<Item = &'a TargetDescription>,
    {
        let mut clustered = HashMap::new();
        for target in targets {
            match self.cluster_target(index, target) {
                Ok(Some(locations)) => {
                    clustered.insert(target.name.clone(), locations);
                }
                Ok(None) => {}
                Err(err) => tracing::warn!("Skipping target {}: {}", target.name, err),
            }
        }
        clustered
    }

    /// Cluster in-bounds coordinates into at most `expected_count` walkable points.
    pub fn cluster_points(&self, raw: &[GridCoord], expected_count: usize) -> Vec<GridCoord> {
        let distinct = raw.iter().collect::<HashSet<_>>().len();
        let k = expected_count.min(distinct);
        if k == 0 {
            return Vec::new();
        }

        let points: Vec<(f64, f64)> = raw.iter().map(|c| (c.x as f64, c.y as f64)).collect();
        let assignments = kmeans(&points, k, self.config.max_iterations, self.config.seed);

        let mut groups: Vec<Vec<GridCoord>> = vec![Vec::new(); k];
        for (coord, cluster) in raw.iter().zip(assignments) {
            groups[cluster].push(*coord);
        }

        let mut seen = HashSet::new();
        let mut result = Vec::with_capacity(k);
        for members in groups.iter().filter(|members| !members.is_empty()) {
            if let Some(location) = self.representative(members) {
                if seen.insert(location) {
                    result.push(location);
                }
            }
        }
        result
    }

    fn weighted_centroid(&self, members: &[GridCoord]) -> (f64, f64) {
        let (mut sx, mut sy, mut total) = (0.0, 0.0, 0.0);
        for member in members {
            let weight = if self.grid.is_walkable(*member) {
                self.config.walkable_weight
            } else {
                self.config.unwalkable_weight
            };
            sx += weight * member.x as f64;
            sy += weight * member.y as f64;
            total += weight;
        }
        (sx / total, sy / total)
    }

    fn representative(&self, members: &[GridCoord]) -> Option<GridCoord> {
        let centroid = self.weighted_centroid(members);

        let mut best: Option<(GridCoord, f64)> = None;
        for member in members.iter().filter(|m| self.grid.is_walkable(**m)) {
            let dist = distance_squared((member.x as f64, member.y as f64), centroid);
            if best.map_or(true, |(_, best_dist)| dist < best_dist) {
                best = Some((*member, dist));
            }
        }
        if let Some((member, _)) = best {
            return Some(member);
        }

        let bounds = self.grid.bounds();
        let center = bounds.clamp(GridCoord::new(
            centroid.0.round() as i32,
            centroid.1.round() as i32,
        ));
        let fallback = spiral(center, bounds).find(|c| self.grid.is_walkable(*c));
        if fallback.is_none() {
            tracing::warn!("No walkable tile anywhere near cluster centre {}", center);
        }
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_grid(width: usize, height: usize) -> Arc<WalkabilityGrid> {
        Arc::new(WalkabilityGrid::from_codes(width, height, vec![5; width * height]).unwrap())
    }

    fn index_of(label: &str, coords: &[(i32, i32)]) -> RawTargetIndex {
        let mut index = RawTargetIndex::default();
        for (x, y) in coords {
            index.insert(label, GridCoord::new(*x, *y));
        }
        index
    }

    #[test]
    fn unknown_target_is_absent() {
        let clusterer = TargetClusterer::new(open_grid(5, 5), ClusterConfig::default());
        let index = index_of("chest", &[(1, 1)]);
        assert_eq!(clusterer.cluster(&index, "portal*", 3), Ok(None));
    }

    #[test]
    fn zero_expected_count_is_present_but_empty() {
        let clusterer = TargetClusterer::new(open_grid(5, 5), ClusterConfig::default());
        let index = index_of("chest", &[(1, 1), (3, 3)]);
        assert_eq!(clusterer.cluster(&index, "chest", 0), Ok(Some(vec![])));
    }

    #[test]
    fn unwalkable_member_snaps_to_walkable_neighbour() {
        let mut rows = vec![vec![5u8; 12]; 12];
        rows[1][1] = 0;
        let grid = Arc::new(WalkabilityGrid::from_rows(rows).unwrap());
        let clusterer = TargetClusterer::new(grid.clone(), ClusterConfig::default());
        let index = index_of("altar", &[(1, 1), (1, 2), (9, 9)]);

        let mut locations = clusterer.cluster(&index, "altar", 2).unwrap().unwrap();
        locations.sort();
        assert_eq!(locations, vec![GridCoord::new(1, 2), GridCoord::new(9, 9)]);
        assert!(locations.iter().all(|c| grid.is_walkable(*c)));
    }

    #[test]
    fn all_unwalkable_cluster_falls_back_to_spiral() {
        let grid = Arc::new(
            WalkabilityGrid::from_ascii(
                "
                ........
                .####...
                .####...
                .####...
                ........
                ",
            )
            .unwrap(),
        );
        let clusterer = TargetClusterer::new(grid.clone(), ClusterConfig::default());
        let index = index_of("statue", &[(2, 2), (3, 2), (2, 3), (3, 3)]);

        let locations = clusterer.cluster(&index, "statue", 1).unwrap().unwrap();
        assert_eq!(locations.len(), 1);
        assert!(grid.is_walkable(locations[0]));
        // The nearest open ring around the middle of the block.
        let dist = locations[0].distance_squared(GridCoord::new(3, 3));
        assert!(dist <= 8, "fallback landed too far away: {}", locations[0]);
    }

    #[test]
    fn no_walkable_tile_anywhere_drops_the_cluster() {
        let grid = Arc::new(WalkabilityGrid::from_codes(3, 3, vec![0; 9]).unwrap());
        let clusterer = TargetClusterer::new(grid, ClusterConfig::default());
        let index = index_of("ghost", &[(1, 1)]);
        assert_eq!(clusterer.cluster(&index, "ghost", 1), Ok(Some(vec![])));
    }

    #[test]
    fn result_never_exceeds_expected_count() {
        let clusterer = TargetClusterer::new(open_grid(60, 60), ClusterConfig::default());
        let coords: Vec<(i32, i32)> = (0..60).flat_map(|x| [(x, x % 7), (x, 50 + x % 5)]).collect();
        let index = index_of("ore", &coords);
        for expected in 0..6 {
            let locations = clusterer.cluster(&index, "ore", expected).unwrap().unwrap();
            assert!(locations.len() <= expected);
            let unique: HashSet<_> = locations.iter().collect();
            assert_eq!(unique.len(), locations.len());
        }
    }

    #[test]
    fn fewer_points_than_expected_clusters() {
        let clusterer = TargetClusterer::new(open_grid(10, 10), ClusterConfig::default());
        let index = index_of("door", &[(2, 2), (7, 7)]);
        let mut locations = clusterer.cluster(&index, "door", 5).unwrap().unwrap();
        locations.sort();
        assert_eq!(locations, vec![GridCoord::new(2, 2), GridCoord::new(7, 7)]);
    }

    #[test]
    fn out_of_bounds_coordinate_is_malformed() {
        let clusterer = TargetClusterer::new(open_grid(4, 4), ClusterConfig::default());
        let index = index_of("exit", &[(1, 1), (23, 0)]);
        let err = clusterer.cluster(&index, "exit", 1).unwrap_err();
        assert!(matches!(err, ClusterError::MalformedInput { coord, .. } if coord == GridCoord::new(23, 0)));
    }

    #[test]
    fn kmeans_separates_distant_groups() {
        let points = vec![(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (50.0, 50.0), (51.0, 50.0)];
        let assignments = kmeans(&points, 2, 100, 7);
        assert_eq!(assignments[0], assignments[1]);
        assert_eq!(assignments[0], assignments[2]);
        assert_eq!(assignments[3], assignments[4]);
        assert_ne!(assignments[0], assignments[3]);
    }

    #[test]
    fn cluster_all_skips_absent_targets() {
        let clusterer = TargetClusterer::new(open_grid(8, 8), ClusterConfig::default());
        let index = index_of("well", &[(4, 4)]);
        let targets = vec![
            TargetDescription {
                name: "well".into(),
                display_name: "Well".into(),
                expected_count: 1,
                kind: Default::default(),
            },
            TargetDescription {
                name: "missing".into(),
                display_name: String::new(),
                expected_count: 1,
                kind: Default::default(),
            },
        ];
        let clustered = clusterer.cluster_all(&index, &targets);
        assert_eq!(clustered.len(), 1);
        assert_eq!(clustered["well"].display_name, "Well");
        assert_eq!(clustered["well"].locations, vec![GridCoord::new(4, 4)]);
    }

    #[test]
    fn blank_display_name_falls_back_to_target_name() {
        let clusterer = TargetClusterer::new(open_grid(8, 8), ClusterConfig::default());
        let index = index_of("shrine", &[(2, 6)]);
        let target = TargetDescription {
            name: "shrine".into(),
            display_name: "  ".into(),
            expected_count: 1,
            kind: Default::default(),
        };
        let clustered = clusterer.cluster_target(&index, &target).unwrap().unwrap();
        assert_eq!(clustered.display_name, "shrine");
        assert_eq!(clusterer.cluster_all(&index, [&target])["shrine"].display_name, "shrine");
    }
}
