//! Hierarchical grid pathfinder.
//!
//! Movement is 8-connected without corner cutting: a diagonal step needs both
//! orthogonal neighbours to be walkable. Orthogonal steps cost 10, diagonal
//! steps 14, and the heuristic is the matching octile distance.
//!
//! [`PathFinder::run_first_scan`] answers quickly on coarse layers first and
//! narrows down level by level; [`PathFinder::find_path`] is the single exact
//! search used to re-plan while the agent moves.

use crate::grid::WalkabilityGrid;
use crate::models::GridCoord;
use serde::{Deserialize, Serialize};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::Arc;

pub const STRAIGHT_COST: u32 = 10;
pub const DIAGONAL_COST: u32 = 14;

const NEIGHBOURS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

/// Levels above this would collapse blocks wider than any realistic area.
const MAX_LEVEL: u8 = 12;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathFinderConfig {
    /// Scan levels, coarsest first. Level `n` merges `2^(n-1)` square tiles
    /// into one cell; level 1 is the tile grid itself.
    pub levels: Vec<u8>,
    /// How many cells around the previous level's path the next level may use.
    pub corridor_margin: i32,
}

impl Default for PathFinderConfig {
    fn default() -> Self {
        Self {
            levels: vec![5, 4, 3, 2, 1],
            corridor_margin: 2,
        }
    }
}

/// Best path found on one scan level. Empty when the level found nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanBatch {
    pub level: u8,
    pub path: Vec<GridCoord>,
}

/// Octile distance in step-cost units.
pub fn octile_distance(a: GridCoord, b: GridCoord) -> u32 {
    let dx = (a.x - b.x).unsigned_abs();
    let dy = (a.y - b.y).unsigned_abs();
    let (short, long) = if dx < dy { (dx, dy) } else { (dy, dx) };
    DIAGONAL_COST * short + STRAIGHT_COST * (long - short)
}

/// Sum of step costs along a path.
pub fn path_cost(path: &[GridCoord]) -> u32 {
    path.windows(2)
        .map(|pair| octile_distance(pair[0], pair[1]))
        .sum()
}

/// Grid collapsed into `block` x `block` cells; a cell is open when any tile
/// inside it is walkable.
#[derive(Debug, Clone)]
struct CoarseLayer {
    level: u8,
    block: i32,
    width: usize,
    height: usize,
    open: Vec<bool>,
}

impl CoarseLayer {
    fn build(grid: &WalkabilityGrid, level: u8) -> Self {
        let level = level.clamp(1, MAX_LEVEL);
        let block = 1i32 << (level - 1);
        let b = block as usize;
        let width = grid.width().div_ceil(b);
        let height = grid.height().div_ceil(b);
        let mut open = vec![false; width * height];
        for y in 0..grid.height() {
            for x in 0..grid.width() {
                if grid.is_walkable(GridCoord::new(x as i32, y as i32)) {
                    open[(y / b) * width + x / b] = true;
                }
            }
        }
        Self {
            level,
            block,
            width,
            height,
            open,
        }
    }

    fn cell_of(&self, tile: GridCoord) -> GridCoord {
        GridCoord::new(tile.x.div_euclid(self.block), tile.y.div_euclid(self.block))
    }

    /// Top-left tile of a cell.
    fn origin_tile(&self, cell: GridCoord) -> GridCoord {
        GridCoord::new(cell.x * self.block, cell.y * self.block)
    }

    fn is_open(&self, cell: GridCoord) -> bool {
        if cell.x < 0 || cell.y < 0 {
            return false;
        }
        let (x, y) = (cell.x as usize, cell.y as usize);
        x < self.width && y < self.height && self.open[y * self.width + x]
    }
}

/// Set of coarse cells a search is allowed to enter.
#[derive(Debug, Clone)]
struct Corridor {
    block: i32,
    cells: HashSet<GridCoord>,
}

impl Corridor {
    /// Cells touched by `tiles` at `block` resolution, grown by `margin`.
    fn around_tiles(tiles: &[GridCoord], block: i32, margin: i32) -> Self {
        let cells: Vec<GridCoord> = tiles
            .iter()
            .map(|t| GridCoord::new(t.x.div_euclid(block), t.y.div_euclid(block)))
            .collect();
        Self::around_cells(&cells, block, margin)
    }

    fn around_cells(cells: &[GridCoord], block: i32, margin: i32) -> Self {
        let margin = margin.max(0);
        let mut grown = HashSet::with_capacity(cells.len() * ((2 * margin + 1) as usize).pow(2));
        for cell in cells {
            for dy in -margin..=margin {
                for dx in -margin..=margin {
                    grown.insert(cell.offset(dx, dy));
                }
            }
        }
        Self {
            block,
            cells: grown,
        }
    }

    fn admits_tile(&self, tile: GridCoord) -> bool {
        self.cells.contains(&GridCoord::new(
            tile.x.div_euclid(self.block),
            tile.y.div_euclid(self.block),
        ))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    coord: GridCoord,
    g_score: u32,
    f_score: u32,
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Deeper nodes first among equal f-scores.
        self.f_score
            .cmp(&other.f_score)
            .then_with(|| other.g_score.cmp(&self.g_score))
            .then_with(|| self.coord.cmp(&other.coord))
    }
}

/// Weighted A* between two cells of whatever space `passable` describes.
///
/// `passable` must reject everything outside the space. With `weight == 1`
/// the result is a shortest path.
fn astar<F>(start: GridCoord, goal: GridCoord, weight: u32, passable: F) -> Vec<GridCoord>
where
    F: Fn(GridCoord) -> bool,
{
    if !passable(start) || !passable(goal) {
        return Vec::new();
    }
    if start == goal {
        return vec![start];
    }

    let weight = weight.max(1);
    let mut open_set: BinaryHeap<Reverse<OpenNode>> = BinaryHeap::new();
    let mut g_score: HashMap<GridCoord, u32> = HashMap::new();
    let mut came_from: HashMap<GridCoord, GridCoord> = HashMap::new();
    let mut closed_set: HashSet<GridCoord> = HashSet::new();

    g_score.insert(start, 0);
    open_set.push(Reverse(OpenNode {
        coord: start,
        g_score: 0,
        f_score: weight * octile_distance(start, goal),
    }));

    while let Some(Reverse(current)) = open_set.pop() {
        if current.coord == goal {
            return reconstruct_path(&came_from, goal);
        }
        if !closed_set.insert(current.coord) {
            continue;
        }
        let best_g = g_score.get(&current.coord).copied().unwrap_or(u32::MAX);
        if current.g_score > best_g {
            continue;
        }

        for (dx, dy) in NEIGHBOURS {
            let next = current.coord.offset(dx, dy);
            if closed_set.contains(&next) || !passable(next) {
                continue;
            }
            let diagonal = dx != 0 && dy != 0;
            if diagonal
                && !(passable(current.coord.offset(dx, 0)) && passable(current.coord.offset(0, dy)))
            {
                continue;
            }

            let step = if diagonal { DIAGONAL_COST } else { STRAIGHT_COST };
            let tentative_g = best_g + step;
            if tentative_g < g_score.get(&next).copied().unwrap_or(u32::MAX) {
                came_from.insert(next, current.coord);
                g_score.insert(next, tentative_g);
                open_set.push(Reverse(OpenNode {
                    coord: next,
                    g_score: tentative_g,
                    f_score: tentative_g + weight * octile_distance(next, goal),
                }));
            }
        }
    }

    Vec::new()
}

fn reconstruct_path(came_from: &HashMap<GridCoord, GridCoord>, goal: GridCoord) -> Vec<GridCoord> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(prev) = came_from.get(&current) {
        path.push(*prev);
        current = *prev;
    }
    path.reverse();
    path
}

/// Pathfinder bound to one area's grid. Coarse layers are built up front.
#[derive(Debug, Clone)]
pub struct PathFinder {
    grid: Arc<WalkabilityGrid>,
    config: PathFinderConfig,
    layers: Vec<CoarseLayer>,
}

impl PathFinder {
    pub fn new(grid: Arc<WalkabilityGrid>, config: PathFinderConfig) -> Self {
        let layers = config
            .levels
            .iter()
            .map(|level| CoarseLayer::build(&grid, *level))
            .collect();
        Self {
            grid,
            config,
            layers,
        }
    }

    pub fn grid(&self) -> &Arc<WalkabilityGrid> {
        &self.grid
    }

    pub fn config(&self) -> &PathFinderConfig {
        &self.config
    }

    /// Exact shortest path from `origin` to `destination`, or empty when none
    /// exists (including unwalkable or out-of-bounds endpoints).
    pub fn find_path(&self, origin: GridCoord, destination: GridCoord) -> Vec<GridCoord> {
        let grid = &self.grid;
        astar(origin, destination, 1, |c| grid.is_walkable(c))
    }

    /// Coarse-to-fine scan. Each `next()` computes one level, so a consumer
    /// cancels by simply not pulling further batches.
    pub fn run_first_scan(&self, origin: GridCoord, destination: GridCoord) -> FirstScan<'_> {
        FirstScan {
            finder: self,
            origin,
            destination,
            next_layer: 0,
            previous: None,
        }
    }
}

/// Iterator over the batches of [`PathFinder::run_first_scan`].
#[derive(Debug)]
pub struct FirstScan<'a> {
    finder: &'a PathFinder,
    origin: GridCoord,
    destination: GridCoord,
    next_layer: usize,
    /// Last non-empty path and the block size of the level that produced it.
    previous: Option<(Vec<GridCoord>, i32)>,
}

impl FirstScan<'_> {
    pub fn remaining_levels(&self) -> usize {
        self.finder.layers.len() - self.next_layer
    }

    fn corridor(&self) -> Option<Corridor> {
        let margin = self.finder.config.corridor_margin;
        self.previous
            .as_ref()
            .map(|(path, block)| Corridor::around_tiles(path, *block, margin))
    }

    fn scan_coarse(&self, layer: &CoarseLayer) -> Vec<GridCoord> {
        let grid = &self.finder.grid;
        let start = layer.cell_of(self.origin);
        let goal = layer.cell_of(self.destination);

        let corridor = self.corridor();
        let mut cells = match &corridor {
            Some(corridor) => astar(start, goal, 1, |cell| {
                layer.is_open(cell) && corridor.admits_tile(layer.origin_tile(cell))
            }),
            None => Vec::new(),
        };
        if cells.is_empty() {
            cells = astar(start, goal, 1, |cell| layer.is_open(cell));
        }
        if cells.is_empty() {
            return Vec::new();
        }

        let band = Corridor::around_cells(&cells, layer.block, 1);
        astar(self.origin, self.destination, layer.level as u32, |tile| {
            grid.is_walkable(tile) && band.admits_tile(tile)
        })
    }

    fn scan_finest(&self) -> Vec<GridCoord> {
        let grid = &self.finder.grid;
        if let Some(corridor) = self.corridor() {
            let path = astar(self.origin, self.destination, 1, |tile| {
                grid.is_walkable(tile) && corridor.admits_tile(tile)
            });
            if !path.is_empty() {
                return path;
            }
        }
        self.finder.find_path(self.origin, self.destination)
    }
}

impl Iterator for FirstScan<'_> {
    type Item = ScanBatch;

    fn next(&mut self) -> Option<ScanBatch> {
        let layer = self.finder.layers.get(self.next_layer)?;
        self.next_layer += 1;

        let grid = &self.finder.grid;
        if !grid.is_walkable(self.origin) || !grid.is_walkable(self.destination) {
            return Some(ScanBatch {
                level: layer.level,
                path: Vec::new(),
            });
        }

        let path = if layer.block == 1 {
            self.scan_finest()
        } else {
            self.scan_coarse(layer)
        };
        if !path.is_empty() {
            self.previous = Some((path.clone(), layer.block));
        }
        Some(ScanBatch {
            level: layer.level,
            path,
        })
    }
}
