//! Core data models shared by the grid, pathfinder and clusterer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Integer tile position in area-local grid space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
}

impl GridCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Truncate a fractional grid position (as reported by the host) to a tile.
    pub fn from_f32(x: f32, y: f32) -> Self {
        Self {
            x: x as i32,
            y: y as i32,
        }
    }

    pub fn distance_squared(self, other: GridCoord) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    /// True when `other` is one of the 8 surrounding tiles.
    pub fn is_adjacent(self, other: GridCoord) -> bool {
        let dx = (self.x - other.x).abs();
        let dy = (self.y - other.y).abs();
        dx <= 1 && dy <= 1 && (dx, dy) != (0, 0)
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

impl From<(i32, i32)> for GridCoord {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Inclusive rectangle of grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridBounds {
    pub min: GridCoord,
    pub max: GridCoord,
}

impl GridBounds {
    pub fn new(min: GridCoord, max: GridCoord) -> Self {
        Self { min, max }
    }

    /// Bounds of a `width` x `height` grid anchored at the origin.
    pub fn of_size(width: usize, height: usize) -> Self {
        Self {
            min: GridCoord::new(0, 0),
            max: GridCoord::new(width as i32 - 1, height as i32 - 1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn contains(&self, coord: GridCoord) -> bool {
        coord.x >= self.min.x && coord.x <= self.max.x && coord.y >= self.min.y && coord.y <= self.max.y
    }

    /// Clamp a coordinate into the rectangle. Meaningless on empty bounds.
    pub fn clamp(&self, coord: GridCoord) -> GridCoord {
        GridCoord {
            x: coord.x.clamp(self.min.x, self.max.x),
            y: coord.y.clamp(self.min.y, self.max.y),
        }
    }

    pub fn area(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        (self.max.x - self.min.x + 1) as usize * (self.max.y - self.min.y + 1) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjacency_is_eight_connected() {
        let c = GridCoord::new(3, 3);
        assert!(c.is_adjacent(GridCoord::new(4, 4)));
        assert!(c.is_adjacent(GridCoord::new(3, 2)));
        assert!(!c.is_adjacent(c));
        assert!(!c.is_adjacent(GridCoord::new(5, 3)));
    }

    #[test]
    fn bounds_of_size_are_inclusive() {
        let bounds = GridBounds::of_size(4, 3);
        assert!(bounds.contains(GridCoord::new(3, 2)));
        assert!(!bounds.contains(GridCoord::new(4, 2)));
        assert_eq!(bounds.area(), 12);
        assert!(GridBounds::of_size(0, 3).is_empty());
    }
}
