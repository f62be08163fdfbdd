//! Expanding-ring enumeration of grid coordinates.
//!
//! Used as the fallback when a representative point has to be moved onto
//! walkable ground: walk outwards from the point and take the first hit.

use crate::models::{GridBounds, GridCoord};

/// Enumerate every coordinate of `bound`, nearest rings around `start` first.
///
/// `start` itself comes first (when inside `bound`), followed by the square
/// rings of radius 1, 2, 3, ... clipped to `bound`. The iterator ends once a
/// ring spans the whole bound, so each coordinate is produced exactly once.
pub fn spiral(start: GridCoord, bound: GridBounds) -> Spiral {
    // Rings closer than the bound's nearest edge are empty; skip them.
    let gap_x = (bound.min.x - start.x).max(start.x - bound.max.x).max(0);
    let gap_y = (bound.min.y - start.y).max(start.y - bound.max.y).max(0);
    Spiral {
        start,
        bound,
        radius: gap_x.max(gap_y),
        ring: Vec::new(),
        done: bound.is_empty(),
    }
}

/// Lazy iterator returned by [`spiral`]. Rings are materialised one at a time.
#[derive(Debug, Clone)]
pub struct Spiral {
    start: GridCoord,
    bound: GridBounds,
    radius: i32,
    /// Pending coordinates of the current ring, stored reversed.
    ring: Vec<GridCoord>,
    done: bool,
}

impl Spiral {
    fn spans_bound(&self, radius: i32) -> bool {
        self.start.x - radius <= self.bound.min.x
            && self.start.x + radius >= self.bound.max.x
            && self.start.y - radius <= self.bound.min.y
            && self.start.y + radius >= self.bound.max.y
    }

    fn fill_ring(&mut self, radius: i32) {
        let (sx, sy) = (self.start.x, self.start.y);
        let b = self.bound;
        if radius == 0 {
            if b.contains(self.start) {
                self.ring.push(self.start);
            }
            return;
        }

        let x_lo = (sx - radius).max(b.min.x);
        let x_hi = (sx + radius).min(b.max.x);
        let top = sy - radius;
        let bottom = sy + radius;

        if top >= b.min.y && top <= b.max.y {
            self.ring.extend((x_lo..=x_hi).map(|x| GridCoord::new(x, top)));
        }
        if bottom >= b.min.y && bottom <= b.max.y {
            self.ring.extend((x_lo..=x_hi).map(|x| GridCoord::new(x, bottom)));
        }

        let y_lo = (top + 1).max(b.min.y);
        let y_hi = (bottom - 1).min(b.max.y);
        let left = sx - radius;
        let right = sx + radius;
        if left >= b.min.x && left <= b.max.x {
            self.ring.extend((y_lo..=y_hi).map(|y| GridCoord::new(left, y)));
        }
        if right >= b.min.x && right <= b.max.x {
            self.ring.extend((y_lo..=y_hi).map(|y| GridCoord::new(right, y)));
        }
        self.ring.reverse();
    }
}

impl Iterator for Spiral {
    type Item = GridCoord;

    fn next(&mut self) -> Option<GridCoord> {
        loop {
            if let Some(coord) = self.ring.pop() {
                return Some(coord);
            }
            if self.done {
                return None;
            }
            // A clipped ring can still be empty; keep growing.
            let radius = self.radius;
            self.fill_ring(radius);
            if self.spans_bound(radius) {
                self.done = true;
            }
            self.radius += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn assert_covers_once(start: GridCoord, bound: GridBounds) {
        let produced: Vec<GridCoord> = spiral(start, bound).collect();
        let unique: HashSet<GridCoord> = produced.iter().copied().collect();
        assert_eq!(unique.len(), produced.len(), "duplicate coordinate from {start}");
        assert_eq!(produced.len(), bound.area(), "missing coordinates from {start}");
        assert!(produced.iter().all(|c| bound.contains(*c)));
    }

    #[test]
    fn covers_bound_exactly_once_from_any_start() {
        let bound = GridBounds::of_size(7, 4);
        for x in -3..10 {
            for y in -3..7 {
                assert_covers_once(GridCoord::new(x, y), bound);
            }
        }
    }

    #[test]
    fn starts_with_origin_then_first_ring() {
        let bound = GridBounds::of_size(10, 10);
        let coords: Vec<GridCoord> = spiral(GridCoord::new(5, 5), bound).take(9).collect();
        assert_eq!(coords[0], GridCoord::new(5, 5));
        assert!(coords[1..]
            .iter()
            .all(|c| c.is_adjacent(GridCoord::new(5, 5))));
    }

    #[test]
    fn rings_grow_monotonically() {
        let start = GridCoord::new(2, 8);
        let bound = GridBounds::of_size(12, 12);
        let mut last = 0;
        for coord in spiral(start, bound) {
            let ring = (coord.x - start.x).abs().max((coord.y - start.y).abs());
            assert!(ring >= last);
            last = ring;
        }
    }

    #[test]
    fn empty_bound_yields_nothing() {
        let bound = GridBounds::of_size(0, 0);
        assert_eq!(spiral(GridCoord::new(0, 0), bound).count(), 0);
    }

    #[test]
    fn single_tile_bound() {
        let bound = GridBounds::of_size(1, 1);
        let coords: Vec<GridCoord> = spiral(GridCoord::new(40, -3), bound).collect();
        assert_eq!(coords, vec![GridCoord::new(0, 0)]);
    }
}
