//! Scripted agent movement for simulations.

use radar_core::GridCoord;

/// Decides where the simulated agent goes next.
pub trait Walker: Send + Sync {
    /// Next position, given the current one and the route being displayed
    /// towards the chosen destination (if any).
    fn step(&mut self, position: GridCoord, route: Option<&[GridCoord]>) -> GridCoord;
}

/// Follows the displayed route a fixed number of tiles per tick.
#[derive(Debug, Clone)]
pub struct StepWalker {
    pub tiles_per_tick: usize,
}

impl StepWalker {
    pub fn new(tiles_per_tick: usize) -> Self {
        Self {
            tiles_per_tick: tiles_per_tick.max(1),
        }
    }
}

impl Walker for StepWalker {
    fn step(&mut self, position: GridCoord, route: Option<&[GridCoord]>) -> GridCoord {
        let Some(route) = route.filter(|r| !r.is_empty()) else {
            return position;
        };
        // Routes lag a tick behind the agent; resume from wherever we are on it.
        let Some(here) = route.iter().position(|c| *c == position) else {
            return position;
        };
        let next = (here + self.tiles_per_tick).min(route.len() - 1);
        route[next]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route() -> Vec<GridCoord> {
        (0..6).map(|x| GridCoord::new(x, 1)).collect()
    }

    #[test]
    fn advances_along_route() {
        let mut walker = StepWalker::new(2);
        let route = route();
        assert_eq!(walker.step(GridCoord::new(0, 1), Some(&route)), GridCoord::new(2, 1));
        assert_eq!(walker.step(GridCoord::new(3, 1), Some(&route)), GridCoord::new(5, 1));
        assert_eq!(walker.step(GridCoord::new(5, 1), Some(&route)), GridCoord::new(5, 1));
    }

    #[test]
    fn stays_put_without_usable_route() {
        let mut walker = StepWalker::new(1);
        let here = GridCoord::new(9, 9);
        assert_eq!(walker.step(here, None), here);
        assert_eq!(walker.step(here, Some(&[])), here);
        assert_eq!(walker.step(here, Some(&route())), here);
    }
}
