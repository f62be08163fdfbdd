//! Live route table.

use crate::cancel::CancelSignal;
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use radar_core::GridCoord;
use std::sync::Arc;

/// One published route. Immutable once built; replaced wholesale on update.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub path: Arc<[GridCoord]>,
    /// Scan level that produced the route, `None` for tracking re-plans.
    pub level: Option<u8>,
    pub computed_at: DateTime<Utc>,
}

impl Route {
    pub fn new(path: Vec<GridCoord>, level: Option<u8>) -> Self {
        Self {
            path: path.into(),
            level,
            computed_at: Utc::now(),
        }
    }

    pub fn origin(&self) -> Option<GridCoord> {
        self.path.first().copied()
    }

    pub fn destination(&self) -> Option<GridCoord> {
        self.path.last().copied()
    }

    pub fn len(&self) -> usize {
        self.path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}

/// Destination -> current route. Writers replace whole entries, so a reader
/// sees either the old or the new route, never a mix.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: DashMap<GridCoord, Route>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, destination: GridCoord, route: Route) {
        self.routes.insert(destination, route);
    }

    /// Publish only while `cancel` is clear. The check runs under the entry
    /// lock, so once a signal is raised and the entry removed afterwards, the
    /// writer cannot bring it back.
    pub fn publish_unless_cancelled(
        &self,
        destination: GridCoord,
        route: Route,
        cancel: &CancelSignal,
    ) -> bool {
        let entry = self.routes.entry(destination);
        if cancel.is_cancelled() {
            return false;
        }
        match entry {
            Entry::Occupied(mut occupied) => {
                occupied.insert(route);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(route);
            }
        }
        true
    }

    /// Remove only while `cancel` is clear, under the same entry lock.
    pub fn remove_unless_cancelled(&self, destination: GridCoord, cancel: &CancelSignal) -> bool {
        let entry = self.routes.entry(destination);
        if cancel.is_cancelled() {
            return false;
        }
        if let Entry::Occupied(occupied) = entry {
            occupied.remove();
        }
        true
    }

    pub fn remove(&self, destination: GridCoord) -> Option<Route> {
        self.routes.remove(&destination).map(|(_, route)| route)
    }

    pub fn get(&self, destination: GridCoord) -> Option<Route> {
        self.routes.get(&destination).map(|r| r.value().clone())
    }

    pub fn contains(&self, destination: GridCoord) -> bool {
        self.routes.contains_key(&destination)
    }

    /// All routes, ordered by destination.
    pub fn snapshot(&self) -> Vec<(GridCoord, Route)> {
        let mut routes: Vec<(GridCoord, Route)> = self
            .routes
            .iter()
            .map(|r| (*r.key(), r.value().clone()))
            .collect();
        routes.sort_by_key(|(destination, _)| *destination);
        routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
