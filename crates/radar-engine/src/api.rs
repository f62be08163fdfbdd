//! Narrow surface exported to the host.

use crate::area::AreaTracker;
use crate::cancel::CancelSignal;
use crate::error::RouteError;
use crate::table::Route;
use crate::worker::RouteCallback;
use radar_core::{ClusterError, GridCoord, TargetLocations};
use tokio::task::JoinHandle;

pub trait RadarApi {
    /// Track a route to `destination`, reporting every update to `on_update`
    /// until `cancel` (or the running session) is raised.
    fn request_route(
        &self,
        destination: GridCoord,
        on_update: RouteCallback,
        cancel: CancelSignal,
    ) -> Result<JoinHandle<()>, RouteError>;

    /// Cluster `name` on the current area. Side-effect free; works whether
    /// or not routing is running. `Ok(None)` when nothing matches.
    fn cluster_target(
        &self,
        name: &str,
        expected_count: usize,
    ) -> Result<Option<TargetLocations>, ClusterError>;

    /// Current contents of the live route table.
    fn routes(&self) -> Vec<(GridCoord, Route)>;
}

impl RadarApi for AreaTracker {
    fn request_route(
        &self,
        destination: GridCoord,
        on_update: RouteCallback,
        cancel: CancelSignal,
    ) -> Result<JoinHandle<()>, RouteError> {
        self.manager().request_route(destination, on_update, cancel)
    }

    fn cluster_target(
        &self,
        name: &str,
        expected_count: usize,
    ) -> Result<Option<TargetLocations>, ClusterError> {
        self.cluster_current(name, expected_count)
    }

    fn routes(&self) -> Vec<(GridCoord, Route)> {
        self.manager().snapshot()
    }
}
