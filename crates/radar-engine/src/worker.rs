//! Per-destination route worker.
//!
//! A worker first streams the coarse-to-fine scan, publishing every non-empty
//! batch, then keeps the route current by re-planning whenever the agent
//! moves. It exits quietly once its signal (or its session's) is raised.

use crate::agent::AgentSource;
use crate::cancel::CancelSignal;
use crate::scan::{find_path_blocking, ScanStream};
use crate::table::{Route, RouteTable};
use radar_core::{GridCoord, PathFinder};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WorkerState {
    Scanning,
    Tracking,
    Stopped,
}

/// What a worker hands to its consumer.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteUpdate {
    Path(Route),
    NoPath,
}

pub type RouteCallback = Box<dyn Fn(RouteUpdate) + Send + Sync>;

/// Where a worker's results go.
pub(crate) enum RouteSink {
    Table(Arc<RouteTable>),
    Callback(RouteCallback),
}

impl RouteSink {
    /// Hand `update` over unless `cancel` is raised. Returns false when the
    /// update was dropped.
    fn deliver(&self, destination: GridCoord, update: RouteUpdate, cancel: &CancelSignal) -> bool {
        match (self, update) {
            (RouteSink::Table(table), RouteUpdate::Path(route)) => {
                table.publish_unless_cancelled(destination, route, cancel)
            }
            (RouteSink::Table(table), RouteUpdate::NoPath) => {
                table.remove_unless_cancelled(destination, cancel)
            }
            (RouteSink::Callback(callback), update) => {
                if cancel.is_cancelled() {
                    return false;
                }
                callback(update);
                true
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct WorkerTiming {
    pub poll_interval: Duration,
    pub pause_check_interval: Duration,
}

pub(crate) struct RouteWorker {
    pub destination: GridCoord,
    pub finder: Arc<PathFinder>,
    pub agent: Arc<dyn AgentSource>,
    pub sink: RouteSink,
    pub cancel: CancelSignal,
    pub timing: WorkerTiming,
    pub state: watch::Sender<WorkerState>,
}

impl RouteWorker {
    pub async fn run(self) {
        self.set_state(WorkerState::Scanning);
        if let Some(origin) = self.wait_for_position().await {
            if self.first_scan(origin).await {
                self.set_state(WorkerState::Tracking);
                self.track(origin).await;
            }
        }
        self.set_state(WorkerState::Stopped);
        tracing::debug!("Route worker for {} stopped", self.destination);
    }

    fn set_state(&self, state: WorkerState) {
        self.state.send_replace(state);
    }

    /// Deliver unless cancelled. The sink checks the signal at the write so a
    /// superseded worker never lands a late result.
    fn publish(&self, update: RouteUpdate) -> bool {
        let summary = match &update {
            RouteUpdate::Path(route) => Some((route.len(), route.level)),
            RouteUpdate::NoPath => None,
        };
        if !self.sink.deliver(self.destination, update, &self.cancel) {
            return false;
        }
        if let Some((tiles, level)) = summary {
            tracing::debug!(
                "Route to {} updated: {} tiles (level {:?})",
                self.destination,
                tiles,
                level
            );
        }
        true
    }

    /// Sleep for `interval` unless cancelled first. Returns false on cancel.
    async fn sleep_or_cancel(&self, interval: Duration) -> bool {
        tokio::select! {
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(interval) => true,
        }
    }

    async fn wait_out_pause(&self) -> bool {
        while self.agent.is_paused() {
            if !self.sleep_or_cancel(self.timing.pause_check_interval).await {
                return false;
            }
        }
        !self.cancel.is_cancelled()
    }

    async fn wait_for_position(&self) -> Option<GridCoord> {
        loop {
            if self.cancel.is_cancelled() {
                return None;
            }
            if let Some(position) = self.agent.position() {
                return Some(position);
            }
            if !self.sleep_or_cancel(self.timing.poll_interval).await {
                return None;
            }
        }
    }

    /// Returns false when cancelled along the way.
    async fn first_scan(&self, origin: GridCoord) -> bool {
        let mut stream = ScanStream::spawn(
            self.finder.clone(),
            origin,
            self.destination,
            self.cancel.clone(),
        );
        let mut found = false;
        loop {
            let batch = tokio::select! {
                _ = self.cancel.cancelled() => None,
                batch = stream.next() => batch,
            };
            let Some(batch) = batch else {
                break;
            };
            if batch.path.is_empty() {
                continue;
            }
            if !self.wait_out_pause().await {
                break;
            }
            found |= self.publish(RouteUpdate::Path(Route::new(batch.path, Some(batch.level))));
        }

        if let Err(err) = stream.finish().await {
            tracing::error!("First scan towards {} failed: {}", self.destination, err);
            return false;
        }
        if self.cancel.is_cancelled() {
            return false;
        }
        if !found {
            tracing::debug!("No route from {} to {}", origin, self.destination);
            self.publish(RouteUpdate::NoPath);
        }
        true
    }

    async fn track(&self, mut last: GridCoord) {
        loop {
            if !self.sleep_or_cancel(self.timing.poll_interval).await {
                return;
            }
            if !self.wait_out_pause().await {
                return;
            }
            let Some(position) = self.agent.position() else {
                continue;
            };
            if position == last {
                continue;
            }
            last = position;

            let path = match find_path_blocking(self.finder.clone(), position, self.destination).await {
                Ok(path) => path,
                Err(err) => {
                    tracing::error!("Re-plan towards {} failed: {}", self.destination, err);
                    return;
                }
            };
            let update = if path.is_empty() {
                RouteUpdate::NoPath
            } else {
                RouteUpdate::Path(Route::new(path, None))
            };
            if !self.publish(update) {
                return;
            }
        }
    }
}
