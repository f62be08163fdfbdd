//! Route manager: sessions, per-destination workers and the live table.
//!
//! Every `start` creates a fresh [`Session`] with its own signal, table and
//! worker registry, and swaps it in as current. Stopping raises the session
//! signal and drops it; late writes from its workers can only reach the
//! session's own table, which nobody reads any more.
//!
//! Workers are spawned through the runtime handle given at construction, so
//! the manager can be driven from host threads outside the runtime.

use crate::agent::AgentSource;
use crate::cancel::CancelSignal;
use crate::config::EngineConfig;
use crate::error::RouteError;
use crate::table::{Route, RouteTable};
use crate::worker::{RouteCallback, RouteSink, RouteWorker, WorkerState, WorkerTiming};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use radar_core::{GridCoord, PathFinder};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

struct WorkerEntry {
    cancel: CancelSignal,
    state: watch::Receiver<WorkerState>,
    _handle: JoinHandle<()>,
}

/// One pathfinding activation.
pub struct Session {
    pub id: u64,
    pub started_at: DateTime<Utc>,
    cancel: CancelSignal,
    table: Arc<RouteTable>,
    finder: Arc<PathFinder>,
    workers: DashMap<GridCoord, WorkerEntry>,
}

impl Session {
    pub fn table(&self) -> &Arc<RouteTable> {
        &self.table
    }

    pub fn finder(&self) -> &Arc<PathFinder> {
        &self.finder
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Destinations with a table-backed worker, ordered.
    pub fn destinations(&self) -> Vec<GridCoord> {
        let mut destinations: Vec<GridCoord> = self.workers.iter().map(|w| *w.key()).collect();
        destinations.sort();
        destinations
    }
}

pub struct RouteManager {
    agent: Arc<dyn AgentSource>,
    runtime: Handle,
    timing: WorkerTiming,
    current: RwLock<Option<Arc<Session>>>,
    next_session: AtomicU64,
    /// Handed out by `table()` while no session is live.
    detached: Arc<RouteTable>,
}

impl RouteManager {
    pub fn new(agent: Arc<dyn AgentSource>, config: &EngineConfig, runtime: Handle) -> Self {
        Self {
            agent,
            runtime,
            timing: WorkerTiming {
                poll_interval: config.poll_interval,
                pause_check_interval: config.pause_check_interval,
            },
            current: RwLock::new(None),
            next_session: AtomicU64::new(1),
            detached: Arc::new(RouteTable::new()),
        }
    }

    pub fn agent(&self) -> &Arc<dyn AgentSource> {
        &self.agent
    }

    pub fn session(&self) -> Option<Arc<Session>> {
        self.current
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .clone()
    }

    pub fn is_running(&self) -> bool {
        self.session().is_some()
    }

    /// Start a new session routing to `destinations`. A live session is
    /// stopped first. Returns the new session id.
    pub fn start<I>(&self, finder: Arc<PathFinder>, destinations: I) -> u64
    where
        I: IntoIterator<Item = GridCoord>,
    {
        let session = Arc::new(Session {
            id: self.next_session.fetch_add(1, Ordering::SeqCst),
            started_at: Utc::now(),
            cancel: CancelSignal::new(),
            table: Arc::new(RouteTable::new()),
            finder,
            workers: DashMap::new(),
        });

        let previous = {
            let mut current = self.current.write().unwrap_or_else(|p| p.into_inner());
            current.replace(session.clone())
        };
        if let Some(previous) = previous {
            previous.cancel.cancel();
            tracing::info!("Pathfinding session {} superseded", previous.id);
        }

        let mut count = 0;
        for destination in destinations {
            self.spawn_table_worker(&session, destination);
            count += 1;
        }
        tracing::info!("Pathfinding session {} started with {} destinations", session.id, count);
        session.id
    }

    /// Raise the session signal and drop the session with its table.
    pub fn stop(&self) {
        let previous = self.current.write().unwrap_or_else(|p| p.into_inner()).take();
        if let Some(session) = previous {
            session.cancel.cancel();
            tracing::info!("Pathfinding session {} stopped", session.id);
        }
    }

    /// Stop, then start again on `finder` with the same destinations.
    pub fn restart(&self, finder: Arc<PathFinder>) -> Result<u64, RouteError> {
        let session = self.session().ok_or(RouteError::NotStarted)?;
        let destinations = session.destinations();
        self.stop();
        Ok(self.start(finder, destinations))
    }

    /// Route to `destination` in the live table. An existing worker for the
    /// same destination is cancelled and replaced.
    pub fn add_route(&self, destination: GridCoord) -> Result<(), RouteError> {
        let session = self.session().ok_or(RouteError::NotStarted)?;
        self.spawn_table_worker(&session, destination);
        Ok(())
    }

    /// Stop routing to `destination` and drop its table entry. The worker is
    /// cancelled before the entry goes; a write racing with the removal is
    /// fenced by the table (see [`RouteTable::publish_unless_cancelled`]).
    pub fn remove_route(&self, destination: GridCoord) -> Result<bool, RouteError> {
        let session = self.session().ok_or(RouteError::NotStarted)?;
        let removed = session.workers.remove(&destination);
        if let Some((_, entry)) = &removed {
            entry.cancel.cancel();
        }
        session.table.remove(destination);
        Ok(removed.is_some())
    }

    /// Route to `destination` outside the table, reporting every result to
    /// `on_update`. The worker stops when `cancel` or the session is raised.
    pub fn request_route(
        &self,
        destination: GridCoord,
        on_update: RouteCallback,
        cancel: CancelSignal,
    ) -> Result<JoinHandle<()>, RouteError> {
        let session = self.session().ok_or(RouteError::NotStarted)?;
        let (state, _) = watch::channel(WorkerState::Scanning);
        let worker = RouteWorker {
            destination,
            finder: session.finder.clone(),
            agent: self.agent.clone(),
            sink: RouteSink::Callback(on_update),
            cancel: session.cancel.child_with(&cancel),
            timing: self.timing,
            state,
        };
        tracing::debug!("Route requested towards {}", destination);
        Ok(self.runtime.spawn(worker.run()))
    }

    /// The live table, or an empty detached one when nothing runs.
    pub fn table(&self) -> Arc<RouteTable> {
        match self.session() {
            Some(session) => session.table.clone(),
            None => self.detached.clone(),
        }
    }

    pub fn snapshot(&self) -> Vec<(GridCoord, Route)> {
        self.table().snapshot()
    }

    pub fn worker_state(&self, destination: GridCoord) -> Option<WorkerState> {
        let session = self.session()?;
        let entry = session.workers.get(&destination)?;
        let state = *entry.state.borrow();
        Some(state)
    }

    pub fn destinations(&self) -> Vec<GridCoord> {
        self.session().map(|s| s.destinations()).unwrap_or_default()
    }

    fn spawn_table_worker(&self, session: &Arc<Session>, destination: GridCoord) {
        let cancel = session.cancel.child();
        let (state_tx, state_rx) = watch::channel(WorkerState::Scanning);
        let worker = RouteWorker {
            destination,
            finder: session.finder.clone(),
            agent: self.agent.clone(),
            sink: RouteSink::Table(session.table.clone()),
            cancel: cancel.clone(),
            timing: self.timing,
            state: state_tx,
        };
        let handle = self.runtime.spawn(worker.run());

        let entry = WorkerEntry {
            cancel,
            state: state_rx,
            _handle: handle,
        };
        if let Some(replaced) = session.workers.insert(destination, entry) {
            replaced.cancel.cancel();
            tracing::debug!("Replaced route worker for {}", destination);
        }
    }
}
