//! Agent position and pause state as seen by route workers.

use radar_core::GridCoord;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// Host-side view of the moving agent.
pub trait AgentSource: Send + Sync {
    /// Current grid position, `None` while the host cannot report one.
    fn position(&self) -> Option<GridCoord>;

    /// True while workers must hold off publishing (e.g. a loading screen).
    fn is_paused(&self) -> bool;
}

/// Agent state pushed in by whoever reads the host.
#[derive(Debug, Default)]
pub struct SharedAgent {
    position: RwLock<Option<GridCoord>>,
    paused: AtomicBool,
}

impl SharedAgent {
    pub fn new(position: GridCoord) -> Self {
        Self {
            position: RwLock::new(Some(position)),
            paused: AtomicBool::new(false),
        }
    }

    pub fn set_position(&self, position: GridCoord) {
        let mut slot = self.position.write().unwrap_or_else(|p| p.into_inner());
        *slot = Some(position);
    }

    pub fn clear_position(&self) {
        let mut slot = self.position.write().unwrap_or_else(|p| p.into_inner());
        *slot = None;
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::SeqCst);
    }
}

impl AgentSource for SharedAgent {
    fn position(&self) -> Option<GridCoord> {
        *self.position.read().unwrap_or_else(|p| p.into_inner())
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}
