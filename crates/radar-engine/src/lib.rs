//! Route tracking runtime: sessions, per-destination workers, the live route
//! table and the area lifecycle that feeds them.

pub mod agent;
pub mod api;
pub mod area;
pub mod cancel;
pub mod config;
pub mod error;
pub mod logging;
pub mod manager;
pub mod scan;
pub mod table;
pub mod worker;

pub use agent::{AgentSource, SharedAgent};
pub use api::RadarApi;
pub use area::{AreaSnapshot, AreaTracker};
pub use cancel::CancelSignal;
pub use config::EngineConfig;
pub use error::{AreaError, RouteError};
pub use logging::init_tracing;
pub use manager::{RouteManager, Session};
pub use scan::ScanStream;
pub use table::{Route, RouteTable};
pub use worker::{RouteCallback, RouteUpdate, WorkerState};
