//! Radar CLI - command line tools for the routing engine.
//!
//! Binaries:
//! - find_path: one-shot first scan and exact path on an area file
//! - cluster_targets: cluster every target of an area file
//! - simulate_walk: drive the live engine with a walking agent

pub mod area_file;
pub mod walk;

pub use area_file::{load_area, parse_coord};
pub use walk::{StepWalker, Walker};
