//! Memory timing models.

/// Per-request latency controllers.
pub mod controller;

pub use controller::{build_controller, DramController, MemoryController, SimpleController};
