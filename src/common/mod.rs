//! Common utilities and types used throughout the traffic generator.
//!
//! This module provides the access-kind enumeration, the fixed hardware
//! constants of the target device, and the crate-wide error type shared
//! by the planner, the encoder, and the harness.

/// Common constants describing the target device and host.
pub mod constants;

/// Memory access kind definitions.
pub mod data;

/// Error types for every validation and run failure.
pub mod error;

pub use data::AccessKind;
pub use error::{MempressError, Result};

pub use constants::{CACHE_LINE_BYTES, MAX_STREAMS, PAGE_BYTES};
