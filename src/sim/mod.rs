//! Run harness: buffer ownership, prefaulting, and run orchestration.

/// Page-aligned stream buffer.
pub mod buffer;

/// End-to-end run against a device.
pub mod harness;

/// Host CPU stride baseline.
pub mod stride_walk;

pub use buffer::StreamBuffer;
pub use harness::{Harness, Plan};
