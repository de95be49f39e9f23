//! Stream descriptions and stream-set generation.

/// Parameterized generator for whole stream sets.
pub mod builder;

/// Single-stream value type.
pub mod spec;

pub use builder::{GenerationPolicy, StreamSetBuilder};
pub use spec::StreamSpec;
