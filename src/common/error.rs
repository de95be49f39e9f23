//! Error types for stream planning, descriptor encoding, and runs.
//!
//! Every variant aborts a run. Layout and encoding failures are raised
//! before any buffer is allocated or descriptor submitted, so the device
//! never sees a partial configuration.

use std::io;

/// Errors raised while building, encoding, or executing a traffic run.
#[derive(Debug, thiserror::Error)]
pub enum MempressError {
    /// A stream stride is zero or not a whole number of cache lines.
    #[error(
        "stream {index}: stride of {stride_bytes} bytes is not a positive multiple of the {cache_line_bytes}-byte cache line"
    )]
    InvalidStride {
        /// Index of the offending stream.
        index: usize,
        /// Requested stride.
        stride_bytes: u64,
        /// Cache line size it was checked against.
        cache_line_bytes: u64,
    },

    /// A stride does not fit in the descriptor word after shifting.
    #[error("stride of {stride_bytes} bytes overflows the descriptor (max {max_stride})")]
    StrideOverflow {
        /// Requested stride.
        stride_bytes: u64,
        /// Largest stride the configured format can carry.
        max_stride: u64,
    },

    /// An access kind code is outside the enumerated range or its field.
    #[error("access kind code {code} is not encodable")]
    InvalidKind {
        /// The offending wire code.
        code: u64,
    },

    /// More streams were requested than the device implements.
    #[error("{requested} streams requested but the device supports at most {max_streams}")]
    CapacityExceeded {
        /// Requested stream count.
        requested: usize,
        /// Device capacity.
        max_streams: usize,
    },

    /// A custom stream list holds fewer entries than requested.
    #[error("{requested} streams requested but the custom list defines {available}")]
    StreamCountMismatch {
        /// Requested stream count.
        requested: usize,
        /// Entries in the custom list.
        available: usize,
    },

    /// The device reported zero elapsed cycles and therefore did not run.
    #[error("device reported zero elapsed cycles")]
    ZeroCycles,

    /// `request_count * stride_bytes` of a stream overflows the address space.
    #[error("stream {index}: address span overflows u64")]
    SpanOverflow {
        /// Index of the offending stream.
        index: usize,
    },

    /// Cache line and page sizes cannot tile a buffer.
    #[error(
        "a {page_bytes}-byte page is not a power of two holding whole {cache_line_bytes}-byte lines"
    )]
    InvalidGeometry {
        /// Cache line size.
        cache_line_bytes: u64,
        /// Page size.
        page_bytes: u64,
    },

    /// A header field value does not fit its configured width.
    #[error("header {field} of {value} does not fit in {bits} bits")]
    HeaderOverflow {
        /// Field name (`stream count` or `request budget`).
        field: &'static str,
        /// Value that was too wide.
        value: u64,
        /// Configured field width.
        bits: u32,
    },

    /// The configured descriptor bit layout is inconsistent.
    #[error("invalid descriptor encoding: {0}")]
    InvalidEncoding(String),

    /// Bandwidth was requested with a zero clock frequency.
    #[error("clock frequency must be non-zero")]
    InvalidClock,

    /// Elapsed time truncates to zero nanoseconds.
    #[error("{cycles} cycles at {clock_hz} Hz is shorter than one nanosecond")]
    ElapsedUnderflow {
        /// Reported cycles.
        cycles: u64,
        /// Assumed clock.
        clock_hz: u64,
    },

    /// A run was started without any streams.
    #[error("stream set is empty")]
    EmptyStreamSet,

    /// The simulated device accessed memory outside the bound buffer.
    #[error("device fault at address {address:#x}")]
    DeviceFault {
        /// Faulting address.
        address: u64,
    },

    /// The device rejected a descriptor sequence or is not available.
    #[error("device error: {0}")]
    Device(String),

    /// The stream buffer could not be allocated.
    #[error("failed to allocate a {bytes}-byte stream buffer")]
    Allocation {
        /// Requested size.
        bytes: u64,
    },

    /// Locking pages into memory failed.
    #[error("failed to lock pages resident: {0}")]
    Residency(#[source] io::Error),

    /// I/O error reading configuration or logs.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuration values are inconsistent.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// TOML deserialization error.
    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    /// JSON report serialization error.
    #[error("report serialization error: {0}")]
    Report(#[from] serde_json::Error),

    /// A simulation log line could not be reconciled.
    #[error("log line {line}: {detail}")]
    Trace {
        /// One-based line number.
        line: usize,
        /// What went wrong.
        detail: String,
    },
}

/// Result type for every fallible operation in the crate.
pub type Result<T> = std::result::Result<T, MempressError>;
