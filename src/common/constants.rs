//! Device and host constants.
//!
//! These values describe the accelerator build this harness was written
//! against. Every one of them can be overridden through the TOML
//! configuration; the constants only seed the defaults.

/// Size of a device cache line in bytes. Strides must be a multiple of it.
pub const CACHE_LINE_BYTES: u64 = 64;

/// Host page size in bytes used for prefaulting.
pub const PAGE_BYTES: u64 = 4096;

/// Number of stream slots implemented by the device.
pub const MAX_STREAMS: usize = 16;

/// Assumed core clock (2.0 GHz).
pub const CLOCK_HZ: u64 = 2_000_000_000;

/// Payload moved by one completed request (one 128-bit beat).
pub const BYTES_PER_REQUEST: u64 = 16;

/// Size of the L2 the default request count is sized against (2 MiB).
pub const L2_BYTES: u64 = 2048 * 1024;

/// Default requests per stream: stream 0 sweeps the whole L2 at line stride.
pub const DEFAULT_REQUEST_COUNT: u64 = L2_BYTES / CACHE_LINE_BYTES;

/// Byte written into every page during prefault (`0011_0011`).
pub const PREFAULT_FILL: u8 = b'3';

/// Width of a RoCC source register on RV64.
pub const XLEN_BITS: u32 = 64;

/// RoCC custom opcode slot the accelerator is attached to (`custom-2`).
pub const ROCC_OPCODE: u8 = 2;

/// RoCC `funct7` command codes understood by the accelerator.
pub mod funct {
    /// Global header: stream count and request budget.
    pub const HEADER: u8 = 1;
    /// Per-stream record: packed stride/kind plus base address.
    pub const STREAM: u8 = 2;
    /// Read the elapsed cycle counter.
    pub const READ_CYCLES: u8 = 3;
    /// Read the completed request counter.
    pub const READ_REQUESTS: u8 = 4;
}
