//! Accelerator device interface and its implementations.
//!
//! The harness only ever talks to a `Device`: it submits descriptors,
//! fences, and reads counters back. The concrete device is either the real
//! RoCC accelerator (on RV64 targets), a software model for host runs, or a
//! recorder for tests.

/// Memory timing models used by the simulated device.
pub mod memory;

/// Recording test double.
pub mod recording;

/// RoCC instruction interface to the real accelerator.
#[cfg(target_arch = "riscv64")]
pub mod rocc;

/// Software model of the accelerator.
pub mod sim_device;

/// The device trait and counter identifiers.
pub mod traits;

pub use recording::RecordingDevice;
pub use sim_device::SimDevice;
pub use traits::{Counter, Device};
