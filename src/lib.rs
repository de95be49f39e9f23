//! Synthetic memory-traffic generator for a RoCC memory-pressure accelerator.
//!
//! This crate describes a set of concurrent memory streams, lays them out in
//! a single prefaulted buffer, encodes them into the accelerator's
//! descriptor format, and turns the device's counters into a bandwidth
//! figure.
//!
//! # Data flow
//!
//! * **Streams**: `StreamSetBuilder` expands a generation policy into `StreamSpec`s.
//! * **Layout**: `LayoutPlanner` packs the streams into one page-rounded buffer.
//! * **Encoding**: `DescriptorEncoder` packs a header and one word per stream.
//! * **Device**: a `Device` accepts the descriptors and exposes counters.
//! * **Stats**: `bandwidth_mbps` derives throughput with integer math only.
//!
//! # Modules
//!
//! * `common`: Access kinds, device constants, and the error type.
//! * `config`: TOML configuration.
//! * `encoding`: Descriptor bit packing.
//! * `layout`: Buffer layout planning.
//! * `sim`: Buffer ownership and run orchestration.
//! * `soc`: Device trait and implementations.
//! * `stats`: Measurements, bandwidth, and reports.
//! * `stream`: Stream descriptions and generation policies.
//! * `trace`: Simulation log tag ledger and AXI4 checker.

/// Shared types, constants, and error handling.
///
/// Provides the access-kind enumeration whose codes appear on the wire and
/// the error taxonomy used by every other module.
pub mod common;

/// Configuration system for the device, encoding, streams, and run options.
///
/// Loads TOML files; every field has a default.
pub mod config;

/// Descriptor bit packing for the accelerator's command interface.
pub mod encoding;

/// Non-overlapping, page-rounded placement of streams in one buffer.
pub mod layout;

/// Run harness, stream buffer, and the host stride baseline.
pub mod sim;

/// Accelerator device interface with hardware, simulated, and recording
/// implementations.
pub mod soc;

/// Measurements, integer bandwidth math, and run reports.
pub mod stats;

/// Stream specifications and stream-set generation.
pub mod stream;

/// Replay of accelerator simulation logs: leaked tags and addresses, and
/// AXI4 transaction IDs reused while in flight.
pub mod trace;
