//! Run measurement and throughput reporting.
//!
//! Converts the device's raw counters into a bandwidth figure and renders
//! the result of a run. All arithmetic is integer-only: the target core has
//! no floating-point unit, and the numbers reported here must match what
//! the bare-metal build prints for the same counters.

use serde::Serialize;

use crate::common::{AccessKind, MempressError, Result};

const NANOS_PER_SEC: u128 = 1_000_000_000;

/// Raw counters read back from the device after the timed region.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Measurement {
    /// Cycles the device spent executing the streams.
    pub cycles: u64,
    /// Requests the device completed across all streams.
    pub requests_completed: u64,
}

impl Measurement {
    /// Creates a measurement from raw counters.
    pub fn new(cycles: u64, requests_completed: u64) -> Self {
        Self {
            cycles,
            requests_completed,
        }
    }

    /// Rejects measurements from a device that did not execute.
    pub fn validate(&self) -> Result<()> {
        if self.cycles == 0 {
            return Err(MempressError::ZeroCycles);
        }
        Ok(())
    }
}

/// Elapsed nanoseconds for `cycles` at `clock_hz`, truncated.
pub fn elapsed_ns(cycles: u64, clock_hz: u64) -> Result<u64> {
    if clock_hz == 0 {
        return Err(MempressError::InvalidClock);
    }
    let ns = cycles as u128 * NANOS_PER_SEC / clock_hz as u128;
    Ok(u64::try_from(ns).unwrap_or(u64::MAX))
}

/// Achieved bandwidth in MB/s (10^6 bytes per second).
///
/// ```text
/// bytes_sent = requests_completed * bytes_per_request
/// elapsed_ns = cycles * 1_000_000_000 / clock_hz
/// bandwidth  = bytes_sent * 1000 / elapsed_ns
/// ```
///
/// Both divisions truncate toward zero. Intermediates are 128-bit so only
/// the final value can saturate at `u64::MAX`.
///
/// # Errors
///
/// * `ZeroCycles` if `cycles == 0`; checked before anything else.
/// * `InvalidClock` if `clock_hz == 0`.
/// * `ElapsedUnderflow` if the elapsed time truncates to zero nanoseconds.
pub fn bandwidth_mbps(measurement: &Measurement, bytes_per_request: u64, clock_hz: u64) -> Result<u64> {
    measurement.validate()?;
    let ns = elapsed_ns(measurement.cycles, clock_hz)?;
    if ns == 0 {
        return Err(MempressError::ElapsedUnderflow {
            cycles: measurement.cycles,
            clock_hz,
        });
    }

    let bytes_sent = measurement.requests_completed as u128 * bytes_per_request as u128;
    Ok(throughput_mbps(bytes_sent, ns).unwrap_or(u64::MAX))
}

/// `bytes * 1000 / elapsed_ns`, truncated and saturated; `None` when no
/// time elapsed.
pub fn throughput_mbps(bytes: u128, elapsed_ns: u64) -> Option<u64> {
    if elapsed_ns == 0 {
        return None;
    }
    let bw = bytes * 1000 / elapsed_ns as u128;
    Some(u64::try_from(bw).unwrap_or(u64::MAX))
}

/// Placement and parameters of one stream, as reported.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StreamRow {
    pub index: usize,
    pub kind: AccessKind,
    pub stride_bytes: u64,
    pub request_count: u64,
    pub offset: u64,
    pub span: u64,
}

/// Everything a completed run produced.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub streams: Vec<StreamRow>,
    pub total_bytes: u64,
    pub pages: u64,
    pub measurement: Measurement,
    pub bytes_sent: u64,
    pub elapsed_ns: u64,
    pub bandwidth_mbps: u64,
}

impl RunReport {
    /// Renders the report as pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Prints a formatted summary of the run.
    pub fn print(&self) {
        println!("\n==========================================================");
        println!("MEMPRESS RUN STATISTICS");
        println!("==========================================================");
        println!("streams                  {}", self.streams.len());
        println!("buffer_bytes             {}", self.total_bytes);
        println!("buffer_pages             {}", self.pages);
        println!("----------------------------------------------------------");
        println!("STREAMS");
        for row in &self.streams {
            println!(
                "  [{:>2}] {:<10} stride: {:<6} reqs: {:<8} | offset: {:#010x} span: {}",
                row.index, row.kind, row.stride_bytes, row.request_count, row.offset, row.span
            );
        }
        println!("----------------------------------------------------------");
        println!("DEVICE COUNTERS");
        println!("  cycle_cnt              {}", self.measurement.cycles);
        println!("  req_sent               {}", self.measurement.requests_completed);
        println!("  bytes_sent             {}", self.bytes_sent);
        println!("  elapsed_ns             {}", self.elapsed_ns);
        println!("----------------------------------------------------------");
        println!("Achieved BW of the system: {} MB/s", self.bandwidth_mbps);
        println!("==========================================================");
    }
}
