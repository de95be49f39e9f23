//! Host Stride Walk.
//!
//! CPU-only baseline for the memory system: prefault a region, then sweep
//! it one cache line at a time with two loads and a store per line. Useful
//! for comparing against the accelerator on the same target or for
//! producing a recognisable pattern in memory-model waveforms.

use std::time::Instant;

use log::info;
use serde::Serialize;

use crate::common::{MempressError, Result};
use crate::sim::buffer::StreamBuffer;
use crate::stats::throughput_mbps;

/// Result of one host sweep.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StrideWalkReport {
    pub bytes: u64,
    pub stride: u64,
    pub lines: u64,
    pub checksum: u8,
    pub elapsed_ns: u64,
    /// `None` if the sweep finished within the timer resolution.
    pub bandwidth_mbps: Option<u64>,
}

/// Sweeps `bytes` of memory at `stride`, prefaulting at `page_bytes`.
///
/// Line `i` becomes `buf[i - 1] + buf[i + 1]` (wrapping). The sweep starts at
/// `stride` so the left neighbour of the first line is in bounds.
pub fn stride_walk(bytes: u64, stride: u64, page_bytes: u64, fill: u8) -> Result<StrideWalkReport> {
    let step = usize::try_from(stride)
        .ok()
        .filter(|_| stride != 0 && stride < bytes.saturating_sub(1))
        .ok_or_else(|| {
            MempressError::InvalidConfig(format!("stride {stride} does not fit a {bytes}-byte sweep"))
        })?;

    let mut buffer = StreamBuffer::allocate(bytes, page_bytes)?;
    let pages = buffer.prefault_range(page_bytes, fill);
    info!("prefaulted {pages} pages for a {bytes}-byte sweep");

    let region = buffer.region_mut();
    let len = region.len();
    let mut lines = 0;

    let start = Instant::now();
    let mut i = step;
    while i + 1 < len {
        region[i] = region[i - 1].wrapping_add(region[i + 1]);
        lines += 1;
        i += step;
    }
    let elapsed = start.elapsed();

    let checksum = region.iter().step_by(step).fold(0u8, |acc, b| acc.wrapping_add(*b));
    let elapsed_ns = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);

    Ok(StrideWalkReport {
        bytes,
        stride,
        lines,
        checksum,
        elapsed_ns,
        bandwidth_mbps: throughput_mbps(lines as u128 * stride as u128, elapsed_ns),
    })
}
