//! Run Harness.
//!
//! Orchestrates one measurement: generate streams, plan the layout, encode
//! the descriptors, and only then allocate and prefault the buffer, lock it
//! resident, and hand it to the device. Everything that can be rejected is
//! rejected before the device sees a single descriptor.

use log::{debug, info};

use crate::common::Result;
use crate::config::Config;
use crate::encoding::Program;
use crate::layout::Layout;
use crate::sim::buffer::{lock_resident, StreamBuffer};
use crate::soc::traits::{Counter, Device};
use crate::stats::{bandwidth_mbps, elapsed_ns, Measurement, RunReport, StreamRow};
use crate::stream::StreamSpec;

/// A fully validated run: streams, their layout, and the encoded program
/// with buffer-relative operands.
#[derive(Clone, Debug)]
pub struct Plan {
    pub streams: Vec<StreamSpec>,
    pub layout: Layout,
    pub program: Program,
}

impl Plan {
    /// Per-stream rows for reporting.
    pub fn rows(&self) -> Vec<StreamRow> {
        self.streams
            .iter()
            .enumerate()
            .map(|(index, s)| StreamRow {
                index,
                kind: s.kind,
                stride_bytes: s.stride_bytes,
                request_count: s.request_count,
                offset: self.layout.offsets()[index],
                span: self.layout.spans()[index],
            })
            .collect()
    }
}

/// Drives runs described by a `Config`.
pub struct Harness {
    config: Config,
}

impl Harness {
    /// Creates a harness for a validated configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Builds, plans, and encodes without touching memory or a device.
    pub fn prepare(&self) -> Result<Plan> {
        let streams = self
            .config
            .stream_builder()
            .build(self.config.streams.stream_count(), &self.config.streams.policy())?;
        let layout = self.config.planner()?.plan(&streams)?;
        let program = self.config.encoder()?.encode_program(&streams, &layout)?;

        Ok(Plan {
            streams,
            layout,
            program,
        })
    }

    /// Executes one measured run on `device`.
    ///
    /// # Errors
    ///
    /// Planning and encoding errors are returned before allocation.
    /// `ZeroCycles` is returned if the device reports no elapsed cycles.
    pub fn run<D: Device + ?Sized>(&self, device: &mut D) -> Result<RunReport> {
        let plan = self.prepare()?;
        let layout = &plan.layout;
        let run = &self.config.run;
        let dev = &self.config.device;

        let mut buffer = StreamBuffer::allocate(layout.total_bytes(), dev.page_bytes)?;
        buffer.prefault(layout, run.prefault_fill);
        if run.lock_pages {
            lock_resident()?;
        }

        let base = buffer.base_address();
        let program = plan.program.rebased(base);
        device.bind_buffer(base, buffer.len());

        info!(
            "starting {} streams on {} (buffer {:#x}, {} bytes)",
            plan.streams.len(),
            device.name(),
            base,
            buffer.len()
        );

        device.fence();
        device.submit_program(&program)?;
        let cycles = device.read_counter(Counter::CyclesElapsed);
        let requests = device.read_counter(Counter::RequestsCompleted);
        device.fence();

        let measurement = Measurement::new(cycles, requests);
        let bandwidth = bandwidth_mbps(&measurement, dev.bytes_per_request, dev.clock_hz)?;

        for (index, stream) in plan.streams.iter().enumerate() {
            debug!(
                "stream {index} samples: {:?}",
                buffer.stream_samples(layout, index, stream.stride_bytes)
            );
        }

        Ok(RunReport {
            streams: plan.rows(),
            total_bytes: layout.total_bytes(),
            pages: layout.page_count(),
            measurement,
            bytes_sent: requests.saturating_mul(dev.bytes_per_request),
            elapsed_ns: elapsed_ns(cycles, dev.clock_hz)?,
            bandwidth_mbps: bandwidth,
        })
    }
}
