//! Recording device used to inspect what a run submits.

use crate::common::Result;
use crate::encoding::Descriptor;
use crate::soc::traits::{Counter, Device};
use crate::stats::Measurement;

/// Records every call and answers counter reads from a script.
#[derive(Debug, Default)]
pub struct RecordingDevice {
    /// Descriptors in submission order.
    pub submitted: Vec<Descriptor>,
    /// Region passed to `bind_buffer`, if any.
    pub bound: Option<(u64, u64)>,
    /// Number of fences issued.
    pub fences: usize,
    counters: Measurement,
}

impl RecordingDevice {
    /// Creates a recorder that reports `counters` when read.
    pub fn with_counters(counters: Measurement) -> Self {
        Self {
            counters,
            ..Self::default()
        }
    }
}

impl Device for RecordingDevice {
    fn name(&self) -> &str {
        "recording"
    }

    fn bind_buffer(&mut self, base: u64, len: u64) {
        self.bound = Some((base, len));
    }

    fn fence(&mut self) {
        self.fences += 1;
    }

    fn submit(&mut self, descriptor: &Descriptor) -> Result<()> {
        self.submitted.push(*descriptor);
        Ok(())
    }

    fn read_counter(&mut self, counter: Counter) -> u64 {
        match counter {
            Counter::CyclesElapsed => self.counters.cycles,
            Counter::RequestsCompleted => self.counters.requests_completed,
        }
    }
}
