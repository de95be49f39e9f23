//! Accelerator Device Trait.
//!
//! The accelerator is opaque: it accepts descriptors and exposes two
//! counters once the streams have drained. Everything the harness needs
//! from it is captured here so the same run can target the real hardware,
//! the software model, or a recorder.

use crate::common::constants::funct;
use crate::common::Result;
use crate::encoding::{Descriptor, Program};

/// Performance counters exposed after the timed region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Counter {
    /// Cycles between the first issued request and the last completion.
    CyclesElapsed,
    /// Requests completed across all streams.
    RequestsCompleted,
}

impl Counter {
    /// RoCC `funct7` code that reads this counter.
    pub fn funct(self) -> u8 {
        match self {
            Counter::CyclesElapsed => funct::READ_CYCLES,
            Counter::RequestsCompleted => funct::READ_REQUESTS,
        }
    }
}

/// A memory-traffic accelerator.
pub trait Device {
    /// Returns a short name for logs and reports.
    fn name(&self) -> &str;

    /// Tells the device which region is resident.
    ///
    /// Called once, after prefaulting and before any descriptor. Hardware
    /// has nothing to do here.
    fn bind_buffer(&mut self, _base: u64, _len: u64) {}

    /// Orders all earlier memory operations before later ones.
    fn fence(&mut self) {}

    /// Issues one descriptor.
    fn submit(&mut self, descriptor: &Descriptor) -> Result<()>;

    /// Reads a counter. Blocks until the streams have drained.
    fn read_counter(&mut self, counter: Counter) -> u64;

    /// Issues every descriptor of `program` in order.
    fn submit_program(&mut self, program: &Program) -> Result<()> {
        for descriptor in program.descriptors() {
            self.submit(descriptor)?;
        }
        Ok(())
    }
}
