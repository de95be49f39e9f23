//! Simulated Accelerator.
//!
//! A host-side model of the traffic generator. It decodes the descriptor
//! stream exactly as the hardware would, walks every stream's addresses
//! round-robin, and charges each request to a `MemoryController`. Any
//! access that leaves the bound buffer is reported as a fault, which is how
//! layout or prefault mistakes surface when no hardware is attached.

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::{AccessKind, MempressError, Result};
use crate::encoding::{Command, Descriptor, DescriptorEncoder};
use crate::soc::memory::MemoryController;
use crate::soc::traits::{Counter, Device};

#[derive(Clone, Copy, Debug)]
struct ActiveStream {
    kind: AccessKind,
    stride: u64,
    base: u64,
}

/// Software model of the accelerator.
pub struct SimDevice {
    encoder: DescriptorEncoder,
    controller: Box<dyn MemoryController>,
    line_bytes: u64,
    rng: StdRng,
    region: Option<(u64, u64)>,
    expected: usize,
    budget: u64,
    pending: Vec<ActiveStream>,
    cycles: u64,
    requests: u64,
}

impl SimDevice {
    /// Creates a device decoding with `encoder`'s format.
    ///
    /// `seed` drives the address choice of random streams.
    pub fn new(
        encoder: DescriptorEncoder,
        controller: Box<dyn MemoryController>,
        line_bytes: u64,
        seed: u64,
    ) -> Self {
        Self {
            encoder,
            controller,
            line_bytes,
            rng: StdRng::seed_from_u64(seed),
            region: None,
            expected: 0,
            budget: 0,
            pending: Vec::new(),
            cycles: 0,
            requests: 0,
        }
    }

    fn check(&self, addr: u64) -> Result<()> {
        let inside = match self.region {
            Some((base, len)) => {
                addr >= base && addr.checked_add(self.line_bytes).is_some_and(|end| end <= base + len)
            }
            None => false,
        };
        if inside {
            Ok(())
        } else {
            Err(MempressError::DeviceFault { address: addr })
        }
    }

    fn address(&mut self, stream: &ActiveStream, request: u64) -> u64 {
        if stream.kind.is_random() {
            let lines = (self.budget * stream.stride / self.line_bytes).max(1);
            stream.base + self.rng.gen_range(0..lines) * self.line_bytes
        } else {
            stream.base + request * stream.stride
        }
    }

    fn execute(&mut self) -> Result<()> {
        let streams = std::mem::take(&mut self.pending);
        let mut latency: u64 = 0;
        let mut requests: u64 = 0;

        for request in 0..self.budget {
            for stream in &streams {
                let addr = self.address(stream, request);
                self.check(addr)?;
                trace!("{} {:#x}", stream.kind, addr);
                latency += self.controller.access_latency(addr);
                requests += 1;
            }
        }

        self.cycles = if requests == 0 {
            0
        } else {
            (latency / streams.len() as u64).max(1)
        };
        self.requests = requests;
        debug!(
            "simulated {} streams: {} requests in {} cycles",
            streams.len(),
            self.requests,
            self.cycles
        );
        Ok(())
    }
}

impl Device for SimDevice {
    fn name(&self) -> &str {
        "sim"
    }

    fn bind_buffer(&mut self, base: u64, len: u64) {
        self.region = Some((base, len));
    }

    fn submit(&mut self, descriptor: &Descriptor) -> Result<()> {
        match descriptor.command {
            Command::Header => {
                let (count, budget) = self.encoder.decode_header(descriptor.word);
                self.expected = count;
                self.budget = budget;
                self.pending.clear();
                self.cycles = 0;
                self.requests = 0;
                Ok(())
            }
            Command::Stream => {
                if self.pending.len() >= self.expected {
                    return Err(MempressError::Device(
                        "stream descriptor without a matching header slot".to_string(),
                    ));
                }
                let (stride, kind) = self.encoder.decode_stream(descriptor.word)?;
                self.pending.push(ActiveStream {
                    kind,
                    stride,
                    base: descriptor.operand,
                });
                if self.pending.len() == self.expected {
                    self.execute()?;
                }
                Ok(())
            }
        }
    }

    fn read_counter(&mut self, counter: Counter) -> u64 {
        match counter {
            Counter::CyclesElapsed => self.cycles,
            Counter::RequestsCompleted => self.requests,
        }
    }
}
