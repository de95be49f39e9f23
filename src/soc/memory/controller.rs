//! Memory Timing Controller.
//!
//! Latency models for a single device request. The simulated accelerator
//! charges one controller lookup per request, so the choice of model
//! decides whether stride and random streams cost the same or whether row
//! locality shows up in the cycle counter.

use crate::config::{ControllerKind, DeviceConfig};

/// Bytes covered by one open DDR row.
const ROW_BYTES: u64 = 2048;

/// Trait for memory controller implementations.
pub trait MemoryController {
    /// Latency in device cycles of one request to `addr`.
    fn access_latency(&mut self, addr: u64) -> u64;
}

/// Fixed latency for every request.
pub struct SimpleController {
    latency: u64,
}

impl SimpleController {
    /// Creates a controller charging `latency` cycles per request.
    pub fn new(latency: u64) -> Self {
        Self { latency }
    }
}

impl MemoryController for SimpleController {
    fn access_latency(&mut self, _addr: u64) -> u64 {
        self.latency
    }
}

/// Row-buffer timing of the DDR backend behind the accelerator's LLC.
///
/// In FPGA simulation the accelerator's requests reach a FASED DDR timing
/// model. Stride streams only see row locality when consecutive requests
/// stay inside one `ROW_BYTES` row, so this model keeps a single open row
/// and charges `t_cas` on a hit, `t_pre + t_ras + t_cas` when a request
/// moves to another row, and `t_ras + t_cas` to open the first row. Wide
/// strides and random streams therefore pay the full conflict cost on
/// nearly every request.
pub struct DramController {
    open_row: Option<u64>,
    t_cas: u64,
    t_ras: u64,
    t_pre: u64,
}

impl DramController {
    /// Creates a DRAM model with all rows closed.
    pub fn new(t_cas: u64, t_ras: u64, t_pre: u64) -> Self {
        Self {
            open_row: None,
            t_cas,
            t_ras,
            t_pre,
        }
    }
}

impl MemoryController for DramController {
    fn access_latency(&mut self, addr: u64) -> u64 {
        let row = addr / ROW_BYTES;

        match self.open_row.replace(row) {
            Some(open) if open == row => self.t_cas,
            Some(_) => self.t_pre + self.t_ras + self.t_cas,
            None => self.t_ras + self.t_cas,
        }
    }
}

/// Builds the controller selected in `config`.
pub fn build_controller(config: &DeviceConfig) -> Box<dyn MemoryController> {
    match config.controller {
        ControllerKind::Dram => Box::new(DramController::new(config.t_cas, config.t_ras, config.t_pre)),
        ControllerKind::Simple => Box::new(SimpleController::new(config.latency)),
    }
}
