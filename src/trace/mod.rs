//! Replay of accelerator simulation logs.
//!
//! RTL and FPGA-accelerated simulations of the accelerator print a line for
//! every tag and address-table event, and a multi-line block for every AXI4
//! channel handshake between the accelerator's last-level cache model and
//! the memory backend. The checkers here replay those logs line by line and
//! report the first inconsistency with its line number.

/// AXI4 channel handshake checker.
pub mod axi4;

/// Request tag and read-address ledger.
pub mod tags;

pub use axi4::{Axi4Checker, AxiRequest};
pub use tags::TagLedger;

use regex::Regex;

/// Parses the first capture group of `re` in `text` with `radix`.
fn capture(re: &Regex, text: &str, radix: u32) -> Option<u64> {
    let caps = re.captures(text)?;
    u64::from_str_radix(caps.get(1)?.as_str(), radix).ok()
}
