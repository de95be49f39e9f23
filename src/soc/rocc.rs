//! RoCC Accelerator Interface.
//!
//! Issues descriptors to the accelerator through the `custom-2` opcode.
//! Command writes use both source registers and no destination
//! (`xs1 = xs2 = 1`, `xd = 0`, funct3 `0b011`); counter reads use only a
//! destination (`xd = 1`, funct3 `0b100`).

use std::arch::asm;

use crate::common::Result;
use crate::encoding::{Command, Descriptor};
use crate::soc::traits::{Counter, Device};

macro_rules! rocc_ss {
    ($funct:literal, $rs1:expr, $rs2:expr) => {
        asm!(
            concat!(".insn r 0x5b, 3, ", $funct, ", x0, {0}, {1}"),
            in(reg) $rs1,
            in(reg) $rs2,
            options(nostack),
        )
    };
}

macro_rules! rocc_d {
    ($funct:literal) => {{
        let rd: u64;
        asm!(
            concat!(".insn r 0x5b, 4, ", $funct, ", {0}, x0, x0"),
            out(reg) rd,
            options(nostack),
        );
        rd
    }};
}

/// The accelerator attached to this hart.
#[derive(Debug, Default)]
pub struct RoccDevice;

impl Device for RoccDevice {
    fn name(&self) -> &str {
        "rocc"
    }

    fn fence(&mut self) {
        // SAFETY: a full fence has no operands and no side effects on Rust state.
        unsafe { asm!("fence", options(nostack)) }
    }

    fn submit(&mut self, descriptor: &Descriptor) -> Result<()> {
        let word = descriptor.word.raw();
        let operand = descriptor.operand;
        // SAFETY: the instruction only transfers two register values to the
        // accelerator. Stream operands point into the prefaulted, locked buffer.
        unsafe {
            match descriptor.command {
                Command::Header => rocc_ss!(1, word, operand),
                Command::Stream => rocc_ss!(2, word, operand),
            }
        }
        Ok(())
    }

    fn read_counter(&mut self, counter: Counter) -> u64 {
        // SAFETY: counter reads only write the destination register.
        unsafe {
            match counter {
                Counter::CyclesElapsed => rocc_d!(3),
                Counter::RequestsCompleted => rocc_d!(4),
            }
        }
    }
}
