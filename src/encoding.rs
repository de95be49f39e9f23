//! Descriptor Encoder.
//!
//! Packs stream parameters into the fixed-width words the accelerator
//! accepts. A run is configured with one header descriptor followed by
//! one descriptor per stream:
//!
//! ```text
//! header word:  [ request budget | stream count ]
//!                 budget_bits      count_bits
//!
//! stream word:  [ stride_bytes | 0 ... | kind ]
//!                 << stride_shift        kind_bits
//! ```
//!
//! The field widths are not fixed by the device family; they are carried
//! in an `EncodingFormat` loaded from configuration. Stream descriptors
//! also carry the stream's base address as a second operand.
//!
//! Decoding exists for the simulated device and for verification.

use std::fmt;

use log::{debug, warn};
use serde::Deserialize;

use crate::common::constants::{funct, XLEN_BITS};
use crate::common::{AccessKind, MempressError, Result};
use crate::layout::Layout;
use crate::stream::StreamSpec;

mod defaults {
    pub const HEADER_STREAM_COUNT_BITS: u32 = 16;
    pub const HEADER_BUDGET_BITS: u32 = 48;
    pub const STREAM_KIND_BITS: u32 = 3;
    pub const STRIDE_SHIFT: u32 = 3;
}

/// Bit layout of header and stream words.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct EncodingFormat {
    /// Width of a descriptor word (at most 64).
    #[serde(default = "default_word_bits")]
    pub word_bits: u32,

    /// Low bits of the header holding the stream count.
    #[serde(default = "default_count_bits")]
    pub header_stream_count_bits: u32,

    /// Header bits above the count holding the request budget.
    #[serde(default = "default_budget_bits")]
    pub header_budget_bits: u32,

    /// Low bits of a stream word holding the access kind.
    #[serde(default = "default_kind_bits")]
    pub stream_kind_bits: u32,

    /// Left shift applied to the stride.
    #[serde(default = "default_stride_shift")]
    pub stride_shift: u32,
}

fn default_word_bits() -> u32 {
    XLEN_BITS
}

fn default_count_bits() -> u32 {
    defaults::HEADER_STREAM_COUNT_BITS
}

fn default_budget_bits() -> u32 {
    defaults::HEADER_BUDGET_BITS
}

fn default_kind_bits() -> u32 {
    defaults::STREAM_KIND_BITS
}

fn default_stride_shift() -> u32 {
    defaults::STRIDE_SHIFT
}

impl Default for EncodingFormat {
    fn default() -> Self {
        Self {
            word_bits: XLEN_BITS,
            header_stream_count_bits: defaults::HEADER_STREAM_COUNT_BITS,
            header_budget_bits: defaults::HEADER_BUDGET_BITS,
            stream_kind_bits: defaults::STREAM_KIND_BITS,
            stride_shift: defaults::STRIDE_SHIFT,
        }
    }
}

impl EncodingFormat {
    /// Checks that every field fits the word and no two fields overlap.
    pub fn validate(&self) -> Result<()> {
        let bad = |msg: String| Err(MempressError::InvalidEncoding(msg));

        if self.word_bits == 0 || self.word_bits > XLEN_BITS {
            return bad(format!("word_bits must be in 1..={XLEN_BITS}, got {}", self.word_bits));
        }
        if self.header_stream_count_bits == 0 || self.header_budget_bits == 0 {
            return bad("header fields must be at least one bit wide".to_string());
        }
        if self.header_stream_count_bits + self.header_budget_bits > self.word_bits {
            return bad(format!(
                "header needs {} bits but the word has {}",
                self.header_stream_count_bits + self.header_budget_bits,
                self.word_bits
            ));
        }
        if self.stream_kind_bits == 0 || self.stream_kind_bits > self.stride_shift {
            return bad(format!(
                "kind field of {} bits overlaps a stride shifted by {}",
                self.stream_kind_bits, self.stride_shift
            ));
        }
        if self.stride_shift >= self.word_bits {
            return bad(format!(
                "stride_shift {} leaves no room in a {}-bit word",
                self.stride_shift, self.word_bits
            ));
        }
        Ok(())
    }

    /// Largest stride a stream word can carry.
    pub fn max_stride(&self) -> u64 {
        mask(self.word_bits - self.stride_shift)
    }
}

/// One packed descriptor word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DescriptorWord(u64);

impl DescriptorWord {
    /// Wraps a raw word, e.g. one captured from a trace.
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw bits.
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DescriptorWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}

/// Descriptor command, i.e. which device operation a word configures.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Global stream count and request budget.
    Header,
    /// One stream's stride, kind, and base address.
    Stream,
}

impl Command {
    /// RoCC `funct7` code of the command.
    pub fn funct(self) -> u8 {
        match self {
            Command::Header => funct::HEADER,
            Command::Stream => funct::STREAM,
        }
    }
}

/// A descriptor as submitted to the device: command, packed word, operand.
///
/// The operand is the stream base address for `Stream` and zero for
/// `Header`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Descriptor {
    pub command: Command,
    pub word: DescriptorWord,
    pub operand: u64,
}

/// Ordered descriptor sequence for one run: one header, then the streams.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Program {
    descriptors: Vec<Descriptor>,
}

impl Program {
    /// All descriptors in submission order.
    pub fn descriptors(&self) -> &[Descriptor] {
        &self.descriptors
    }

    /// The header descriptor.
    pub fn header(&self) -> &Descriptor {
        &self.descriptors[0]
    }

    /// The per-stream descriptors.
    pub fn streams(&self) -> &[Descriptor] {
        &self.descriptors[1..]
    }

    /// Returns a copy whose stream operands are absolute addresses.
    ///
    /// Programs are encoded with buffer-relative offsets so encoding can
    /// fail before the buffer exists.
    pub fn rebased(&self, base: u64) -> Program {
        let descriptors = self
            .descriptors
            .iter()
            .map(|d| match d.command {
                Command::Header => *d,
                Command::Stream => Descriptor {
                    operand: base + d.operand,
                    ..*d
                },
            })
            .collect();
        Program { descriptors }
    }
}

/// Stateless encoder bound to one `EncodingFormat`.
#[derive(Clone, Copy, Debug)]
pub struct DescriptorEncoder {
    format: EncodingFormat,
}

impl DescriptorEncoder {
    /// Creates an encoder after validating `format`.
    pub fn new(format: EncodingFormat) -> Result<Self> {
        format.validate()?;
        Ok(Self { format })
    }

    /// The format this encoder packs with.
    pub fn format(&self) -> &EncodingFormat {
        &self.format
    }

    /// Packs the global header.
    ///
    /// # Errors
    ///
    /// `HeaderOverflow` if either value does not fit its field.
    pub fn encode_header(&self, stream_count: usize, request_budget: u64) -> Result<Descriptor> {
        let count_bits = self.format.header_stream_count_bits;
        let budget_bits = self.format.header_budget_bits;
        let count = stream_count as u64;

        if count > mask(count_bits) {
            return Err(MempressError::HeaderOverflow {
                field: "stream count",
                value: count,
                bits: count_bits,
            });
        }
        if request_budget > mask(budget_bits) {
            return Err(MempressError::HeaderOverflow {
                field: "request budget",
                value: request_budget,
                bits: budget_bits,
            });
        }

        Ok(Descriptor {
            command: Command::Header,
            word: DescriptorWord(count | (request_budget << count_bits)),
            operand: 0,
        })
    }

    /// Packs one stream record. `base_address` travels as the operand.
    ///
    /// # Errors
    ///
    /// * `StrideOverflow` if the shifted stride does not fit the word.
    /// * `InvalidKind` if the kind code does not fit the kind field.
    pub fn encode_stream(
        &self,
        stride_bytes: u64,
        kind: AccessKind,
        base_address: u64,
    ) -> Result<Descriptor> {
        let max_stride = self.format.max_stride();
        if stride_bytes > max_stride {
            return Err(MempressError::StrideOverflow {
                stride_bytes,
                max_stride,
            });
        }
        let code = kind.code();
        if code > mask(self.format.stream_kind_bits) {
            return Err(MempressError::InvalidKind { code });
        }

        Ok(Descriptor {
            command: Command::Stream,
            word: DescriptorWord((stride_bytes << self.format.stride_shift) | code),
            operand: base_address,
        })
    }

    /// Recovers `(stride_bytes, kind)` from a stream word.
    ///
    /// # Errors
    ///
    /// `InvalidKind` if the kind field holds an unknown code.
    pub fn decode_stream(&self, word: DescriptorWord) -> Result<(u64, AccessKind)> {
        let f = &self.format;
        let stride = (word.0 >> f.stride_shift) & mask(f.word_bits - f.stride_shift);
        let kind = AccessKind::try_from(word.0 & mask(f.stream_kind_bits))?;
        Ok((stride, kind))
    }

    /// Recovers `(stream_count, request_budget)` from a header word.
    pub fn decode_header(&self, word: DescriptorWord) -> (usize, u64) {
        let f = &self.format;
        let count = word.0 & mask(f.header_stream_count_bits);
        let budget = (word.0 >> f.header_stream_count_bits) & mask(f.header_budget_bits);
        (count as usize, budget)
    }

    /// Encodes a whole run with buffer-relative stream operands.
    ///
    /// The device applies one request budget to every stream, so the header
    /// carries the smallest per-stream count. No stream can then run past
    /// the span the layout reserved for it.
    pub fn encode_program(&self, streams: &[StreamSpec], layout: &Layout) -> Result<Program> {
        if streams.is_empty() {
            return Err(MempressError::EmptyStreamSet);
        }
        let budget = streams.iter().map(|s| s.request_count).min().unwrap_or(0);
        if streams.iter().any(|s| s.request_count != budget) {
            warn!("streams have unequal request counts; device budget clamped to {budget}");
        }

        let mut descriptors = Vec::with_capacity(streams.len() + 1);
        descriptors.push(self.encode_header(streams.len(), budget)?);
        for (stream, &offset) in streams.iter().zip(layout.offsets()) {
            let d = self.encode_stream(stream.stride_bytes, stream.kind, offset)?;
            debug!("stream {} word {} offset {:#x}", descriptors.len() - 1, d.word, offset);
            descriptors.push(d);
        }

        Ok(Program { descriptors })
    }
}

fn mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

#[cfg(test)]
mod tests {
    use super::mask;

    #[test]
    fn mask_widths() {
        assert_eq!(mask(0), 0);
        assert_eq!(mask(3), 0b111);
        assert_eq!(mask(63), u64::MAX >> 1);
        assert_eq!(mask(64), u64::MAX);
    }
}
