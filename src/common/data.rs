//! Memory Access Kinds.
//!
//! This module defines the access patterns the accelerator can generate.
//! Each kind combines a direction (read or write) with an address pattern
//! (constant stride, burst, or random within the stream's span). The
//! numeric code of each variant is part of the device's descriptor format.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::MempressError;

/// Access pattern and direction of one stream.
///
/// The discriminants are the wire codes placed in the low bits of a
/// stream descriptor word.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessKind {
    /// Reads at a constant stride.
    StrideRead = 0,

    /// Writes at a constant stride.
    StrideWrite = 1,

    /// Reads issued as back-to-back bursts.
    BurstRead = 2,

    /// Writes issued as back-to-back bursts.
    BurstWrite = 3,

    /// Reads at device-chosen random lines within the stream's span.
    ///
    /// The planner still reserves the full worst-case span.
    RandomRead = 4,

    /// Writes at device-chosen random lines within the stream's span.
    RandomWrite = 5,
}

impl AccessKind {
    /// All kinds in wire-code order.
    pub const ALL: [AccessKind; 6] = [
        AccessKind::StrideRead,
        AccessKind::StrideWrite,
        AccessKind::BurstRead,
        AccessKind::BurstWrite,
        AccessKind::RandomRead,
        AccessKind::RandomWrite,
    ];

    /// Returns the wire code of this kind.
    pub fn code(self) -> u64 {
        self as u64
    }

    /// Returns `true` if the stream stores to memory.
    pub fn is_write(self) -> bool {
        matches!(
            self,
            AccessKind::StrideWrite | AccessKind::BurstWrite | AccessKind::RandomWrite
        )
    }

    /// Returns `true` if the device picks addresses at random.
    pub fn is_random(self) -> bool {
        matches!(self, AccessKind::RandomRead | AccessKind::RandomWrite)
    }

    /// Returns the kind with the same pattern and the opposite direction.
    pub fn flipped(self) -> Self {
        match self {
            AccessKind::StrideRead => AccessKind::StrideWrite,
            AccessKind::StrideWrite => AccessKind::StrideRead,
            AccessKind::BurstRead => AccessKind::BurstWrite,
            AccessKind::BurstWrite => AccessKind::BurstRead,
            AccessKind::RandomRead => AccessKind::RandomWrite,
            AccessKind::RandomWrite => AccessKind::RandomRead,
        }
    }
}

impl TryFrom<u64> for AccessKind {
    type Error = MempressError;

    fn try_from(code: u64) -> Result<Self, Self::Error> {
        usize::try_from(code)
            .ok()
            .and_then(|idx| Self::ALL.get(idx).copied())
            .ok_or(MempressError::InvalidKind { code })
    }
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccessKind::StrideRead => "stride_rd",
            AccessKind::StrideWrite => "stride_wr",
            AccessKind::BurstRead => "burst_rd",
            AccessKind::BurstWrite => "burst_wr",
            AccessKind::RandomRead => "rand_rd",
            AccessKind::RandomWrite => "rand_wr",
        };
        f.write_str(name)
    }
}
