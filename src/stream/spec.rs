//! Stream Specification.
//!
//! A `StreamSpec` describes one independent access stream: what it does
//! (`AccessKind`), how far apart consecutive accesses land (`stride_bytes`),
//! and how many accesses it performs (`request_count`).

use serde::{Deserialize, Serialize};

use crate::common::{AccessKind, MempressError, Result};

/// One access stream executed concurrently with the others by the device.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSpec {
    /// Access pattern and direction.
    pub kind: AccessKind,

    /// Byte distance between consecutive accesses.
    ///
    /// Must be a positive multiple of the device cache line.
    pub stride_bytes: u64,

    /// Number of accesses this stream performs.
    pub request_count: u64,
}

impl StreamSpec {
    /// Creates a stream description. No validation happens here; see
    /// [`StreamSpec::validate`].
    pub fn new(kind: AccessKind, stride_bytes: u64, request_count: u64) -> Self {
        Self {
            kind,
            stride_bytes,
            request_count,
        }
    }

    /// Bytes of address space the stream may touch, or `None` on overflow.
    ///
    /// Random kinds are bounded by the same span; the device only picks
    /// lines inside it.
    pub fn span(&self) -> Option<u64> {
        self.request_count.checked_mul(self.stride_bytes)
    }

    /// Checks the stride invariant against `cache_line_bytes`.
    ///
    /// `index` is only used to label the error.
    pub fn validate(&self, index: usize, cache_line_bytes: u64) -> Result<()> {
        if self.stride_bytes == 0 || cache_line_bytes == 0 || self.stride_bytes % cache_line_bytes != 0 {
            return Err(MempressError::InvalidStride {
                index,
                stride_bytes: self.stride_bytes,
                cache_line_bytes,
            });
        }
        Ok(())
    }
}
