//! Stream Buffer.
//!
//! One owned, page-aligned region holding every stream. The region is a
//! plain `Vec<u8>` over-allocated by one alignment unit; the aligned
//! window inside it is addressed purely by offset, so the layout planner's
//! offsets index it directly.

use std::hint::black_box;

use log::info;

use crate::common::{MempressError, Result};
use crate::layout::Layout;

/// Owned page-aligned buffer shared by all streams of a run.
pub struct StreamBuffer {
    storage: Vec<u8>,
    start: usize,
    len: usize,
}

impl StreamBuffer {
    /// Allocates `len` zeroed bytes aligned to `align`.
    ///
    /// # Errors
    ///
    /// `Allocation` if `align` is not a power of two or the host cannot
    /// provide the memory.
    pub fn allocate(len: u64, align: u64) -> Result<Self> {
        if !align.is_power_of_two() {
            return Err(MempressError::Allocation { bytes: len });
        }
        let oversize = len
            .checked_add(align)
            .and_then(|n| usize::try_from(n).ok())
            .filter(|&n| n <= isize::MAX as usize)
            .ok_or(MempressError::Allocation { bytes: len })?;

        let mut storage = Vec::new();
        storage
            .try_reserve_exact(oversize)
            .map_err(|_| MempressError::Allocation { bytes: len })?;
        storage.resize(oversize, 0u8);
        let start = storage.as_ptr().align_offset(align as usize);
        if start > align as usize {
            return Err(MempressError::Allocation { bytes: len });
        }

        Ok(Self {
            storage,
            start,
            len: len as usize,
        })
    }

    /// Host address of the first byte.
    pub fn base_address(&self) -> u64 {
        self.region().as_ptr() as u64
    }

    /// Length of the aligned region.
    pub fn len(&self) -> u64 {
        self.len as u64
    }

    /// Returns `true` if the region is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The aligned region.
    pub fn region(&self) -> &[u8] {
        &self.storage[self.start..self.start + self.len]
    }

    /// The aligned region, mutably.
    pub fn region_mut(&mut self) -> &mut [u8] {
        &mut self.storage[self.start..self.start + self.len]
    }

    /// Writes `fill` once every `stride` bytes. Returns the number of writes.
    pub fn prefault_range(&mut self, stride: u64, fill: u8) -> u64 {
        let region = self.region_mut();
        let mut touched = 0;
        for byte in region.iter_mut().step_by(stride as usize) {
            *byte = fill;
            touched += 1;
        }
        black_box(region);
        touched
    }

    /// Writes `fill` at every prefault offset of `layout`.
    pub fn prefault(&mut self, layout: &Layout, fill: u8) -> u64 {
        let region = self.region_mut();
        let mut touched = 0;
        for offset in layout.prefault_offsets() {
            region[offset as usize] = fill;
            touched += 1;
        }
        black_box(region);
        info!("prefaulted {touched} pages");
        touched
    }

    /// First byte of every access stream `index` makes with `stride_bytes`.
    pub fn stream_samples(&self, layout: &Layout, index: usize, stride_bytes: u64) -> Vec<u8> {
        let range = layout.range(index);
        self.region()[range.start as usize..range.end as usize]
            .iter()
            .step_by(stride_bytes as usize)
            .copied()
            .collect()
    }
}

/// Locks every current and future page of the process into memory.
///
/// Returns `false` when the host has no such facility.
pub fn lock_resident() -> Result<bool> {
    #[cfg(target_os = "linux")]
    {
        // SAFETY: mlockall takes only flags and touches no Rust-owned memory.
        let rc = unsafe { libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) };
        if rc != 0 {
            return Err(MempressError::Residency(std::io::Error::last_os_error()));
        }
        info!("locked all pages resident");
        Ok(true)
    }

    #[cfg(not(target_os = "linux"))]
    {
        log::warn!("page locking is not supported on this host; relying on prefault only");
        Ok(false)
    }
}
