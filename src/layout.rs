//! Buffer Layout Planner.
//!
//! Computes where every stream lives inside one contiguous buffer. Streams
//! are packed back to back in index order, each reserving its worst-case
//! span, and the total is rounded up to a whole number of pages so the
//! harness can prefault the buffer one write per page.
//!
//! The device has no page-fault path. Every byte it may touch must be
//! resident before the timed region starts, so the planner is the single
//! source of truth for both the address ranges and the prefault offsets.

use std::ops::Range;

use log::info;

use crate::common::{MempressError, Result};
use crate::stream::StreamSpec;

/// Placement of every stream inside the shared buffer.
///
/// Immutable once planned. Index `i` of each sequence belongs to stream `i`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    total_bytes: u64,
    page_bytes: u64,
    offsets: Vec<u64>,
    spans: Vec<u64>,
}

impl Layout {
    /// Buffer size in bytes; always a multiple of the page size.
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Byte offset of each stream from the start of the buffer.
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// Reserved span of each stream.
    pub fn spans(&self) -> &[u64] {
        &self.spans
    }

    /// Number of planned streams.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Returns `true` if no streams were planned.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Half-open byte range reserved for stream `index`.
    pub fn range(&self, index: usize) -> Range<u64> {
        let start = self.offsets[index];
        start..start + self.spans[index]
    }

    /// Distance between consecutive prefault writes.
    pub fn prefault_stride(&self) -> u64 {
        self.page_bytes
    }

    /// Number of pages covering the buffer.
    pub fn page_count(&self) -> u64 {
        self.total_bytes / self.page_bytes
    }

    /// Every offset that must be written once before timing starts.
    ///
    /// One offset per page, starting at zero.
    pub fn prefault_offsets(&self) -> impl Iterator<Item = u64> {
        (0..self.total_bytes).step_by(self.page_bytes as usize)
    }
}

/// Stateless planner configured with the device line size and host page size.
#[derive(Clone, Copy, Debug)]
pub struct LayoutPlanner {
    cache_line_bytes: u64,
    page_bytes: u64,
}

impl LayoutPlanner {
    /// Creates a planner for one device geometry.
    ///
    /// # Errors
    ///
    /// `InvalidGeometry` unless the line is non-zero, the page is a power of
    /// two, and the page holds a whole number of lines.
    pub fn new(cache_line_bytes: u64, page_bytes: u64) -> Result<Self> {
        if cache_line_bytes == 0
            || !page_bytes.is_power_of_two()
            || page_bytes % cache_line_bytes != 0
        {
            return Err(MempressError::InvalidGeometry {
                cache_line_bytes,
                page_bytes,
            });
        }
        Ok(Self {
            cache_line_bytes,
            page_bytes,
        })
    }

    /// Distance between prefault writes (one per page).
    pub fn prefault_stride(&self) -> u64 {
        self.page_bytes
    }

    /// Plans a non-overlapping layout for `streams`.
    ///
    /// `offsets[0] = 0` and every following stream starts where the previous
    /// span ends. `total_bytes` is the sum of spans rounded up to the page
    /// size.
    ///
    /// # Errors
    ///
    /// * `InvalidStride` if any stride is zero or not a multiple of the line.
    /// * `SpanOverflow` if a span or the running total overflows `u64`.
    pub fn plan(&self, streams: &[StreamSpec]) -> Result<Layout> {
        let mut offsets = Vec::with_capacity(streams.len());
        let mut spans = Vec::with_capacity(streams.len());
        let mut cursor: u64 = 0;

        for (index, stream) in streams.iter().enumerate() {
            stream.validate(index, self.cache_line_bytes)?;
            let span = stream
                .span()
                .ok_or(MempressError::SpanOverflow { index })?;

            offsets.push(cursor);
            spans.push(span);
            cursor = cursor
                .checked_add(span)
                .ok_or(MempressError::SpanOverflow { index })?;
        }

        let total_bytes = round_up(cursor, self.page_bytes).ok_or(MempressError::SpanOverflow {
            index: streams.len().saturating_sub(1),
        })?;

        info!(
            "planned {} streams over {} bytes ({} pages)",
            streams.len(),
            total_bytes,
            total_bytes / self.page_bytes
        );

        Ok(Layout {
            total_bytes,
            page_bytes: self.page_bytes,
            offsets,
            spans,
        })
    }
}

fn round_up(value: u64, multiple: u64) -> Option<u64> {
    match value % multiple {
        0 => Some(value),
        rem => value.checked_add(multiple - rem),
    }
}

#[cfg(test)]
mod tests {
    use super::round_up;

    #[test]
    fn round_up_keeps_exact_multiples() {
        assert_eq!(round_up(0, 4096), Some(0));
        assert_eq!(round_up(8192, 4096), Some(8192));
    }

    #[test]
    fn round_up_moves_to_next_page() {
        assert_eq!(round_up(1, 4096), Some(4096));
        assert_eq!(round_up(8193, 4096), Some(12288));
    }

    #[test]
    fn round_up_reports_overflow() {
        assert_eq!(round_up(u64::MAX, 4096), None);
    }
}
