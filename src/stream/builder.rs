//! Stream Set Builder.
//!
//! Turns a requested stream count and a generation policy into the ordered
//! list of `StreamSpec`s consumed by the layout planner. Each historical
//! test variant (one stream, four alternating streams, random traffic) is
//! just a different policy here.

use log::debug;
use serde::Deserialize;

use crate::common::{AccessKind, MempressError, Result};
use crate::stream::spec::StreamSpec;

/// How stream parameters are generated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GenerationPolicy {
    /// Stream `i` uses stride `(i + 1)` cache lines; even streams read,
    /// odd streams write.
    UniformAlternatingStrideReadWrite,

    /// Every stream uses a one-line stride; even streams read randomly,
    /// odd streams write randomly.
    FixedRandomReadWrite,

    /// Explicit streams, taken in order.
    CustomList(Vec<StreamSpec>),
}

/// Policy selector as written in configuration files and on the CLI.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    /// See [`GenerationPolicy::UniformAlternatingStrideReadWrite`].
    #[default]
    Alternating,
    /// See [`GenerationPolicy::FixedRandomReadWrite`].
    Random,
    /// See [`GenerationPolicy::CustomList`].
    Custom,
}

impl PolicyKind {
    /// Resolves the selector into a policy, attaching `custom` when needed.
    pub fn into_policy(self, custom: &[StreamSpec]) -> GenerationPolicy {
        match self {
            PolicyKind::Alternating => GenerationPolicy::UniformAlternatingStrideReadWrite,
            PolicyKind::Random => GenerationPolicy::FixedRandomReadWrite,
            PolicyKind::Custom => GenerationPolicy::CustomList(custom.to_vec()),
        }
    }
}

/// Generator for bounded stream sets.
#[derive(Clone, Debug)]
pub struct StreamSetBuilder {
    max_streams: usize,
    cache_line_bytes: u64,
    request_count: u64,
}

impl StreamSetBuilder {
    /// Creates a builder for a device with `max_streams` slots.
    ///
    /// Generated streams perform `request_count` accesses each.
    pub fn new(max_streams: usize, cache_line_bytes: u64, request_count: u64) -> Self {
        Self {
            max_streams,
            cache_line_bytes,
            request_count,
        }
    }

    /// Produces `stream_count` streams following `policy`.
    ///
    /// # Errors
    ///
    /// * `CapacityExceeded` if `stream_count > max_streams`.
    /// * `StreamCountMismatch` if a custom list is shorter than `stream_count`.
    pub fn build(&self, stream_count: usize, policy: &GenerationPolicy) -> Result<Vec<StreamSpec>> {
        if stream_count > self.max_streams {
            return Err(MempressError::CapacityExceeded {
                requested: stream_count,
                max_streams: self.max_streams,
            });
        }

        let streams: Vec<StreamSpec> = match policy {
            GenerationPolicy::UniformAlternatingStrideReadWrite => (0..stream_count)
                .map(|i| {
                    let kind = alternate(i, AccessKind::StrideRead);
                    let stride = (i as u64 + 1) * self.cache_line_bytes;
                    StreamSpec::new(kind, stride, self.request_count)
                })
                .collect(),
            GenerationPolicy::FixedRandomReadWrite => (0..stream_count)
                .map(|i| {
                    let kind = alternate(i, AccessKind::RandomRead);
                    StreamSpec::new(kind, self.cache_line_bytes, self.request_count)
                })
                .collect(),
            GenerationPolicy::CustomList(list) => {
                if list.len() < stream_count {
                    return Err(MempressError::StreamCountMismatch {
                        requested: stream_count,
                        available: list.len(),
                    });
                }
                list[..stream_count].to_vec()
            }
        };

        debug!("built {} streams: {:?}", streams.len(), streams);
        Ok(streams)
    }
}

fn alternate(index: usize, even: AccessKind) -> AccessKind {
    if index % 2 == 0 {
        even
    } else {
        even.flipped()
    }
}
