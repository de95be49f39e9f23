//! Configuration system for the traffic generator.
//!
//! Every knob that differed between the historical test programs lives
//! here: device geometry and clock, the descriptor bit layout, how streams
//! are generated, and run options. Configuration is read from TOML; every
//! field has a default, so an empty file (or none at all) describes the
//! stock single-stream run.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::common::constants;
use crate::common::{MempressError, Result};
use crate::encoding::{DescriptorEncoder, EncodingFormat};
use crate::layout::LayoutPlanner;
use crate::stream::builder::PolicyKind;
use crate::stream::{GenerationPolicy, StreamSetBuilder, StreamSpec};

/// Default configuration constants not already fixed by the device.
mod defaults {
    /// Fixed per-request latency of the simple controller.
    pub const LATENCY: u64 = 40;

    /// CAS latency in device cycles.
    pub const T_CAS: u64 = 14;

    /// RAS latency in device cycles.
    pub const T_RAS: u64 = 14;

    /// Precharge latency in device cycles.
    pub const T_PRE: u64 = 14;

    /// Seed for random-kind addresses in the simulated device.
    pub const SEED: u64 = 0x6d65_6d70;
}

/// Memory timing model of the simulated device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum ControllerKind {
    /// Every request costs `latency` cycles.
    #[default]
    Simple,
    /// Open-row DRAM timing.
    #[serde(alias = "DRAM")]
    Dram,
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub device: DeviceConfig,
    pub encoding: EncodingFormat,
    pub streams: StreamsConfig,
    pub run: RunConfig,
}

/// Device geometry, clock, and simulated timing.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    #[serde(default = "default_clock_hz")]
    pub clock_hz: u64,

    #[serde(default = "default_bytes_per_request")]
    pub bytes_per_request: u64,

    #[serde(default = "default_cache_line")]
    pub cache_line_bytes: u64,

    #[serde(default = "default_page")]
    pub page_bytes: u64,

    #[serde(default = "default_max_streams")]
    pub max_streams: usize,

    #[serde(default)]
    pub controller: ControllerKind,

    #[serde(default = "default_latency")]
    pub latency: u64,

    #[serde(default = "default_t_cas")]
    pub t_cas: u64,

    #[serde(default = "default_t_ras")]
    pub t_ras: u64,

    #[serde(default = "default_t_pre")]
    pub t_pre: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            clock_hz: constants::CLOCK_HZ,
            bytes_per_request: constants::BYTES_PER_REQUEST,
            cache_line_bytes: constants::CACHE_LINE_BYTES,
            page_bytes: constants::PAGE_BYTES,
            max_streams: constants::MAX_STREAMS,
            controller: ControllerKind::default(),
            latency: defaults::LATENCY,
            t_cas: defaults::T_CAS,
            t_ras: defaults::T_RAS,
            t_pre: defaults::T_PRE,
        }
    }
}

/// Stream generation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamsConfig {
    #[serde(default)]
    pub policy: PolicyKind,

    /// Number of streams. For `custom`, defaults to the list length.
    #[serde(default)]
    pub count: Option<usize>,

    #[serde(default = "default_request_count")]
    pub request_count: u64,

    #[serde(default)]
    pub custom: Vec<StreamSpec>,
}

impl Default for StreamsConfig {
    fn default() -> Self {
        Self {
            policy: PolicyKind::default(),
            count: None,
            request_count: constants::DEFAULT_REQUEST_COUNT,
            custom: Vec::new(),
        }
    }
}

impl StreamsConfig {
    /// Requested stream count after applying the policy default.
    pub fn stream_count(&self) -> usize {
        match (self.count, self.policy) {
            (Some(count), _) => count,
            (None, PolicyKind::Custom) => self.custom.len(),
            (None, _) => 1,
        }
    }

    /// The generation policy these settings select.
    pub fn policy(&self) -> GenerationPolicy {
        self.policy.into_policy(&self.custom)
    }
}

/// Harness options.
#[derive(Debug, Clone, Deserialize)]
pub struct RunConfig {
    /// Lock all pages resident after prefaulting.
    #[serde(default = "default_true")]
    pub lock_pages: bool,

    /// Byte written once per page during prefault.
    #[serde(default = "default_fill")]
    pub prefault_fill: u8,

    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            lock_pages: true,
            prefault_fill: constants::PREFAULT_FILL,
            seed: defaults::SEED,
        }
    }
}

impl Config {
    /// Reads and validates a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parses and validates TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<()> {
        let d = &self.device;
        let bad = |msg: &str| Err(MempressError::InvalidConfig(msg.to_string()));

        if d.cache_line_bytes == 0 || d.page_bytes == 0 {
            return bad("cache_line_bytes and page_bytes must be non-zero");
        }
        if !d.page_bytes.is_power_of_two() {
            return bad("page_bytes must be a power of two");
        }
        if d.page_bytes % d.cache_line_bytes != 0 {
            return bad("page_bytes must be a multiple of cache_line_bytes");
        }
        if d.clock_hz == 0 {
            return bad("clock_hz must be non-zero");
        }
        if d.max_streams == 0 {
            return bad("max_streams must be at least 1");
        }
        self.encoding.validate()
    }

    /// Stream generator for this device.
    pub fn stream_builder(&self) -> StreamSetBuilder {
        StreamSetBuilder::new(
            self.device.max_streams,
            self.device.cache_line_bytes,
            self.streams.request_count,
        )
    }

    /// Layout planner for this device.
    pub fn planner(&self) -> Result<LayoutPlanner> {
        LayoutPlanner::new(self.device.cache_line_bytes, self.device.page_bytes)
    }

    /// Descriptor encoder for this device.
    pub fn encoder(&self) -> Result<DescriptorEncoder> {
        DescriptorEncoder::new(self.encoding)
    }
}

fn default_clock_hz() -> u64 {
    constants::CLOCK_HZ
}

fn default_bytes_per_request() -> u64 {
    constants::BYTES_PER_REQUEST
}

fn default_cache_line() -> u64 {
    constants::CACHE_LINE_BYTES
}

fn default_page() -> u64 {
    constants::PAGE_BYTES
}

fn default_max_streams() -> usize {
    constants::MAX_STREAMS
}

fn default_latency() -> u64 {
    defaults::LATENCY
}

fn default_t_cas() -> u64 {
    defaults::T_CAS
}

fn default_t_ras() -> u64 {
    defaults::T_RAS
}

fn default_t_pre() -> u64 {
    defaults::T_PRE
}

fn default_request_count() -> u64 {
    constants::DEFAULT_REQUEST_COUNT
}

fn default_true() -> bool {
    true
}

fn default_fill() -> u8 {
    constants::PREFAULT_FILL
}

fn default_seed() -> u64 {
    defaults::SEED
}
