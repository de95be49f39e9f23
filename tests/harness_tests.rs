//! End-to-end harness tests.

use mempress::common::MempressError;
use mempress::config::Config;
use mempress::encoding::Command;
use mempress::sim::stride_walk::stride_walk;
use mempress::sim::{Harness, StreamBuffer};
use mempress::soc::memory::SimpleController;
use mempress::soc::{RecordingDevice, SimDevice};
use mempress::stats::Measurement;

/// Four alternating streams of 13 requests, pages left unlocked.
fn four_stream_config() -> Config {
    let mut config = Config::default();
    config.streams.count = Some(4);
    config.streams.request_count = 13;
    config.run.lock_pages = false;
    config
}

/// Tests a run submits the header then every stream at its absolute address.
#[test]
fn test_run_submits_program() {
    let harness = Harness::new(four_stream_config());
    let mut dev = RecordingDevice::with_counters(Measurement::new(1000, 500));
    let report = harness.run(&mut dev).unwrap();

    assert_eq!(dev.submitted.len(), 5);
    assert_eq!(dev.submitted[0].command, Command::Header);
    assert_eq!(dev.submitted[0].word.raw(), 4 | (13 << 16));
    assert_eq!(dev.fences, 2);

    let (base, len) = dev.bound.unwrap();
    assert_eq!(base % 4096, 0);
    assert_eq!(len, 12288);
    let operands: Vec<u64> = dev.submitted[1..].iter().map(|d| d.operand - base).collect();
    assert_eq!(operands, vec![0, 832, 2496, 4992]);

    assert_eq!(report.total_bytes, 12288);
    assert_eq!(report.pages, 3);
    assert_eq!(report.bytes_sent, 8000);
    assert_eq!(report.elapsed_ns, 500);
    assert_eq!(report.bandwidth_mbps, 16000);
}

/// Tests a device reporting zero cycles fails the run.
#[test]
fn test_run_zero_cycles() {
    let harness = Harness::new(four_stream_config());
    let mut dev = RecordingDevice::default();
    assert!(matches!(harness.run(&mut dev), Err(MempressError::ZeroCycles)));
}

/// Tests validation errors abort before anything reaches the device.
#[test]
fn test_run_fails_fast() {
    let mut config = four_stream_config();
    config.streams.count = Some(17);
    let mut dev = RecordingDevice::with_counters(Measurement::new(1, 1));
    assert!(matches!(
        Harness::new(config).run(&mut dev),
        Err(MempressError::CapacityExceeded { .. })
    ));
    assert!(dev.submitted.is_empty());
    assert!(dev.bound.is_none());
    assert_eq!(dev.fences, 0);
}

/// Tests an empty stream set is rejected before submission.
#[test]
fn test_run_empty_stream_set() {
    let mut config = four_stream_config();
    config.streams.count = Some(0);
    let mut dev = RecordingDevice::with_counters(Measurement::new(1, 1));
    assert!(matches!(
        Harness::new(config).run(&mut dev),
        Err(MempressError::EmptyStreamSet)
    ));
    assert!(dev.submitted.is_empty());
}

/// Tests a full run against the simulated device.
#[test]
fn test_run_on_sim_device() {
    let config = four_stream_config();
    let mut dev = SimDevice::new(
        config.encoder().unwrap(),
        Box::new(SimpleController::new(40)),
        64,
        1,
    );
    let report = Harness::new(config).run(&mut dev).unwrap();

    // 52 requests at 40 cycles over 4 streams: 520 cycles = 260 ns.
    assert_eq!(report.measurement, Measurement::new(520, 52));
    assert_eq!(report.elapsed_ns, 260);
    assert_eq!(report.bandwidth_mbps, 52 * 16 * 1000 / 260);
}

/// Tests random streams run cleanly through the planned layout.
#[test]
fn test_run_random_on_sim_device() {
    let mut config = four_stream_config();
    config.streams.policy = mempress::stream::builder::PolicyKind::Random;
    config.streams.count = Some(8);
    config.streams.request_count = 256;
    let mut dev = SimDevice::new(
        config.encoder().unwrap(),
        Box::new(SimpleController::new(10)),
        64,
        99,
    );
    let report = Harness::new(config).run(&mut dev).unwrap();
    assert_eq!(report.measurement.requests_completed, 8 * 256);
}

/// Tests prepare exposes the plan without running.
#[test]
fn test_prepare_plan() {
    let plan = Harness::new(four_stream_config()).prepare().unwrap();
    assert_eq!(plan.streams.len(), 4);
    assert_eq!(plan.program.descriptors().len(), 5);
    let rows = plan.rows();
    assert_eq!(rows[3].offset, 4992);
    assert_eq!(rows[3].span, 3328);
}

/// Tests the buffer is page aligned and prefault writes one byte per page.
#[test]
fn test_buffer_prefault() {
    let plan = Harness::new(four_stream_config()).prepare().unwrap();
    let mut buffer = StreamBuffer::allocate(plan.layout.total_bytes(), 4096).unwrap();

    assert_eq!(buffer.base_address() % 4096, 0);
    assert_eq!(buffer.len(), 12288);
    assert_eq!(buffer.prefault(&plan.layout, b'3'), 3);

    let region = buffer.region();
    assert_eq!(region[0], b'3');
    assert_eq!(region[4096], b'3');
    assert_eq!(region[8192], b'3');
    assert_eq!(region[1], 0);

    let samples = buffer.stream_samples(&plan.layout, 0, 64);
    assert_eq!(samples.len(), 13);
    assert_eq!(samples[0], b'3');
}

/// Tests non power-of-two alignment is refused.
#[test]
fn test_buffer_bad_alignment() {
    assert!(matches!(
        StreamBuffer::allocate(4096, 3000),
        Err(MempressError::Allocation { bytes: 4096 })
    ));
}

/// Tests the host stride walk visits every line after the first.
#[test]
fn test_stride_walk() {
    let report = stride_walk(64 * 1024, 64, 4096, b'3').unwrap();
    assert_eq!(report.lines, 1023);
    assert_eq!(report.bytes, 64 * 1024);
}

/// Tests a stride wider than the sweep is rejected.
#[test]
fn test_stride_walk_bad_stride() {
    assert!(stride_walk(4096, 0, 4096, b'3').is_err());
    assert!(stride_walk(4096, 4096, 4096, b'3').is_err());
    assert!(stride_walk(4096, 4095, 4096, b'3').is_err());
    assert!(stride_walk(4096, u64::MAX, 4096, b'3').is_err());
    assert!(stride_walk(0, 64, 4096, b'3').is_err());
}

/// Tests a buffer the host cannot provide is an error, not an abort.
#[test]
fn test_buffer_too_large() {
    assert!(matches!(
        StreamBuffer::allocate(1 << 52, 4096),
        Err(MempressError::Allocation { bytes }) if bytes == 1 << 52
    ));
}

/// Tests a stream set that plans but cannot be allocated fails the run.
#[test]
fn test_run_allocation_failure() {
    let mut config = four_stream_config();
    config.streams.count = Some(1);
    config.streams.request_count = 1 << 46;
    let mut dev = RecordingDevice::with_counters(Measurement::new(1, 1));
    assert!(matches!(
        Harness::new(config).run(&mut dev),
        Err(MempressError::Allocation { .. })
    ));
    assert!(dev.submitted.is_empty());
}
