//! Integration tests for descriptor encoding.

use mempress::common::{AccessKind, MempressError};
use mempress::encoding::{Command, DescriptorEncoder, DescriptorWord, EncodingFormat};
use mempress::layout::LayoutPlanner;
use mempress::stream::StreamSpec;
use proptest::prelude::*;

fn encoder() -> DescriptorEncoder {
    DescriptorEncoder::new(EncodingFormat::default()).unwrap()
}

/// Tests the stream word matches the device convention `stride << 3 | kind`.
#[test]
fn test_stream_word_layout() {
    let d = encoder()
        .encode_stream(128, AccessKind::StrideWrite, 0x8000_1000)
        .unwrap();
    assert_eq!(d.command, Command::Stream);
    assert_eq!(d.command.funct(), 2);
    assert_eq!(d.word.raw(), (128 << 3) | 1);
    assert_eq!(d.operand, 0x8000_1000);
}

/// Tests the header word packs the count low and the budget above it.
#[test]
fn test_header_word_layout() {
    let d = encoder().encode_header(4, 13).unwrap();
    assert_eq!(d.command, Command::Header);
    assert_eq!(d.command.funct(), 1);
    assert_eq!(d.word.raw(), 4 | (13 << 16));
    assert_eq!(encoder().decode_header(d.word), (4, 13));
}

/// Tests header fields that do not fit are rejected.
#[test]
fn test_header_overflow() {
    let e = encoder();
    assert!(matches!(
        e.encode_header(1 << 16, 1),
        Err(MempressError::HeaderOverflow { field: "stream count", .. })
    ));
    assert!(matches!(
        e.encode_header(1, 1 << 48),
        Err(MempressError::HeaderOverflow { field: "request budget", .. })
    ));
    assert!(e.encode_header(0xFFFF, (1 << 48) - 1).is_ok());
}

/// Tests strides wider than the word are rejected.
#[test]
fn test_stride_overflow() {
    let format = EncodingFormat {
        word_bits: 16,
        header_stream_count_bits: 4,
        header_budget_bits: 12,
        stream_kind_bits: 3,
        stride_shift: 3,
    };
    let e = DescriptorEncoder::new(format).unwrap();
    assert_eq!(format.max_stride(), 8191);
    assert!(e.encode_stream(8191, AccessKind::StrideRead, 0).is_ok());
    assert!(matches!(
        e.encode_stream(8192, AccessKind::StrideRead, 0),
        Err(MempressError::StrideOverflow {
            stride_bytes: 8192,
            max_stride: 8191
        })
    ));
}

/// Tests kinds whose code does not fit a narrow kind field are rejected.
#[test]
fn test_kind_field_too_narrow() {
    let format = EncodingFormat {
        stream_kind_bits: 2,
        stride_shift: 2,
        ..EncodingFormat::default()
    };
    let e = DescriptorEncoder::new(format).unwrap();
    assert!(e.encode_stream(64, AccessKind::BurstWrite, 0).is_ok());
    assert!(matches!(
        e.encode_stream(64, AccessKind::RandomRead, 0),
        Err(MempressError::InvalidKind { code: 4 })
    ));
}

/// Tests decoding an unknown kind code fails.
#[test]
fn test_decode_invalid_kind() {
    let word = DescriptorWord::from_raw((64 << 3) | 6);
    assert!(matches!(
        encoder().decode_stream(word),
        Err(MempressError::InvalidKind { code: 6 })
    ));
}

/// Tests inconsistent formats are rejected.
#[test]
fn test_format_validation() {
    let base = EncodingFormat::default();
    let cases = [
        EncodingFormat { word_bits: 0, ..base },
        EncodingFormat { word_bits: 65, ..base },
        EncodingFormat { header_budget_bits: 49, ..base },
        EncodingFormat { header_stream_count_bits: 0, ..base },
        EncodingFormat { stream_kind_bits: 4, ..base },
        EncodingFormat { stream_kind_bits: 0, ..base },
        EncodingFormat { stride_shift: 64, stream_kind_bits: 3, ..base },
    ];
    for format in cases {
        assert!(
            matches!(DescriptorEncoder::new(format), Err(MempressError::InvalidEncoding(_))),
            "{format:?} accepted"
        );
    }
}

/// Tests a program is one header followed by one descriptor per stream.
#[test]
fn test_encode_program() {
    let streams = [
        StreamSpec::new(AccessKind::StrideRead, 64, 13),
        StreamSpec::new(AccessKind::StrideWrite, 128, 13),
    ];
    let layout = LayoutPlanner::new(64, 4096).unwrap().plan(&streams).unwrap();
    let program = encoder().encode_program(&streams, &layout).unwrap();

    assert_eq!(program.descriptors().len(), 3);
    assert_eq!(encoder().decode_header(program.header().word), (2, 13));
    assert_eq!(program.streams()[0].operand, 0);
    assert_eq!(program.streams()[1].operand, 13 * 64);

    let rebased = program.rebased(0x4000_0000);
    assert_eq!(rebased.header(), program.header());
    assert_eq!(rebased.streams()[0].operand, 0x4000_0000);
    assert_eq!(rebased.streams()[1].operand, 0x4000_0000 + 13 * 64);
    assert_eq!(rebased.streams()[1].word, program.streams()[1].word);
}

/// Tests unequal request counts clamp the budget to the smallest.
#[test]
fn test_program_budget_is_minimum() {
    let streams = [
        StreamSpec::new(AccessKind::StrideRead, 64, 20),
        StreamSpec::new(AccessKind::StrideWrite, 64, 7),
    ];
    let layout = LayoutPlanner::new(64, 4096).unwrap().plan(&streams).unwrap();
    let program = encoder().encode_program(&streams, &layout).unwrap();
    assert_eq!(encoder().decode_header(program.header().word), (2, 7));
}

/// Tests an empty stream set cannot be encoded.
#[test]
fn test_encode_program_empty() {
    let layout = LayoutPlanner::new(64, 4096).unwrap().plan(&[]).unwrap();
    assert!(matches!(
        encoder().encode_program(&[], &layout),
        Err(MempressError::EmptyStreamSet)
    ));
}

/// Tests word display is fixed-width hex.
#[test]
fn test_word_display() {
    assert_eq!(
        DescriptorWord::from_raw(0x201).to_string(),
        "0x0000000000000201"
    );
}

proptest! {
    /// Decoding is the left inverse of encoding for every valid pair.
    #[test]
    fn prop_stream_round_trip(stride in 0u64..=(u64::MAX >> 3), kind in 0usize..6, base: u64) {
        let e = encoder();
        let kind = AccessKind::ALL[kind];
        let d = e.encode_stream(stride, kind, base).unwrap();
        prop_assert_eq!(e.decode_stream(d.word).unwrap(), (stride, kind));
    }

    /// Round trip also holds for narrow formats.
    #[test]
    fn prop_stream_round_trip_narrow(stride in 0u64..8192, kind in 0usize..6) {
        let format = EncodingFormat {
            word_bits: 16,
            header_stream_count_bits: 4,
            header_budget_bits: 12,
            stream_kind_bits: 3,
            stride_shift: 3,
        };
        let e = DescriptorEncoder::new(format).unwrap();
        let kind = AccessKind::ALL[kind];
        let d = e.encode_stream(stride, kind, 0).unwrap();
        prop_assert!(d.word.raw() < (1 << 16));
        prop_assert_eq!(e.decode_stream(d.word).unwrap(), (stride, kind));
    }

    /// Header fields round trip within their widths.
    #[test]
    fn prop_header_round_trip(count in 0usize..=0xFFFF, budget in 0u64..(1 << 48)) {
        let e = encoder();
        let d = e.encode_header(count, budget).unwrap();
        prop_assert_eq!(e.decode_header(d.word), (count, budget));
    }
}
