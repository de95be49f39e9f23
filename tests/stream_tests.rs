//! Integration tests for stream set generation.

use mempress::common::{AccessKind, MempressError, CACHE_LINE_BYTES, MAX_STREAMS};
use mempress::stream::builder::PolicyKind;
use mempress::stream::{GenerationPolicy, StreamSetBuilder, StreamSpec};

fn builder(requests: u64) -> StreamSetBuilder {
    StreamSetBuilder::new(MAX_STREAMS, CACHE_LINE_BYTES, requests)
}

/// Tests the alternating policy produces increasing strides and R/W pairs.
#[test]
fn test_alternating_policy() {
    let streams = builder(13)
        .build(4, &GenerationPolicy::UniformAlternatingStrideReadWrite)
        .unwrap();

    let strides: Vec<u64> = streams.iter().map(|s| s.stride_bytes).collect();
    let kinds: Vec<AccessKind> = streams.iter().map(|s| s.kind).collect();
    assert_eq!(strides, vec![64, 128, 192, 256]);
    assert_eq!(
        kinds,
        vec![
            AccessKind::StrideRead,
            AccessKind::StrideWrite,
            AccessKind::StrideRead,
            AccessKind::StrideWrite
        ]
    );
    assert!(streams.iter().all(|s| s.request_count == 13));
}

/// Tests the random policy uses one-line strides.
#[test]
fn test_random_policy() {
    let streams = builder(8)
        .build(3, &GenerationPolicy::FixedRandomReadWrite)
        .unwrap();

    assert_eq!(streams.len(), 3);
    assert!(streams.iter().all(|s| s.stride_bytes == CACHE_LINE_BYTES));
    assert_eq!(streams[0].kind, AccessKind::RandomRead);
    assert_eq!(streams[1].kind, AccessKind::RandomWrite);
    assert_eq!(streams[2].kind, AccessKind::RandomRead);
}

/// Tests the custom policy keeps list order and truncates to the count.
#[test]
fn test_custom_policy() {
    let list = vec![
        StreamSpec::new(AccessKind::BurstRead, 64, 10),
        StreamSpec::new(AccessKind::BurstWrite, 128, 20),
        StreamSpec::new(AccessKind::RandomWrite, 64, 30),
    ];
    let streams = builder(1)
        .build(2, &GenerationPolicy::CustomList(list.clone()))
        .unwrap();
    assert_eq!(streams, list[..2].to_vec());
}

/// Tests that a short custom list is rejected.
#[test]
fn test_custom_policy_too_short() {
    let list = vec![StreamSpec::new(AccessKind::StrideRead, 64, 1)];
    let err = builder(1)
        .build(2, &GenerationPolicy::CustomList(list))
        .unwrap_err();
    assert!(matches!(
        err,
        MempressError::StreamCountMismatch {
            requested: 2,
            available: 1
        }
    ));
}

/// Tests the capacity boundary: exactly `max_streams` passes, one more fails.
#[test]
fn test_capacity_boundary() {
    let b = builder(1);
    let policy = GenerationPolicy::UniformAlternatingStrideReadWrite;

    assert_eq!(b.build(MAX_STREAMS, &policy).unwrap().len(), MAX_STREAMS);
    assert!(matches!(
        b.build(MAX_STREAMS + 1, &policy),
        Err(MempressError::CapacityExceeded {
            requested,
            max_streams
        }) if requested == MAX_STREAMS + 1 && max_streams == MAX_STREAMS
    ));
}

/// Tests that capacity is enforced for custom lists too.
#[test]
fn test_capacity_custom_list() {
    let list = vec![StreamSpec::new(AccessKind::StrideRead, 64, 1); 3];
    let b = StreamSetBuilder::new(2, CACHE_LINE_BYTES, 1);
    assert!(matches!(
        b.build(3, &GenerationPolicy::CustomList(list)),
        Err(MempressError::CapacityExceeded { .. })
    ));
}

/// Tests policy selectors resolve to the matching policy.
#[test]
fn test_policy_kind_resolution() {
    let custom = vec![StreamSpec::new(AccessKind::StrideRead, 64, 1)];
    assert_eq!(
        PolicyKind::Alternating.into_policy(&custom),
        GenerationPolicy::UniformAlternatingStrideReadWrite
    );
    assert_eq!(
        PolicyKind::Random.into_policy(&custom),
        GenerationPolicy::FixedRandomReadWrite
    );
    assert_eq!(
        PolicyKind::Custom.into_policy(&custom),
        GenerationPolicy::CustomList(custom.clone())
    );
}

/// Tests stream validation and span arithmetic.
#[test]
fn test_stream_spec_validate_and_span() {
    let s = StreamSpec::new(AccessKind::StrideRead, 128, 13);
    assert!(s.validate(0, 64).is_ok());
    assert_eq!(s.span(), Some(13 * 128));

    assert!(StreamSpec::new(AccessKind::StrideRead, 0, 1).validate(0, 64).is_err());
    assert!(StreamSpec::new(AccessKind::StrideRead, 32, 1).validate(0, 64).is_err());
    assert!(matches!(
        StreamSpec::new(AccessKind::StrideRead, 64, 1).validate(2, 0),
        Err(MempressError::InvalidStride { index: 2, .. })
    ));
    assert_eq!(StreamSpec::new(AccessKind::StrideRead, 64, u64::MAX).span(), None);
}
