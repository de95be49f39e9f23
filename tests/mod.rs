//! Test module organization.
//!
//! This module organizes all integration tests for the traffic generator.




/// Descriptor encoding tests.
mod encoding_tests;

/// End-to-end harness runs.
mod harness_tests;



/// Stream set generation tests.
mod stream_tests;
