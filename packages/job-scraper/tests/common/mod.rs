//! Shared test utilities for integration tests.

#![allow(dead_code)]

pub mod fixtures;
pub mod harness;

pub use fixtures::*;
pub use harness::TestHarness;
