//! Common test utilities for effectgraph-ir
//!
//! Shared fixtures, assertions and builders for integration and
//! property tests.

#![allow(dead_code)]

mod assertions;
mod builders;
mod fixtures;

pub use assertions::*;
pub use builders::*;
pub use fixtures::*;
