//! Shared program model used by every feature
//!
//! The analyzer never builds these itself; the front end hands a `Program`
//! over per compilation unit.

pub mod models;

pub use models::*;
