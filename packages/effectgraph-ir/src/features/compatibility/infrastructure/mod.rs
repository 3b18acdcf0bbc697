pub mod compatibility_checker;

pub use compatibility_checker::{AssignSource, CompatibilityChecker};
