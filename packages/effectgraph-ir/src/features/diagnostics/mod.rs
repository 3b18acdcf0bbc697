/// Diagnostics Feature
///
/// Effects accumulated up to an `effects_marker` statement (kind-only,
/// position-scoped), rendered as info diagnostics. Violations render as
/// error diagnostics.
pub mod domain;
pub mod infrastructure;

pub use domain::*;
pub use infrastructure::*;
