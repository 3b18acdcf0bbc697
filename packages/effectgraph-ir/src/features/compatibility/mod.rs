/// Compatibility Feature
///
/// `is_assignable(source, target)`: for raises and tags independently, the
/// target's declared set subsumes the source's resolved set. On failure
/// `missing_kinds` gives the minimal witness.
///
/// Declaration checks (declared list vs inferred set, forbidden tags) and
/// binding checks (`let`, assignment, call arguments) produce
/// `EffectViolation`s.
pub mod domain;
pub mod infrastructure;

pub use domain::*;
pub use infrastructure::*;
