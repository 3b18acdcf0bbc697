/// Effect Lattice Feature
///
/// Sets of exception kinds or tag kinds ordered by hierarchy-aware inclusion.
///
/// ## Operations
/// - `union`: join; `Empty` is the identity, `Unknown` is absorbing
/// - `subsumes`: every element of the right side is covered by the left side
/// - `raises_kind`: may the set produce an instance of a kind
///
/// All operations are total over well-formed sets.
pub mod domain;

pub use domain::*;
