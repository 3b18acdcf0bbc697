/// Call Graph Feature
///
/// Per-routine ordered call sites, mentions, raise sites and marker sites,
/// plus a petgraph view of routine-to-routine edges.
///
/// ## Edge kinds
/// - `direct`: statically known routine
/// - `method`: dynamically dispatched routine
/// - `indirect_param`: call through the routine's own parameter
/// - `indirect_local`: call through a local, global or computed proc value
/// - `mention`: proc value in non-call position
pub mod domain;
pub mod infrastructure;

pub use domain::*;
pub use infrastructure::*;
