/// Effect Inference Feature
///
/// Least fixed point of raises and tags sets over the call graph.
///
/// ## Components
/// - `rules`: contribution of each site, dispatched on the edge kind
/// - `FixpointEngine`: seeding, passes, pass bound and widening
/// - `EffectInferenceService`: engine plus published cross-unit effects
///
/// Inference never fails: missing precision becomes `Unknown`.
pub mod application;
pub mod domain;
pub mod infrastructure;

pub use application::*;
pub use domain::*;
pub use infrastructure::*;
