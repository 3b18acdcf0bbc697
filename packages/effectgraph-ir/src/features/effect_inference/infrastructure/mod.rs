/// Effect Inference Infrastructure
pub mod fixpoint_engine;
pub mod rules;

pub use fixpoint_engine::{FixpointEngine, InferenceOutcome};
pub use rules::{EffectRules, SiteFilter};
