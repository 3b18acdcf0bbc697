/// Compatibility Domain Models
pub mod violation;

pub use violation::EffectViolation;
