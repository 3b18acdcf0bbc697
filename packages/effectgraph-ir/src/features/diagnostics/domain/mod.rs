/// Diagnostics Domain Models
pub mod diagnostic;

pub use diagnostic::*;
