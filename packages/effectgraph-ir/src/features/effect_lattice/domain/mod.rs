/// Effect Lattice Domain Models
pub mod effect_set;
pub mod hierarchy;

pub use effect_set::*;
pub use hierarchy::*;
