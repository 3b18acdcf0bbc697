/// Effect Inference Domain Models
pub mod effect_table;
pub mod ports;

pub use effect_table::*;
pub use ports::*;
