/// Call Graph Domain Models
pub mod call_site;

pub use call_site::*;
