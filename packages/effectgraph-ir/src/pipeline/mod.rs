//! Pipeline orchestration

pub mod loader;
pub mod unit_analyzer;

pub use loader::{load_program, parse_program, ProgramFormat};
pub use unit_analyzer::{analyze_units, analyze_units_with, UnitAnalyzer, UnitResult};
