//! Feature modules, leaves first
//!
//! lattice -> call graph -> inference -> compatibility / diagnostics

pub mod call_graph;
pub mod compatibility;
pub mod diagnostics;
pub mod effect_inference;
pub mod effect_lattice;
