/// Call Graph Infrastructure
pub mod call_graph;
pub mod graph_builder;

pub use call_graph::CallGraph;
pub use graph_builder::CallGraphBuilder;
