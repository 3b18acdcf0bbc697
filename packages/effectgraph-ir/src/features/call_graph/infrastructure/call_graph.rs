//! Routine call graph with petgraph
//!
//! Nodes are routines, edges point from caller to statically resolved callee
//! (direct and method calls, mentions, and bindings aliasing a routine).
//! Tarjan SCC yields the callees-first visit order used by the engine.

use crate::features::call_graph::domain::{EdgeKind, RoutineSites};
use crate::shared::models::RoutineId;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashMap;

/// Call graph of one compilation unit
#[derive(Debug, Clone)]
pub struct CallGraph {
    /// caller -> callee
    graph: DiGraph<RoutineId, EdgeKind>,

    /// Per-routine sites, declaration order
    sites: Vec<RoutineSites>,

    /// Routine -> position in `sites`
    positions: FxHashMap<RoutineId, usize>,
}

impl CallGraph {
    pub fn new(sites: Vec<RoutineSites>) -> Self {
        let mut graph = DiGraph::with_capacity(sites.len(), 0);
        let mut nodes: FxHashMap<RoutineId, NodeIndex> = FxHashMap::default();
        let mut positions = FxHashMap::default();

        for (position, routine) in sites.iter().enumerate() {
            let idx = graph.add_node(routine.routine.clone());
            nodes.insert(routine.routine.clone(), idx);
            positions.insert(routine.routine.clone(), position);
        }

        for routine in &sites {
            let from = nodes[&routine.routine];
            for edge in &routine.edges {
                if let Some(to) = edge.target.routine().and_then(|id| nodes.get(id)) {
                    graph.add_edge(from, *to, edge.kind);
                }
            }
        }

        Self {
            graph,
            sites,
            positions,
        }
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn sites(&self, id: &RoutineId) -> Option<&RoutineSites> {
        self.positions.get(id).map(|&i| &self.sites[i])
    }

    pub fn all_sites(&self) -> &[RoutineSites] {
        &self.sites
    }

    pub fn declaration_order(&self) -> Vec<RoutineId> {
        self.sites.iter().map(|s| s.routine.clone()).collect()
    }

    /// Strongly connected components, callees before callers
    ///
    /// Members of a component are listed in declaration order.
    pub fn components(&self) -> Vec<Vec<RoutineId>> {
        tarjan_scc(&self.graph)
            .into_iter()
            .map(|scc| {
                let mut members: Vec<&RoutineId> = scc.iter().map(|&idx| &self.graph[idx]).collect();
                members.sort_by_key(|id| self.positions.get(*id).copied().unwrap_or(usize::MAX));
                members.into_iter().cloned().collect()
            })
            .collect()
    }

    pub fn callees_first_order(&self) -> Vec<RoutineId> {
        self.components().into_iter().flatten().collect()
    }
}
