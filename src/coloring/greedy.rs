//! Sequential first-fit coloring.
//!
//! Visits nodes in id order and gives each the smallest color not used by
//! any neighbor. Deterministic, uses at most `max_degree + 1` colors, and
//! needs no synchronization.

use super::traits::ColoringProvider;
use super::{first_free_color, Coloring};
use crate::error::Result;
use crate::graph::{Direction, RelationshipGraph};

/// Marker for a node that has not been colored yet.
pub(crate) const UNCOLORED: usize = usize::MAX;

/// Sequential first-fit coloring.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreedyColoring;

impl GreedyColoring {
    /// Create a greedy coloring provider.
    pub fn new() -> Self {
        Self
    }
}

impl ColoringProvider for GreedyColoring {
    fn color<G: RelationshipGraph>(
        &self,
        graph: &G,
        direction: Direction,
        _max_iterations: usize,
    ) -> Result<Coloring> {
        let n = graph.node_count();
        let mut colors = vec![UNCOLORED; n];
        let all: Vec<usize> = (0..n).collect();
        recolor_sequential(graph, direction, &mut colors, &all);
        Ok(Coloring::new(colors))
    }
}

/// First-fit recolor `nodes` (ascending) one at a time.
///
/// A relationship may be visible from only one endpoint (a directed graph
/// traversed `Outgoing`). Nodes that can see a node being recolored are
/// collected up front, so each recolored node avoids every adjacent color in
/// either direction. Afterwards no conflict touches any node in `nodes`.
pub(crate) fn recolor_sequential<G: RelationshipGraph>(
    graph: &G,
    direction: Direction,
    colors: &mut [usize],
    nodes: &[usize],
) {
    let n = graph.node_count();
    let mut marked = vec![false; n];
    for &node in nodes {
        marked[node] = true;
    }

    // seen_by[v]: nodes whose traversal reaches v
    let mut seen_by: Vec<Vec<usize>> = vec![Vec::new(); n];
    for u in 0..n {
        graph.for_each_relationship(u, direction, 1.0, |_, v, _| {
            if v != u && marked[v] {
                seen_by[v].push(u);
            }
            true
        });
    }

    let mut taken = Vec::new();
    for &node in nodes {
        taken.clear();
        graph.for_each_relationship(node, direction, 1.0, |_, v, _| {
            if v != node {
                taken.push(colors[v]);
            }
            true
        });
        taken.extend(seen_by[node].iter().map(|&u| colors[u]));
        colors[node] = first_free_color(&mut taken);
    }
}
