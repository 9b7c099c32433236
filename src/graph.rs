//! Read-only graph access used by coloring and optimization.
//!
//! The optimizer never owns a graph. It only needs dense node ids in
//! `[0, node_count)` and a way to visit a node's relationships as
//! `(source, target, weight)` triples. [`RelationshipGraph`] captures exactly
//! that, and is implemented for [`petgraph::Graph`].
//!
//! Implementations must be [`Sync`]: every worker traverses the same graph
//! through a shared reference.

use petgraph::graph::{EdgeReference, IndexType, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::{EdgeType, Graph};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Which relationships of a node are visited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Relationships leaving the node.
    Outgoing,
    /// Relationships entering the node.
    Incoming,
    /// Both. The default, which treats a directed graph as undirected.
    #[default]
    Both,
}

impl From<petgraph::Direction> for Direction {
    fn from(d: petgraph::Direction) -> Self {
        match d {
            petgraph::Direction::Outgoing => Direction::Outgoing,
            petgraph::Direction::Incoming => Direction::Incoming,
        }
    }
}

/// Read-only, thread-safe relationship traversal over dense node ids.
pub trait RelationshipGraph: Sync {
    /// Number of nodes. Node ids are `0..node_count()`.
    fn node_count(&self) -> usize;

    /// Visit every relationship of `node` under `direction`.
    ///
    /// The visitor receives `(node, neighbor, weight)`; unweighted
    /// relationships report `default_weight`. Returning `false` stops the
    /// traversal.
    fn for_each_relationship<F>(
        &self,
        node: usize,
        direction: Direction,
        default_weight: f64,
        visitor: F,
    ) where
        F: FnMut(usize, usize, f64) -> bool;

    /// External id of `node`. Defaults to the dense id itself.
    fn to_original_node_id(&self, node: usize) -> u64 {
        node as u64
    }

    /// Sum of the weights visited for `node`.
    fn incident_weight(&self, node: usize, direction: Direction, default_weight: f64) -> f64 {
        let mut total = 0.0;
        self.for_each_relationship(node, direction, default_weight, |_, _, w| {
            total += w;
            true
        });
        total
    }
}

/// Edge payloads that may carry a relationship weight.
pub trait RelationshipWeight {
    /// The weight, or `None` to use the traversal's default weight.
    fn relationship_weight(&self) -> Option<f64>;
}

impl RelationshipWeight for () {
    fn relationship_weight(&self) -> Option<f64> {
        None
    }
}

macro_rules! numeric_weight {
    ($($t:ty),*) => {
        $(
            impl RelationshipWeight for $t {
                fn relationship_weight(&self) -> Option<f64> {
                    Some(*self as f64)
                }
            }
        )*
    };
}

numeric_weight!(f32, f64, u8, u16, u32, u64, usize, i32, i64);

impl<W: RelationshipWeight> RelationshipWeight for Option<W> {
    fn relationship_weight(&self) -> Option<f64> {
        self.as_ref().and_then(RelationshipWeight::relationship_weight)
    }
}

impl<N, E, Ty, Ix> RelationshipGraph for Graph<N, E, Ty, Ix>
where
    N: Sync,
    E: RelationshipWeight + Sync,
    Ty: EdgeType + Sync,
    Ix: IndexType + Sync,
{
    fn node_count(&self) -> usize {
        Graph::node_count(self)
    }

    /// Undirected graphs ignore `direction` and visit each incident edge
    /// once, except self-loops, which are visited twice (once per
    /// endpoint). Directed graphs with [`Direction::Both`] visit a self-loop
    /// twice as well, so both representations yield the same weights.
    fn for_each_relationship<F>(
        &self,
        node: usize,
        direction: Direction,
        default_weight: f64,
        mut visitor: F,
    ) where
        F: FnMut(usize, usize, f64) -> bool,
    {
        let a = NodeIndex::<Ix>::new(node);
        let mut visit = |edge: EdgeReference<'_, E, Ix>| {
            let other = if edge.source() == a {
                edge.target()
            } else {
                edge.source()
            };
            let w = edge
                .weight()
                .relationship_weight()
                .unwrap_or(default_weight);
            visitor(node, other.index(), w)
        };

        if !self.is_directed() {
            for edge in self.edges(a) {
                // a self-loop touches the node with both ends
                let repeat = edge.source() == edge.target();
                if !visit(edge) || (repeat && !visit(edge)) {
                    return;
                }
            }
            return;
        }

        let directions: &[petgraph::Direction] = match direction {
            Direction::Outgoing => &[petgraph::Direction::Outgoing],
            Direction::Incoming => &[petgraph::Direction::Incoming],
            Direction::Both => &[petgraph::Direction::Outgoing, petgraph::Direction::Incoming],
        };
        for &d in directions {
            for edge in self.edges_directed(a, d) {
                if !visit(edge) {
                    return;
                }
            }
        }
    }
}
