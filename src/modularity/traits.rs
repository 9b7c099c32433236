//! Community detection traits.

use super::optimizer::ModularityOptimization;
use crate::coloring::ColoringProvider;
use crate::error::Result;
use crate::graph::RelationshipGraph;

/// Trait for community detection algorithms.
pub trait CommunityDetection {
    /// Detect communities in a graph.
    ///
    /// Returns a mapping from node index to community ID, with IDs
    /// renumbered to `0..community_count`.
    fn detect<G: RelationshipGraph>(&self, graph: &G) -> Result<Vec<usize>>;
}

impl<C: ColoringProvider + Sync> CommunityDetection for ModularityOptimization<C> {
    fn detect<G: RelationshipGraph>(&self, graph: &G) -> Result<Vec<usize>> {
        Ok(self.compute(graph)?.dense_communities())
    }
}
