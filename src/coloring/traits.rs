//! Coloring provider trait.

use super::Coloring;
use crate::error::Result;
use crate::graph::{Direction, RelationshipGraph};

/// Trait for algorithms that partition nodes into independent sets.
pub trait ColoringProvider {
    /// Color `graph` so that no relationship visible under `direction`
    /// joins two nodes of the same color.
    ///
    /// `max_iterations` bounds iterative providers; others ignore it. The
    /// guarantee must hold however small the budget is.
    fn color<G: RelationshipGraph>(
        &self,
        graph: &G,
        direction: Direction,
        max_iterations: usize,
    ) -> Result<Coloring>;

    /// Like [`ColoringProvider::color`], with the caller's batch size as a
    /// hint for how many nodes one worker should take.
    ///
    /// Sequential providers ignore the hint.
    fn color_batched<G: RelationshipGraph>(
        &self,
        graph: &G,
        direction: Direction,
        max_iterations: usize,
        _batch_size: usize,
    ) -> Result<Coloring> {
        self.color(graph, direction, max_iterations)
    }
}

/// A precomputed coloring colors any graph it was computed for.
///
/// The coloring is validated against the graph before it is handed out.
impl ColoringProvider for Coloring {
    fn color<G: RelationshipGraph>(
        &self,
        graph: &G,
        direction: Direction,
        _max_iterations: usize,
    ) -> Result<Coloring> {
        self.validate(graph, direction)?;
        Ok(self.clone())
    }
}
