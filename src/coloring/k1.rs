//! Parallel speculative coloring (K1).
//!
//! ## The Algorithm (Çatalyürek et al. 2012)
//!
//! 1. **Tentative coloring**: every node still to be colored picks, in
//!    parallel, the smallest color none of its neighbors currently has.
//!    Neighbors being colored at the same moment may pick the same color.
//! 2. **Conflict detection**: every relationship is checked in parallel;
//!    for each conflicting pair the larger node id is queued again.
//! 3. Repeat until no conflicts remain or the iteration budget is spent.
//!
//! Conflicts shrink quickly in practice, so a handful of rounds suffices.
//! Whatever is left after the budget is recolored sequentially, so the
//! result is always a proper coloring.
//!
//! ## References
//!
//! Çatalyürek, Feo, Gebremedhin, Halappanavar, Pothen (2012). "Graph
//! coloring algorithms for multi-core and massively multithreaded
//! architectures." Parallel Computing 38(10-11), 576-594.

use super::greedy::{recolor_sequential, UNCOLORED};
use super::traits::ColoringProvider;
use super::{first_free_color, Coloring};
use crate::error::Result;
use crate::graph::{Direction, RelationshipGraph};
use log::debug;
use rayon::prelude::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Parallel speculative coloring with sequential conflict repair.
#[derive(Debug, Clone)]
pub struct K1Coloring {
    /// Smallest number of nodes handed to one worker, if fixed by the user.
    min_batch_size: Option<usize>,
}

impl K1Coloring {
    /// Batch size when neither the user nor the caller picks one.
    pub const DEFAULT_MIN_BATCH_SIZE: usize = 1_000;

    /// Create a K1 coloring provider.
    ///
    /// Workers take the caller's batch size when one is passed through
    /// [`ColoringProvider::color_batched`].
    pub fn new() -> Self {
        Self {
            min_batch_size: None,
        }
    }

    /// Set the smallest number of nodes handed to one worker.
    ///
    /// Overrides any batch size hint.
    pub fn with_min_batch_size(mut self, min_batch_size: usize) -> Self {
        self.min_batch_size = Some(min_batch_size.max(1));
        self
    }

    fn effective_batch_size(&self, hint: Option<usize>) -> usize {
        self.min_batch_size
            .or(hint)
            .unwrap_or(Self::DEFAULT_MIN_BATCH_SIZE)
            .max(1)
    }
}

impl Default for K1Coloring {
    fn default() -> Self {
        Self::new()
    }
}

impl ColoringProvider for K1Coloring {
    fn color<G: RelationshipGraph>(
        &self,
        graph: &G,
        direction: Direction,
        max_iterations: usize,
    ) -> Result<Coloring> {
        self.run(graph, direction, max_iterations, self.effective_batch_size(None))
    }

    fn color_batched<G: RelationshipGraph>(
        &self,
        graph: &G,
        direction: Direction,
        max_iterations: usize,
        batch_size: usize,
    ) -> Result<Coloring> {
        let batch_size = self.effective_batch_size(Some(batch_size));
        self.run(graph, direction, max_iterations, batch_size)
    }
}

impl K1Coloring {
    fn run<G: RelationshipGraph>(
        &self,
        graph: &G,
        direction: Direction,
        max_iterations: usize,
        batch_size: usize,
    ) -> Result<Coloring> {
        let n = graph.node_count();
        let colors: Vec<AtomicUsize> = (0..n).map(|_| AtomicUsize::new(UNCOLORED)).collect();
        let mut to_color: Vec<usize> = (0..n).collect();
        let mut rounds = 0;

        while !to_color.is_empty() && rounds < max_iterations {
            rounds += 1;

            to_color
                .par_iter()
                .with_min_len(batch_size)
                .for_each_init(Vec::new, |taken, &node| {
                    taken.clear();
                    graph.for_each_relationship(node, direction, 1.0, |_, v, _| {
                        if v != node {
                            taken.push(colors[v].load(Ordering::Relaxed));
                        }
                        true
                    });
                    colors[node].store(first_free_color(taken), Ordering::Relaxed);
                });

            let conflicted: Vec<AtomicBool> = (0..n).map(|_| AtomicBool::new(false)).collect();
            (0..n)
                .into_par_iter()
                .with_min_len(batch_size)
                .for_each(|node| {
                    let color = colors[node].load(Ordering::Relaxed);
                    graph.for_each_relationship(node, direction, 1.0, |_, v, _| {
                        if v != node && colors[v].load(Ordering::Relaxed) == color {
                            conflicted[node.max(v)].store(true, Ordering::Relaxed);
                        }
                        true
                    });
                });

            to_color = (0..n)
                .into_par_iter()
                .filter(|&node| conflicted[node].load(Ordering::Relaxed))
                .collect();
            debug!("K1 coloring round {rounds}: {} conflicts", to_color.len());
        }

        let mut colors: Vec<usize> = colors.into_iter().map(AtomicUsize::into_inner).collect();
        if !to_color.is_empty() {
            debug!(
                "K1 coloring budget of {max_iterations} rounds spent, repairing {} nodes sequentially",
                to_color.len()
            );
            recolor_sequential(graph, direction, &mut colors, &to_color);
        }

        Ok(Coloring::new(colors))
    }
}
