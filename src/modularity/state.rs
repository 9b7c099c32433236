//! State of one optimization run.
//!
//! Everything a run mutates lives in [`RunContext`], created by
//! [`RunContext::initialize`] and dropped when the run ends; only the
//! immutable result outlives it.

use super::task::ColorPhase;
use crate::atomic::AtomicDoubleArray;
use crate::coloring::Coloring;
use crate::error::{Error, Result};
use crate::graph::{Direction, RelationshipGraph};
use crate::progress::ProgressLogger;
use rayon::prelude::*;
use std::collections::HashMap;

/// Community assignment, weights and staged updates of a run.
#[derive(Debug)]
pub(crate) struct RunContext {
    /// Committed community of every node.
    pub(crate) current: Vec<usize>,
    /// Community chosen in the running phase; node-owned slots.
    pub(crate) next: Vec<usize>,
    /// Sum of incident weights per node. Fixed after initialization.
    pub(crate) cumulative_node_weights: Vec<f64>,
    /// Weight from each node into its chosen community.
    pub(crate) influences: Vec<f64>,
    /// Committed total weight per community.
    pub(crate) community_weights: AtomicDoubleArray,
    /// Pending per-community deltas of the running phase.
    pub(crate) staged: AtomicDoubleArray,
    /// Total graph weight W (half the summed incident weight).
    pub(crate) total_weight: f64,
}

impl RunContext {
    /// Compute node and community weights for the starting assignment.
    ///
    /// `initial` is the starting community of every node, or `None` for
    /// one community per node.
    pub(crate) fn initialize<G: RelationshipGraph>(
        graph: &G,
        direction: Direction,
        initial: Option<&[usize]>,
        scale: f64,
        batch_size: usize,
        progress: &ProgressLogger,
    ) -> Result<Self> {
        let n = graph.node_count();
        let current: Vec<usize> = match initial {
            Some(initial) if initial.len() != n => {
                return Err(Error::DimensionMismatch {
                    expected: n,
                    found: initial.len(),
                })
            }
            Some(initial) => initial.to_vec(),
            None => (0..n).collect(),
        };

        let community_weights = AtomicDoubleArray::new(n, scale)?;
        let staged = AtomicDoubleArray::new(n, scale)?;

        progress.reset(n);
        let cumulative_node_weights: Vec<f64> = (0..n)
            .into_par_iter()
            .with_min_len(batch_size)
            .map(|node| {
                let weight = graph.incident_weight(node, direction, 1.0);
                let _ = progress.log_progress(1);
                weight
            })
            .collect();

        cumulative_node_weights
            .par_iter()
            .zip(current.par_iter())
            .with_min_len(batch_size)
            .try_for_each(|(&weight, &community)| {
                community_weights.add_exact(community, weight).map(|_| ())
            })?;

        let summed_degree = cumulative_node_weights
            .par_iter()
            .copied()
            .reduce_with(|a, b| a + b)
            .ok_or_else(|| Error::Initialization("no node weights to reduce".into()))?;

        Ok(Self {
            next: current.clone(),
            current,
            cumulative_node_weights,
            influences: vec![0.0; n],
            community_weights,
            staged,
            total_weight: summed_degree / 2.0,
        })
    }

    /// Number of nodes.
    pub(crate) fn node_count(&self) -> usize {
        self.current.len()
    }

    /// Forget the influences of the previous sweep.
    pub(crate) fn reset_influences(&mut self) {
        self.influences.par_iter_mut().for_each(|w| *w = 0.0);
    }

    /// Run all local-move tasks of one color and wait for them.
    ///
    /// Tasks get disjoint `batch_size` chunks of `next` and `influences`,
    /// so each node slot has exactly one writer. Returns the number of
    /// nodes that chose a new community.
    pub(crate) fn sweep_color<G: RelationshipGraph>(
        &mut self,
        graph: &G,
        direction: Direction,
        coloring: &Coloring,
        color: usize,
        batch_size: usize,
        progress: &ProgressLogger,
    ) -> usize {
        let Self {
            current,
            next,
            cumulative_node_weights,
            influences,
            community_weights,
            staged,
            total_weight,
        } = self;

        let phase = ColorPhase {
            graph,
            direction,
            color,
            colors: coloring.colors(),
            current,
            cumulative_node_weights,
            community_weights,
            staged,
            total_weight: *total_weight,
        };

        next.par_chunks_mut(batch_size)
            .zip(influences.par_chunks_mut(batch_size))
            .enumerate()
            .map_init(HashMap::new, |links, (batch, (next, influences))| {
                let moved = phase.run_batch(batch * batch_size, next, influences, links);
                let _ = progress.log_progress(next.len());
                moved
            })
            .sum()
    }

    /// Make the phase's choices visible to the next phase.
    ///
    /// Copies next into current, adds every staged delta to its community
    /// weight and zeroes the staged deltas. Distinct communities are
    /// distinct slots, so deltas are applied in parallel.
    pub(crate) fn commit(&mut self) -> Result<()> {
        self.current.copy_from_slice(&self.next);

        let staged = &self.staged;
        let community_weights = &self.community_weights;
        (0..self.node_count())
            .into_par_iter()
            .with_min_len(1_024)
            .try_for_each(|community| {
                let delta = staged.get(community);
                if delta != 0.0 {
                    let _ = community_weights.add_exact(community, delta)?;
                }
                Ok::<(), Error>(())
            })?;

        self.staged.clear();
        Ok(())
    }

    /// Modularity of the current assignment.
    ///
    /// ```text
    /// Q = Σ influence / 2W − Σ_c Σ_c² / (2W)²
    /// ```
    ///
    /// A graph without weight has modularity 0.
    pub(crate) fn modularity(&self) -> f64 {
        if self.total_weight <= 0.0 {
            return 0.0;
        }
        let two_w = 2.0 * self.total_weight;

        let internal: f64 = self.influences.par_iter().sum();
        let expected: f64 = (0..self.node_count())
            .into_par_iter()
            .map(|c| self.community_weights.get(c).powi(2))
            .sum();

        internal / two_w - expected / (two_w * two_w)
    }
}
