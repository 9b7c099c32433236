//! Outcome of a finished optimization run.

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Final partition and convergence statistics.
///
/// Community ids are reported in the label space of the run: seed labels
/// (or synthetic labels of unseeded nodes) for seeded runs, internal
/// community ids otherwise.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModularityOptimizationResult {
    communities: Vec<u64>,
    modularity: f64,
    iterations: usize,
    did_converge: bool,
    tolerance: f64,
}

impl ModularityOptimizationResult {
    pub(crate) fn new(
        communities: Vec<u64>,
        modularity: f64,
        iterations: usize,
        did_converge: bool,
        tolerance: f64,
    ) -> Self {
        Self {
            communities,
            modularity,
            iterations,
            did_converge,
            tolerance,
        }
    }

    /// Community of `node`.
    ///
    /// # Panics
    ///
    /// If `node` is not a node of the optimized graph.
    pub fn community_of(&self, node: usize) -> u64 {
        self.communities[node]
    }

    /// Community of every node, indexed by node id.
    pub fn communities(&self) -> &[u64] {
        &self.communities
    }

    /// Number of distinct communities.
    pub fn community_count(&self) -> usize {
        let mut ids = self.communities.clone();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// Communities renumbered to `0..community_count()`, in ascending
    /// order of the reported ids.
    pub fn dense_communities(&self) -> Vec<usize> {
        let mut unique = self.communities.clone();
        unique.sort_unstable();
        unique.dedup();

        let mapping: HashMap<u64, usize> = unique
            .into_iter()
            .enumerate()
            .map(|(new, old)| (old, new))
            .collect();

        self.communities
            .iter()
            .map(|c| mapping.get(c).copied().unwrap_or(0))
            .collect()
    }

    /// Modularity of the final partition.
    pub fn modularity(&self) -> f64 {
        self.modularity
    }

    /// Number of iterations run, including the one that detected convergence.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Whether modularity stopped improving before the iteration limit.
    pub fn did_converge(&self) -> bool {
        self.did_converge
    }

    /// Tolerance the run was configured with.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        let result = ModularityOptimizationResult::new(vec![100, 100, 200], 0.25, 3, true, 1e-4);
        assert_eq!(result.community_of(2), 200);
        assert_eq!(result.communities(), &[100, 100, 200]);
        assert_eq!(result.community_count(), 2);
        assert_eq!(result.modularity(), 0.25);
        assert_eq!(result.iterations(), 3);
        assert!(result.did_converge());
        assert_eq!(result.tolerance(), 1e-4);
    }

    #[test]
    fn test_dense_communities() {
        let result = ModularityOptimizationResult::new(vec![7, 3, 7, 42, 3], 0.0, 1, false, 0.0);
        assert_eq!(result.dense_communities(), vec![1, 0, 1, 2, 0]);
    }
}
