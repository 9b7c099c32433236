//! Optimization controller.
//!
//! Drives one run through its states:
//!
//! ```text
//! Initializing → ColorSweep(iteration, color) → ModularityCheck(iteration)
//!                      ↑__________________________________|
//!                                                         ↓
//!                                  Converged | IterationLimitReached
//! ```
//!
//! The coloring is requested once. Every iteration sweeps the colors in
//! ascending order; each color phase runs its tasks in parallel, waits for
//! all of them and commits the staged deltas before the next color starts.

use super::config::ModularityOptimizationConfig;
use super::result::ModularityOptimizationResult;
use super::seed::{SeedMapping, SeedProperty};
use super::state::RunContext;
use crate::coloring::{ColoringProvider, K1Coloring};
use crate::error::{Error, Result};
use crate::graph::RelationshipGraph;
use crate::parallel::{adjusted_batch_size, worker_pool};
use crate::progress::{ProgressLogger, TerminationFlag};
use log::{debug, info, warn};
use std::time::Instant;

/// Modularity before the first iteration. Any real partition improves on it.
const INITIAL_MODULARITY: f64 = -1.0;

/// Parallel modularity optimization over a coloring.
///
/// `C` supplies the coloring; the default [`K1Coloring`] is the parallel
/// provider, [`GreedyColoring`](crate::coloring::GreedyColoring) or a
/// precomputed [`Coloring`](crate::coloring::Coloring) work as well.
#[derive(Debug, Clone)]
pub struct ModularityOptimization<C = K1Coloring> {
    config: ModularityOptimizationConfig,
    coloring: C,
    termination: TerminationFlag,
}

impl ModularityOptimization<K1Coloring> {
    /// Create an optimizer using K1 coloring.
    pub fn new(config: ModularityOptimizationConfig) -> Self {
        Self {
            config,
            coloring: K1Coloring::new(),
            termination: TerminationFlag::new(),
        }
    }
}

impl Default for ModularityOptimization<K1Coloring> {
    fn default() -> Self {
        Self::new(ModularityOptimizationConfig::default())
    }
}

impl<C: ColoringProvider + Sync> ModularityOptimization<C> {
    /// Use a different coloring provider.
    pub fn with_coloring<D: ColoringProvider + Sync>(self, coloring: D) -> ModularityOptimization<D> {
        ModularityOptimization {
            config: self.config,
            coloring,
            termination: self.termination,
        }
    }

    /// Observe `termination` between color phases.
    pub fn with_termination_flag(mut self, termination: TerminationFlag) -> Self {
        self.termination = termination;
        self
    }

    /// The run configuration.
    pub fn config(&self) -> &ModularityOptimizationConfig {
        &self.config
    }

    /// Flag that cancels running computations of this optimizer.
    pub fn termination_flag(&self) -> &TerminationFlag {
        &self.termination
    }

    /// Optimize starting from one community per node.
    ///
    /// Reported community ids are internal ids in `0..node_count`.
    pub fn compute<G: RelationshipGraph>(&self, graph: &G) -> Result<ModularityOptimizationResult> {
        self.run::<G, [Option<i64>]>(graph, None)
    }

    /// Optimize starting from seed communities.
    ///
    /// Reported community ids are seed labels; nodes without a seed report
    /// their synthetic label `original_id + max_seed + 1` unless they joined
    /// a seeded community.
    pub fn compute_seeded<G, S>(&self, graph: &G, seeds: &S) -> Result<ModularityOptimizationResult>
    where
        G: RelationshipGraph,
        S: SeedProperty + ?Sized,
    {
        self.run(graph, Some(seeds))
    }

    fn run<G, S>(&self, graph: &G, seeds: Option<&S>) -> Result<ModularityOptimizationResult>
    where
        G: RelationshipGraph,
        S: SeedProperty + ?Sized,
    {
        self.config.validate()?;

        let resolution = 1.0 / self.config.scale();
        if self.config.tolerance() > 0.0 && resolution > self.config.tolerance() {
            warn!(
                "Accumulator resolution {resolution:e} is coarser than tolerance {:e}",
                self.config.tolerance()
            );
        }

        let pool = worker_pool(self.config.concurrency())?;
        pool.install(|| self.execute(graph, seeds))
    }

    fn execute<G, S>(&self, graph: &G, seeds: Option<&S>) -> Result<ModularityOptimizationResult>
    where
        G: RelationshipGraph,
        S: SeedProperty + ?Sized,
    {
        let n = graph.node_count();
        let direction = self.config.direction();
        let tolerance = self.config.tolerance();
        let batch_size =
            adjusted_batch_size(n, self.config.concurrency(), self.config.min_batch_size());
        let progress = ProgressLogger::new("ModularityOptimization", n);

        let start = Instant::now();
        let coloring = self.coloring.color_batched(
            graph,
            direction,
            self.config.coloring_iterations(),
            batch_size,
        )?;
        if coloring.len() != n {
            return Err(Error::DimensionMismatch {
                expected: n,
                found: coloring.len(),
            });
        }
        let seeding = seeds.map(|s| SeedMapping::build(graph, s)).transpose()?;
        if let Some(seeding) = &seeding {
            debug!("Seeded {n} nodes into {} communities", seeding.label_count());
        }
        let mut ctx = RunContext::initialize(
            graph,
            direction,
            seeding.as_ref().map(SeedMapping::initial_communities),
            self.config.scale(),
            batch_size,
            &progress,
        )?;
        info!(
            "Modularity Optimization - Initialization finished after {}ms",
            start.elapsed().as_millis()
        );
        debug!(
            "{n} nodes, {} colors, batch size {batch_size}, total weight {}",
            coloring.color_count(),
            ctx.total_weight
        );

        let mut modularity = INITIAL_MODULARITY;
        let mut iterations = 0;
        let mut did_converge = false;
        while iterations < self.config.max_iterations() {
            let start = Instant::now();
            ctx.reset_influences();
            progress.reset(n * coloring.color_count());

            for color in coloring.used_colors() {
                self.termination.assert_running()?;
                let moved = ctx.sweep_color(graph, direction, &coloring, color, batch_size, &progress);
                ctx.commit()?;
                debug!("Iteration {} color {color}: {moved} nodes moved", iterations + 1);
            }

            let previous = modularity;
            modularity = ctx.modularity();
            iterations += 1;
            info!(
                "Modularity Optimization - Iteration {iterations} finished after {}ms (modularity {modularity:.6})",
                start.elapsed().as_millis()
            );

            if !(modularity > previous && (modularity - previous).abs() > tolerance) {
                did_converge = true;
                break;
            }
        }
        info!("Modularity Optimization - Finished");

        let communities = match &seeding {
            Some(seeding) => ctx.current.iter().map(|&c| seeding.label(c)).collect(),
            None => ctx.current.iter().map(|&c| c as u64).collect(),
        };
        Ok(ModularityOptimizationResult::new(
            communities,
            modularity,
            iterations,
            did_converge,
            tolerance,
        ))
    }
}

/// Optimize `graph` with K1 coloring and `config`.
pub fn optimize<G: RelationshipGraph>(
    graph: &G,
    config: ModularityOptimizationConfig,
) -> Result<ModularityOptimizationResult> {
    ModularityOptimization::new(config).compute(graph)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coloring::{Coloring, GreedyColoring};
    use petgraph::graph::UnGraph;

    fn config() -> ModularityOptimizationConfig {
        ModularityOptimizationConfig::new()
            .with_concurrency(2)
            .with_min_batch_size(1)
    }

    /// Two triangles joined by one weak edge 2-3.
    fn two_triangles() -> UnGraph<(), f64> {
        let mut graph = UnGraph::<(), f64>::new_undirected();
        let n: Vec<_> = (0..6).map(|_| graph.add_node(())).collect();
        for &(a, b) in &[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5)] {
            let _ = graph.add_edge(n[a], n[b], 1.0);
        }
        let _ = graph.add_edge(n[2], n[3], 0.1);
        graph
    }

    #[test]
    fn test_two_triangles() {
        let result = optimize(&two_triangles(), config()).unwrap();
        let c = result.communities();
        assert_eq!(c[0], c[1]);
        assert_eq!(c[1], c[2]);
        assert_eq!(c[3], c[4]);
        assert_eq!(c[4], c[5]);
        assert_ne!(c[0], c[3]);
        assert_eq!(result.community_count(), 2);
        assert!(result.did_converge());
        assert!(result.modularity() > 0.4);
    }

    #[test]
    fn test_zero_iterations_fail_before_work() {
        let flag = TerminationFlag::new();
        flag.terminate();
        // Configuration errors win over cancellation: nothing ran.
        let err = ModularityOptimization::new(config().with_max_iterations(0))
            .with_termination_flag(flag)
            .compute(&two_triangles())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidParameter {
                name: "max_iterations",
                ..
            }
        ));
    }

    #[test]
    fn test_cancelled_before_first_phase() {
        let flag = TerminationFlag::new();
        flag.terminate();
        let err = ModularityOptimization::new(config())
            .with_termination_flag(flag)
            .compute(&two_triangles())
            .unwrap_err();
        assert_eq!(err, Error::Cancelled);
    }

    #[test]
    fn test_iteration_limit() {
        let result = optimize(&two_triangles(), config().with_max_iterations(1)).unwrap();
        assert_eq!(result.iterations(), 1);
        assert!(!result.did_converge());
    }

    #[test]
    fn test_empty_graph_fails_initialization() {
        let graph = UnGraph::<(), f64>::new_undirected();
        let err = optimize(&graph, config()).unwrap_err();
        assert!(matches!(err, Error::Initialization(_)));
    }

    #[test]
    fn test_weightless_graph_converges() {
        let mut graph = UnGraph::<(), f64>::new_undirected();
        for _ in 0..3 {
            let _ = graph.add_node(());
        }
        let result = optimize(&graph, config()).unwrap();
        assert_eq!(result.communities(), &[0, 1, 2]);
        assert_eq!(result.modularity(), 0.0);
        assert!(result.did_converge());
        assert_eq!(result.iterations(), 2);
    }

    #[test]
    fn test_precomputed_coloring_is_checked() {
        let graph = two_triangles();
        let err = ModularityOptimization::new(config())
            .with_coloring(Coloring::new(vec![0; 6]))
            .compute(&graph)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidColoring { .. }));

        let err = ModularityOptimization::new(config())
            .with_coloring(Coloring::distinct(5))
            .compute(&graph)
            .unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { .. }));
    }

    #[test]
    fn test_providers_agree_on_clear_structure() {
        let graph = two_triangles();
        let k1 = optimize(&graph, config()).unwrap();
        let greedy = ModularityOptimization::new(config())
            .with_coloring(GreedyColoring::new())
            .compute(&graph)
            .unwrap();
        assert_eq!(k1.dense_communities(), greedy.dense_communities());
        assert!((k1.modularity() - greedy.modularity()).abs() < 1e-9);
    }
}
