//! Parallel modularity optimization.
//!
//! Improves a partition by moving single nodes to the neighboring
//! community with the largest modularity gain, many nodes at a time.
//!
//! ## Modularity
//!
//! For total graph weight `W`, node weights `k_i` and community weights
//! `Σ_c` (the summed weight of all members):
//!
//! ```text
//! Q = (1 / 2W) Σ_ij [A_ij − k_i k_j / 2W] δ(c_i, c_j)
//!   = Σ internal / 2W − Σ_c Σ_c² / (2W)²
//! ```
//!
//! ## The Algorithm (Lu, Halappanavar, Kalyanaraman 2015)
//!
//! Sequential Louvain moves one node after another, each decision seeing
//! every earlier one. Running the moves in parallel naively lets adjacent
//! nodes swap into each other's communities at once and oscillate forever.
//!
//! 1. **Coloring**: partition nodes into independent sets. Nodes of one
//!    color share no relationship, so they can decide simultaneously.
//! 2. **Color phases**: for each color in ascending order, all its nodes
//!    pick their best community in parallel from a stable snapshot of the
//!    community weights. Weight changes are staged and committed after the
//!    phase, so later colors see earlier colors' moves.
//! 3. **Convergence**: after all colors, compute `Q`. Stop once it no
//!    longer improves by more than the tolerance, or after the iteration
//!    limit.
//!
//! Unlike Louvain there is no aggregation phase: the result is a single
//! level partition of the input nodes.
//!
//! ## Usage
//!
//! ```rust
//! use colormod::modularity::{optimize, ModularityOptimizationConfig};
//! use petgraph::graph::UnGraph;
//!
//! let mut graph = UnGraph::<(), f64>::new_undirected();
//! let n: Vec<_> = (0..4).map(|_| graph.add_node(())).collect();
//! graph.add_edge(n[0], n[1], 1.0);
//! graph.add_edge(n[2], n[3], 1.0);
//!
//! let result = optimize(&graph, ModularityOptimizationConfig::new()).unwrap();
//! assert_eq!(result.community_of(0), result.community_of(1));
//! assert_ne!(result.community_of(1), result.community_of(2));
//! assert!((result.modularity() - 0.5).abs() < 1e-9);
//! ```
//!
//! ## References
//!
//! Lu, Halappanavar, Kalyanaraman (2015). "Parallel heuristics for scalable
//! community detection." Parallel Computing 47, 19-37.
//!
//! Blondel et al. (2008). "Fast unfolding of communities in large networks."
//! Journal of Statistical Mechanics: Theory and Experiment, P10008.

mod config;
mod optimizer;
mod result;
mod seed;
mod state;
mod task;
mod traits;

pub use config::ModularityOptimizationConfig;
pub use optimizer::{optimize, ModularityOptimization};
pub use result::ModularityOptimizationResult;
pub use seed::SeedProperty;
pub use traits::CommunityDetection;
