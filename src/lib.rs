//! # colormod
//!
//! Parallel modularity optimization for community detection, made safe by
//! graph coloring instead of locks.
//!
//! Nodes of one color are never adjacent, so a whole color class can pick
//! new communities at once. Community weights live in a lock-free
//! fixed-point accumulator and are only updated between color phases.
//!
//! - [`modularity`]: the optimizer, its configuration, seeding and result.
//! - [`coloring`]: coloring providers (greedy and parallel K1).
//! - [`atomic`]: fixed-point atomic `f64` array.
//! - [`graph`]: the graph contract, implemented for `petgraph` graphs.
//!
//! Logging goes through the `log` facade; install any logger (e.g.
//! `env_logger`) to see progress.

pub mod atomic;
pub mod coloring;
/// Error types used across `colormod`.
pub mod error;
pub mod graph;
pub mod modularity;
pub mod parallel;
pub mod progress;

pub use atomic::AtomicDoubleArray;
pub use coloring::{Coloring, ColoringProvider, GreedyColoring, K1Coloring};
pub use error::{Error, Result};
pub use graph::{Direction, RelationshipGraph, RelationshipWeight};
pub use modularity::{
    optimize, CommunityDetection, ModularityOptimization, ModularityOptimizationConfig,
    ModularityOptimizationResult, SeedProperty,
};
pub use progress::{ProgressLogger, TerminationFlag};
