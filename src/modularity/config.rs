//! Optimizer configuration.

use crate::atomic::AtomicDoubleArray;
use crate::error::{Error, Result};
use crate::graph::Direction;
use crate::parallel::default_concurrency;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Parameters of one modularity optimization run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ModularityOptimizationConfig {
    /// Upper bound on color sweeps.
    max_iterations: usize,
    /// Minimum modularity improvement to keep iterating.
    tolerance: f64,
    /// Relationships considered adjacent.
    direction: Direction,
    /// Worker threads.
    concurrency: usize,
    /// Smallest node batch per task.
    min_batch_size: usize,
    /// Fixed-point scale of the community weight accumulators.
    scale: f64,
    /// Iteration budget passed to the coloring provider.
    coloring_iterations: usize,
}

impl ModularityOptimizationConfig {
    /// Default number of sweeps.
    pub const DEFAULT_MAX_ITERATIONS: usize = 10;
    /// Default convergence tolerance.
    pub const DEFAULT_TOLERANCE: f64 = 1e-4;
    /// Default smallest node batch per task.
    pub const DEFAULT_MIN_BATCH_SIZE: usize = 10_000;
    /// Default coloring budget.
    pub const DEFAULT_COLORING_ITERATIONS: usize = 5;

    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self {
            max_iterations: Self::DEFAULT_MAX_ITERATIONS,
            tolerance: Self::DEFAULT_TOLERANCE,
            direction: Direction::Both,
            concurrency: default_concurrency(),
            min_batch_size: Self::DEFAULT_MIN_BATCH_SIZE,
            scale: AtomicDoubleArray::DEFAULT_SCALE,
            coloring_iterations: Self::DEFAULT_COLORING_ITERATIONS,
        }
    }

    /// Set maximum number of sweeps over all colors.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set convergence tolerance.
    ///
    /// The run stops once modularity improves by no more than this.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set traversal direction.
    pub fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Set number of worker threads.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set smallest node batch handed to one task.
    pub fn with_min_batch_size(mut self, min_batch_size: usize) -> Self {
        self.min_batch_size = min_batch_size;
        self
    }

    /// Set fixed-point scale for community weights.
    ///
    /// `1 / scale` should stay well below the tolerance, and the total
    /// graph weight below `i64::MAX / scale`.
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Set iteration budget of the coloring provider.
    pub fn with_coloring_iterations(mut self, coloring_iterations: usize) -> Self {
        self.coloring_iterations = coloring_iterations;
        self
    }

    /// Maximum number of sweeps.
    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    /// Convergence tolerance.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Traversal direction.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Number of worker threads.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Smallest node batch per task.
    pub fn min_batch_size(&self) -> usize {
        self.min_batch_size
    }

    /// Fixed-point scale.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Coloring iteration budget.
    pub fn coloring_iterations(&self) -> usize {
        self.coloring_iterations
    }

    /// Reject settings no run could succeed with.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations < 1 {
            return Err(Error::invalid(
                "max_iterations",
                format!(
                    "need to run at least one iteration, but got {}",
                    self.max_iterations
                ),
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(Error::invalid(
                "tolerance",
                format!("must be finite and non-negative, got {}", self.tolerance),
            ));
        }
        if self.concurrency < 1 {
            return Err(Error::invalid("concurrency", "must be at least 1"));
        }
        if self.min_batch_size < 1 {
            return Err(Error::invalid("min_batch_size", "must be at least 1"));
        }
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(Error::invalid(
                "scale",
                format!("must be positive and finite, got {}", self.scale),
            ));
        }
        Ok(())
    }
}

impl Default for ModularityOptimizationConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ModularityOptimizationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_iterations(), 10);
        assert_eq!(config.direction(), Direction::Both);
        assert!(config.concurrency() >= 1);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let err = ModularityOptimizationConfig::new()
            .with_max_iterations(0)
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidParameter {
                name: "max_iterations",
                ..
            }
        ));
        assert!(err.to_string().contains("at least one iteration"));
    }

    #[test]
    fn test_bad_values_rejected() {
        let base = ModularityOptimizationConfig::new();
        assert!(base.clone().with_tolerance(-1.0).validate().is_err());
        assert!(base.clone().with_tolerance(f64::NAN).validate().is_err());
        assert!(base.clone().with_concurrency(0).validate().is_err());
        assert!(base.clone().with_min_batch_size(0).validate().is_err());
        assert!(base.clone().with_scale(0.0).validate().is_err());
        assert!(base.with_tolerance(0.0).validate().is_ok());
    }
}
