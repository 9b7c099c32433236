use thiserror::Error;

/// Result alias for `colormod`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the accumulator, coloring and optimization primitives.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Invalid parameter value.
    #[error("invalid parameter '{name}': {message}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: String,
    },

    /// A per-node input does not cover the graph.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch {
        /// Expected length (the node count).
        expected: usize,
        /// Found length.
        found: usize,
    },

    /// Two adjacent nodes share a color.
    #[error("invalid coloring: nodes {node} and {neighbor} are adjacent but share color {color}")]
    InvalidColoring {
        /// Node being checked.
        node: usize,
        /// Adjacent node with the same color.
        neighbor: usize,
        /// The shared color.
        color: usize,
    },

    /// A checked fixed-point addition left the representable range.
    ///
    /// Usually means the accumulator scale is too large for the graph's
    /// total edge weight.
    #[error("fixed-point overflow at slot {index}: {current} + {delta} is not representable")]
    Overflow {
        /// Slot that overflowed.
        index: usize,
        /// Value stored before the addition.
        current: f64,
        /// Delta that was added.
        delta: f64,
    },

    /// The run observed a termination request.
    #[error("computation was cancelled")]
    Cancelled,

    /// The initialization pass produced no result.
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// The worker pool could not be created.
    #[error("worker pool: {0}")]
    WorkerPool(String),
}

impl Error {
    pub(crate) fn invalid(name: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            message: message.into(),
        }
    }
}
