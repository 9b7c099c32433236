//! Worker pool and batch partitioning.
//!
//! Node ranges are split into contiguous batches, one task per batch. A batch
//! is never smaller than a configured minimum and there are at most as many
//! batches as needed to give each worker one.

use crate::error::{Error, Result};
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Number of workers when none is configured.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism().map_or(1, |n| n.get())
}

/// Batch size giving each of `concurrency` workers one batch, but never
/// below `min_batch_size` nor above `node_count` (or 1 for empty input).
pub fn adjusted_batch_size(node_count: usize, concurrency: usize, min_batch_size: usize) -> usize {
    let per_worker = node_count.div_ceil(concurrency.max(1));
    per_worker.max(min_batch_size).min(node_count).max(1)
}

/// A dedicated pool of `concurrency` workers.
pub fn worker_pool(concurrency: usize) -> Result<ThreadPool> {
    ThreadPoolBuilder::new()
        .num_threads(concurrency)
        .thread_name(|i| format!("colormod-worker-{i}"))
        .build()
        .map_err(|e| Error::WorkerPool(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjusted_batch_size() {
        assert_eq!(adjusted_batch_size(100, 4, 1), 25);
        assert_eq!(adjusted_batch_size(101, 4, 1), 26);
        assert_eq!(adjusted_batch_size(100, 4, 50), 50);
        assert_eq!(adjusted_batch_size(10, 4, 10_000), 10);
        assert_eq!(adjusted_batch_size(0, 4, 10), 1);
        assert_eq!(adjusted_batch_size(7, 0, 1), 7);
    }

    #[test]
    fn test_worker_pool_size() {
        let pool = worker_pool(3).unwrap();
        assert_eq!(pool.current_num_threads(), 3);
        assert!(default_concurrency() >= 1);
    }
}
