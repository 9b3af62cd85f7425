//! Bounded worker pool for per-entity lookups
//!
//! Collectors issue one or more provider calls per user or key. Those calls
//! are independent, so they run on a small dedicated pool. Results always come
//! back in input order, and when several items fail the error reported is the
//! one for the earliest item, so a run is reproducible whatever the scheduling.
//!
//! Once an item fails, items after it are skipped. Items before it still run,
//! since one of them may fail too and take precedence.

use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;

/// Fixed-size pool shared by the collectors of one run
pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    /// Create a pool with `workers` threads (at least one)
    pub fn new(workers: usize) -> Result<Self, rayon::ThreadPoolBuildError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(workers.max(1))
            .thread_name(|index| format!("audit-worker-{}", index))
            .build()?;
        Ok(Self { pool })
    }

    /// Number of worker threads
    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Apply `f` to every item, returning results in input order
    pub fn map_ordered<T, R, E, F>(&self, items: &[T], f: F) -> Result<Vec<R>, E>
    where
        T: Sync,
        R: Send,
        E: Send,
        F: Fn(&T) -> Result<R, E> + Sync + Send,
    {
        let first_failure = AtomicUsize::new(usize::MAX);

        let results: Vec<Option<Result<R, E>>> = self.pool.install(|| {
            items
                .par_iter()
                .enumerate()
                .map(|(index, item)| {
                    if index > first_failure.load(Ordering::Relaxed) {
                        return None;
                    }
                    let result = f(item);
                    if result.is_err() {
                        first_failure.fetch_min(index, Ordering::Relaxed);
                    }
                    Some(result)
                })
                .collect()
        });

        // Skipped items all sit after a failure, which collect() stops at
        results.into_iter().flatten().collect()
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers())
            .finish()
    }
}

#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::panic
)]
