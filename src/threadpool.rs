//! Worker pool driving the parallel block pipeline.
//!
//! A thin scoped wrapper over a dedicated `rayon::ThreadPool`. Each encode or
//! decode call builds its own pool so worker threads never outlive the
//! operation, and `scope` keeps the producer on the calling thread while
//! block tasks run on the pool. Tasks spawned from the producer enter rayon's
//! injector queue in submission order, which the block pipeline relies on
//! together with the per-block completion gates.

use rayon::{Scope, ThreadPool};

/// Returns the number of logical CPU cores available to the current process.
///
/// Delegates to [`std::thread::available_parallelism`], which honours
/// OS-level CPU affinity masks where supported. Returns at least `1` so
/// callers never build a zero-sized pool.
pub fn count_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Fixed-size worker pool for block tasks.
pub struct WorkerPool {
    pool: ThreadPool,
}

impl WorkerPool {
    /// Builds a pool of exactly `nb_threads` workers. Returns `None` when
    /// `nb_threads` is zero or the underlying pool cannot be created.
    pub fn new(nb_threads: usize) -> Option<Self> {
        if nb_threads < 1 {
            return None;
        }
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(nb_threads)
            .build()
            .ok()?;
        Some(WorkerPool { pool })
    }

    /// Runs `op` on the calling thread with a scope whose spawned tasks
    /// execute on the pool. Returns once `op` and every spawned task have
    /// finished, so the scope exit doubles as the pipeline drain.
    pub fn scope<'scope, OP, R>(&self, op: OP) -> R
    where
        OP: FnOnce(&Scope<'scope>) -> R,
    {
        self.pool.in_place_scope(op)
    }

    /// Number of worker threads in the pool.
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}
