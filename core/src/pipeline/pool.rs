//! pipeline/pool.rs
//!
//! Persistent worker pool with explicit lifecycle.
//!
//! Design notes:
//! - Built lazily on the first dispatch that needs more than one thread.
//! - A thread-count change rebuilds an existing pool once; calls never spawn
//!   or join threads themselves.
//! - `release` drops the pool and blocks until every worker thread has
//!   exited, observed through rayon's start/exit hooks.

use std::ops::Range;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::types::ChunkError;

/// Count of worker threads currently alive, with a wakeup on change.
#[derive(Debug, Default)]
struct LiveWorkers {
    count: Mutex<usize>,
    changed: Condvar,
}

impl LiveWorkers {
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self) {
        *self.lock() += 1;
        self.changed.notify_all();
    }

    fn leave(&self) {
        let mut count = self.lock();
        *count = count.saturating_sub(1);
        self.changed.notify_all();
    }

    fn get(&self) -> usize {
        *self.lock()
    }

    fn wait_until(&self, mut ready: impl FnMut(usize) -> bool) {
        let guard = self.lock();
        let _guard = self
            .changed
            .wait_while(guard, |count| !ready(*count))
            .unwrap_or_else(PoisonError::into_inner);
    }
}

#[derive(Debug)]
pub struct WorkerPool {
    threads: usize,
    pool: Option<ThreadPool>,
    live: Arc<LiveWorkers>,
    builds: u64,
}

impl WorkerPool {
    /// Pool description for `threads` workers; nothing is spawned yet.
    pub fn new(threads: usize) -> Self {
        Self {
            threads: threads.max(1),
            pool: None,
            live: Arc::new(LiveWorkers::default()),
            builds: 0,
        }
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Whether worker threads currently exist.
    pub fn is_active(&self) -> bool {
        self.pool.is_some()
    }

    /// Worker threads alive right now.
    pub fn live_workers(&self) -> usize {
        self.live.get()
    }

    /// Number of times a pool has been built over this value's lifetime.
    pub fn builds(&self) -> u64 {
        self.builds
    }

    /// Change the worker count. Same value is a no-op; an existing pool is resized.
    pub fn set_threads(&mut self, threads: usize) -> Result<(), ChunkError> {
        if threads == 0 {
            return Err(ChunkError::invalid("thread count must be at least 1"));
        }
        if threads == self.threads {
            return Ok(());
        }

        log::debug!("worker pool resize {} -> {}", self.threads, threads);
        let was_active = self.pool.is_some();
        self.release();
        self.threads = threads;
        if was_active && threads > 1 {
            self.build()?;
        }
        Ok(())
    }

    /// Pool to dispatch on, building it on first use; `None` means run inline.
    pub fn acquire(&mut self) -> Result<Option<&ThreadPool>, ChunkError> {
        if self.threads <= 1 {
            return Ok(None);
        }
        if self.pool.is_none() {
            self.build()?;
        }
        Ok(self.pool.as_ref())
    }

    fn build(&mut self) -> Result<(), ChunkError> {
        let on_start = Arc::clone(&self.live);
        let on_exit = Arc::clone(&self.live);
        let pool = ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|i| format!("shufflepack-worker-{}", i))
            .start_handler(move |_| on_start.enter())
            .exit_handler(move |_| on_exit.leave())
            .build()
            .map_err(|e| ChunkError::ThreadPool(format!("failed to build worker pool: {}", e)))?;

        let threads = self.threads;
        self.live.wait_until(|count| count >= threads);
        self.pool = Some(pool);
        self.builds += 1;
        log::debug!("worker pool built with {} threads", threads);
        Ok(())
    }

    /// Join and discard all workers. The next dispatch rebuilds lazily.
    pub fn release(&mut self) {
        if let Some(pool) = self.pool.take() {
            drop(pool);
            self.live.wait_until(|count| count == 0);
            log::debug!("worker pool released");
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.release();
    }
}

/// Run every task to completion. A single task runs inline without touching
/// the pool; more than one acquires it, building it on first use.
pub(crate) fn run_tasks<F>(pool: &mut WorkerPool, tasks: Vec<F>) -> Result<(), ChunkError>
where
    F: FnOnce() + Send,
{
    if tasks.len() > 1 {
        if let Some(pool) = pool.acquire()? {
            pool.scope(|s| {
                for task in tasks {
                    s.spawn(move |_| task());
                }
            });
            return Ok(());
        }
    }
    tasks.into_iter().for_each(|task| task());
    Ok(())
}

/// Split `0..n` into at most `workers` contiguous, non-empty runs whose
/// lengths differ by at most one.
pub fn partition_runs(n: usize, workers: usize) -> Vec<Range<usize>> {
    if n == 0 {
        return Vec::new();
    }
    let workers = workers.clamp(1, n);
    let base = n / workers;
    let extra = n % workers;

    let mut start = 0;
    (0..workers)
        .map(|k| {
            let len = base + usize::from(k < extra);
            let run = start..start + len;
            start += len;
            run
        })
        .collect()
}
