//! A competing-consumer worker pool.
//!
//! A dispatcher thread feeds items one at a time through a zero-capacity
//! channel, `workers` threads compete to take each item off the shared
//! receiver, and a single collector owns the accumulating output. The channel
//! delivers each item to exactly one worker, so an item's mutable state is
//! only ever touched by the single thread that currently owns it: ownership
//! transfers through the channel, it is never shared.
//!
//! Because workers may finish at different times, completion is detected by
//! counting *results*: the collector takes exactly as many values as were
//! submitted, regardless of which worker produced them. Output order is
//! unspecified.

use crate::channel::{bounded, unbounded};
use std::thread;

/// The errors that can occur when configuring a pool.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum PoolError {
    /// The pool was configured with zero workers. With no consumers on the
    /// job channel the dispatcher could never hand off an item, so this is
    /// rejected before any thread is spawned.
    #[error("number of workers must be at least 1 (got {0})")]
    InvalidWorkerCount(usize),
}

/// A unit of work moved through the pool: an opaque payload plus a
/// `processed` flag flipped by exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Identity of the job, stable across its lifecycle.
    pub id: u64,
    /// Opaque payload; the pool never inspects it.
    pub payload: String,
    /// Whether the job has been through a worker.
    pub processed: bool,
}

impl Job {
    /// Creates an unprocessed job.
    pub fn new(id: u64, payload: impl Into<String>) -> Self {
        Self {
            id,
            payload: payload.into(),
            processed: false,
        }
    }

    /// Marks this job as processed.
    pub fn mark_processed(&mut self) {
        self.processed = true;
    }
}

/// Marks every job as processed, one at a time on the calling thread,
/// preserving input order. The sequential baseline for
/// [`process_concurrently`].
pub fn process_sequential(mut jobs: Vec<Job>) -> Vec<Job> {
    for job in &mut jobs {
        job.mark_processed();
    }
    jobs
}

/// Marks every job as processed using a pool of `workers` threads and
/// returns the full set of processed jobs in an unspecified order.
///
/// Every job submitted appears exactly once in the output with its
/// `processed` flag set; no job is lost or processed twice.
///
/// # Errors
///
/// Returns [`PoolError::InvalidWorkerCount`] if `workers` is zero.
///
/// # Examples
///
/// ```
/// use manifold::pool::{process_concurrently, Job};
///
/// let jobs = vec![Job::new(1, "a"), Job::new(2, "b"), Job::new(3, "c")];
/// let done = process_concurrently(jobs, 2).unwrap();
/// assert_eq!(done.len(), 3);
/// assert!(done.iter().all(|job| job.processed));
/// ```
pub fn process_concurrently(jobs: Vec<Job>, workers: usize) -> Result<Vec<Job>, PoolError> {
    map_pool(jobs, workers, Job::mark_processed)
}

/// The generic pool core: applies `f` to every item, each item visited by
/// exactly one of `workers` threads, and returns all items in an unspecified
/// order.
///
/// Items are handed to workers through a zero-capacity channel, so a slow
/// pool applies backpressure to the dispatcher rather than buffering. All
/// pool threads are joined before this function returns.
///
/// # Errors
///
/// Returns [`PoolError::InvalidWorkerCount`] if `workers` is zero.
pub fn map_pool<T, F>(items: Vec<T>, workers: usize, f: F) -> Result<Vec<T>, PoolError>
where
    T: Send,
    F: Fn(&mut T) + Send + Sync,
{
    if workers == 0 {
        return Err(PoolError::InvalidWorkerCount(0));
    }
    let total = items.len();
    if total == 0 {
        return Ok(Vec::new());
    }
    let (job_tx, job_rx) = bounded::<T>(0);
    let (result_tx, result_rx) = unbounded::<T>();
    let f = &f;
    let output = thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                for mut item in job_rx.iter() {
                    f(&mut item);
                    if result_tx.send(item).is_err() {
                        return;
                    }
                }
            });
        }
        // disconnects must be driven by thread exits alone; the collector
        // keeps no spare channel ends
        drop(job_rx);
        drop(result_tx);
        scope.spawn(move || {
            for item in items {
                if job_tx.send(item).is_err() {
                    return;
                }
            }
        });
        // count results, not worker exits: exactly one per submitted item
        result_rx.iter().take(total).collect()
    });
    Ok(output)
}

/// Configures a pool, defaulting the worker count to the number of available
/// CPU cores.
///
/// # Examples
///
/// ```
/// use manifold::pool::{Job, PoolBuilder};
///
/// let done = PoolBuilder::new()
///     .num_workers(4)
///     .process(vec![Job::new(1, "a")])
///     .unwrap();
/// assert!(done[0].processed);
/// ```
#[derive(Clone, Debug, Default)]
pub struct PoolBuilder {
    num_workers: Option<usize>,
}

impl PoolBuilder {
    /// Creates a builder with no explicit worker count; `process` will use
    /// one worker per available CPU core.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of worker threads.
    pub fn num_workers(mut self, num_workers: usize) -> Self {
        self.num_workers = Some(num_workers);
        self
    }

    /// Runs the pool over `jobs`.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidWorkerCount`] if the builder was
    /// explicitly configured with zero workers.
    pub fn process(self, jobs: Vec<Job>) -> Result<Vec<Job>, PoolError> {
        process_concurrently(jobs, self.num_workers.unwrap_or_else(num_cpus::get))
    }
}
