//! Bounded scheduler for concurrent coaching runs.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

/// Default number of runs allowed in flight.
pub const DEFAULT_MAX_CONCURRENCY: usize = 2;

/// Maximum number of concurrent runs.
#[derive(Debug, Clone, Copy)]
pub struct SchedulerConfig {
    max_concurrency: NonZeroUsize,
}

impl SchedulerConfig {
    /// Creates a new configuration with the supplied concurrency limit.
    #[must_use]
    pub const fn new(max_concurrency: NonZeroUsize) -> Self {
        Self { max_concurrency }
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub const fn max_concurrency(self) -> NonZeroUsize {
        self.max_concurrency
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new(NonZeroUsize::MIN.saturating_add(DEFAULT_MAX_CONCURRENCY - 1))
    }
}

/// Wrapper around `tokio::spawn` that caps how many tasks run at once.
///
/// [`TaskScheduler::spawn`] waits for a free slot before spawning, so a
/// caller submitting work faster than it completes is slowed down instead of
/// queueing unbounded tasks. Spawned tasks are tracked so
/// [`TaskScheduler::shutdown`] can wait for them.
#[derive(Debug, Clone)]
pub struct TaskScheduler {
    semaphore: Arc<Semaphore>,
    tracker: TaskTracker,
    config: SchedulerConfig,
}

impl TaskScheduler {
    /// Constructs a scheduler using the provided configuration.
    #[must_use]
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_concurrency().get())),
            tracker: TaskTracker::new(),
            config,
        }
    }

    /// Returns the associated configuration.
    #[must_use]
    pub const fn config(&self) -> SchedulerConfig {
        self.config
    }

    /// Returns `true` if the scheduler has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.semaphore.is_closed()
    }

    /// Closes the scheduler. Running tasks finish; new submissions fail.
    pub fn close(&self) {
        self.semaphore.close();
        self.tracker.close();
    }

    /// Closes the scheduler and waits until every spawned task has finished.
    pub async fn shutdown(&self) {
        self.close();
        self.tracker.wait().await;
    }

    /// Waits for a free slot, then spawns `future` holding it until done.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Closed`] when the scheduler is closed before
    /// a slot becomes available.
    pub async fn spawn<F, T>(&self, future: F) -> SchedulerResult<JoinHandle<T>>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|_| SchedulerError::Closed)?;

        Ok(self.tracker.spawn(async move {
            let output = future.await;
            drop(permit);
            output
        }))
    }
}

impl Default for TaskScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

/// Errors produced by the scheduler.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// Scheduler is closed and will not accept new tasks.
    #[error("scheduler closed")]
    Closed,
}

/// Result alias for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;
