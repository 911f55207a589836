//! Supervised pool for detached work.
//!
//! Parallel handlers and the outgoing self-edit run here instead of on bare
//! `tokio::spawn`, so the number of in-flight jobs is bounded and shutdown
//! can drain what is queued before the process exits.
//!
//! Delayed jobs wait on a timer task, not on a worker, and only enter the
//! queue once the delay has passed.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

struct Job {
    label: &'static str,
    future: BoxFuture<'static, ()>,
}

/// Outcome of [`TaskPool::shutdown`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Every queued and running job finished within the grace period.
    pub drained: bool,
    /// Workers aborted with a job still running.
    pub aborted_workers: usize,
    /// Delayed jobs cancelled before they reached the queue.
    pub cancelled_delayed: usize,
}

/// Fixed set of workers consuming a bounded job queue.
///
/// Cloning is cheap; clones submit to the same queue.
#[derive(Clone)]
pub struct TaskPool {
    inner: Arc<Inner>,
}

struct Inner {
    sender: RwLock<Option<mpsc::Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    timers: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskPool {
    /// Start `workers` workers over a queue of `capacity` jobs.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(workers: usize, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel::<Job>(capacity.max(1));
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let handles = (0..workers.max(1))
            .map(|id| tokio::spawn(worker_loop(id, Arc::clone(&rx))))
            .collect();

        Self {
            inner: Arc::new(Inner {
                sender: RwLock::new(Some(tx)),
                workers: Mutex::new(handles),
                timers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Queue a job without waiting.
    ///
    /// Returns `false` when the queue is full or the pool is shutting down;
    /// the job is dropped and a warning logged.
    pub fn submit<F>(&self, label: &'static str, future: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let guard = self.inner.sender.read();
        let Some(sender) = guard.as_ref() else {
            warn!(task = label, "Task pool is shut down, dropping job");
            return false;
        };

        match sender.try_send(Job {
            label,
            future: future.boxed(),
        }) {
            Ok(()) => true,
            Err(TrySendError::Full(job)) => {
                warn!(task = job.label, "Task queue full, dropping job");
                false
            }
            Err(TrySendError::Closed(job)) => {
                warn!(task = job.label, "Task queue closed, dropping job");
                false
            }
        }
    }

    /// Queue a job once `delay` has passed.
    ///
    /// The wait happens on a timer task, so pending delayed jobs do not
    /// occupy workers. When the delay fires the timer waits for queue space
    /// instead of dropping the job. Returns `false` only when the pool is
    /// already shutting down.
    pub fn submit_after<F>(&self, label: &'static str, delay: Duration, future: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        // Each timer holds its own sender, so the queue stays open for it
        // until the job has been handed over
        let Some(sender) = self.inner.sender.read().clone() else {
            warn!(task = label, "Task pool is shut down, dropping delayed job");
            return false;
        };

        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let job = Job {
                label,
                future: future.boxed(),
            };
            if sender.send(job).await.is_err() {
                warn!(task = label, "Task queue closed, dropping delayed job");
            }
        });

        let mut timers = self.inner.timers.lock();
        timers.retain(|t| !t.is_finished());
        timers.push(timer);
        true
    }

    /// Stop accepting jobs, let workers drain the queue (including delayed
    /// jobs still waiting on their timer) for up to `grace`, then abort
    /// whatever is still pending or running.
    pub async fn shutdown(&self, grace: Duration) -> ShutdownReport {
        // The queue closes once this and every timer's sender are gone
        drop(self.inner.sender.write().take());

        let mut handles = std::mem::take(&mut *self.inner.workers.lock());
        let timers = std::mem::take(&mut *self.inner.timers.lock());
        let drained = tokio::time::timeout(grace, join_all(handles.iter_mut()))
            .await
            .is_ok();

        let mut aborted_workers = 0;
        let mut cancelled_delayed = 0;
        if !drained {
            for timer in timers.iter().filter(|t| !t.is_finished()) {
                timer.abort();
                cancelled_delayed += 1;
            }
            for handle in handles.iter().filter(|h| !h.is_finished()) {
                handle.abort();
                aborted_workers += 1;
            }
            warn!(
                aborted_workers,
                cancelled_delayed, "Task pool did not drain in time, aborting jobs"
            );
        } else {
            info!("Task pool drained");
        }

        ShutdownReport {
            drained,
            aborted_workers,
            cancelled_delayed,
        }
    }
}

async fn worker_loop(id: usize, rx: Arc<tokio::sync::Mutex<mpsc::Receiver<Job>>>) {
    loop {
        let next = rx.lock().await.recv().await;
        let Some(job) = next else {
            debug!(worker = id, "Task queue closed, worker exiting");
            return;
        };

        debug!(worker = id, task = job.label, "Running job");
        if AssertUnwindSafe(job.future).catch_unwind().await.is_err() {
            error!(worker = id, task = job.label, "Job panicked");
        }
    }
}
