//! Retrying thread loop - bounded retry on top of a [`ThreadLoop`].
//!
//! One job runs until its first success or until its attempt budget is
//! spent. Failures the job's predicate does not mark as retryable end the run
//! immediately and are returned unchanged. Retryable failures are collected
//! (de-duplicated by message) and reported together once the budget runs out.

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;

use crate::config::RetrySettings;
use crate::error::{ClipshiftError, Result};

use super::cancel::CancellationSignal;
use super::thread_loop::ThreadLoop;

/// Asynchronous unit of work run by a [`RetryingJob`]
pub type JobAction = Arc<dyn Fn() -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// Decides whether a failure may be retried
pub type RetryPredicate = Arc<dyn Fn(&ClipshiftError) -> bool + Send + Sync>;

/// Description of one job handed to [`RetryingThreadLoop::start`].
#[derive(Clone)]
pub struct RetryingJob {
    /// Work to run; `start` rejects a job without one
    pub action: Option<JobAction>,
    /// Failures for which this returns true are retried; everything else is fatal
    pub is_error_ignored: Option<RetryPredicate>,
    /// Maximum number of attempts, must be at least 1
    pub attempts_before_failing: u32,
    /// Delay between a retryable failure and the next attempt
    pub interval: Duration,
    /// Checked by the underlying loop between attempts
    pub cancellation: CancellationSignal,
}

impl RetryingJob {
    /// Create a job with the default retry settings and no retryable failures.
    pub fn new<F, Fut>(action: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let settings = RetrySettings::default();
        Self {
            action: Some(Arc::new(move || action().boxed())),
            is_error_ignored: None,
            attempts_before_failing: settings.attempts_before_failing,
            interval: settings.interval(),
            cancellation: CancellationSignal::new(),
        }
    }

    pub fn with_attempts(mut self, attempts_before_failing: u32) -> Self {
        self.attempts_before_failing = attempts_before_failing;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Apply attempt budget and interval from configuration
    pub fn with_settings(self, settings: &RetrySettings) -> Self {
        self.with_attempts(settings.attempts_before_failing)
            .with_interval(settings.interval())
    }

    /// Mark failures matching `predicate` as retryable
    pub fn retry_when<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&ClipshiftError) -> bool + Send + Sync + 'static,
    {
        self.is_error_ignored = Some(Arc::new(predicate));
        self
    }

    pub fn with_cancellation(mut self, cancellation: CancellationSignal) -> Self {
        self.cancellation = cancellation;
        self
    }

    fn validate(&self) -> Result<JobAction> {
        let action = self
            .action
            .clone()
            .ok_or_else(|| ClipshiftError::InvalidArgument("job action is required".to_string()))?;

        if self.attempts_before_failing == 0 {
            return Err(ClipshiftError::InvalidArgument(
                "You must provide more than 0 attempts (attempts_before_failing)".to_string(),
            ));
        }

        Ok(action)
    }
}

impl std::fmt::Debug for RetryingJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingJob")
            .field("has_action", &self.action.is_some())
            .field("has_retry_predicate", &self.is_error_ignored.is_some())
            .field("attempts_before_failing", &self.attempts_before_failing)
            .field("interval", &self.interval)
            .field("cancelled", &self.cancellation.is_cancelled())
            .finish()
    }
}

/// Runs one [`RetryingJob`] to success or exhaustion on a [`ThreadLoop`].
#[derive(Debug, Clone)]
pub struct RetryingThreadLoop {
    thread_loop: ThreadLoop,
}

impl RetryingThreadLoop {
    pub fn new(thread_loop: ThreadLoop) -> Self {
        Self { thread_loop }
    }

    pub fn is_running(&self) -> bool {
        self.thread_loop.is_running()
    }

    /// Run `job` until it succeeds once or its attempt budget is spent.
    ///
    /// Argument errors are returned before anything runs.
    pub async fn start(&self, job: RetryingJob) -> Result<()> {
        let action = job.validate()?;
        let attempt = Attempt {
            action,
            is_error_ignored: job.is_error_ignored,
            budget: job.attempts_before_failing,
            interval: job.interval,
            thread_loop: self.thread_loop.clone(),
            attempts: AtomicU32::new(0),
            failures: Mutex::new(FailureSet::default()),
        };

        let attempt = &attempt;
        self.thread_loop.start(move || attempt.run(), job.cancellation).await
    }

    pub fn stop(&self) {
        self.thread_loop.stop();
    }
}

/// Per-run state shared by every iteration of one job.
struct Attempt {
    action: JobAction,
    is_error_ignored: Option<RetryPredicate>,
    budget: u32,
    interval: Duration,
    thread_loop: ThreadLoop,
    attempts: AtomicU32,
    failures: Mutex<FailureSet>,
}

impl Attempt {
    async fn run(&self) -> Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        let err = match (self.action)().await {
            Ok(()) => {
                self.thread_loop.stop();
                return Ok(());
            }
            Err(err) => err,
        };

        let failures = {
            let mut set = self.failures.lock().unwrap_or_else(PoisonError::into_inner);
            set.insert(err.to_string());
            set.messages.clone()
        };

        let retryable = self
            .is_error_ignored
            .as_ref()
            .is_some_and(|predicate| predicate(&err));
        if !retryable {
            return Err(err);
        }

        if attempt >= self.budget {
            return Err(ClipshiftError::RetriesExhausted {
                attempts: attempt,
                failures,
            });
        }

        tokio::time::sleep(self.interval).await;
        Ok(())
    }
}

/// Failure messages in first-seen order. Two different failures with the
/// same text count once.
#[derive(Debug, Default)]
struct FailureSet {
    seen: HashSet<String>,
    messages: Vec<String>,
}

impl FailureSet {
    fn insert(&mut self, message: String) {
        if self.seen.insert(message.clone()) {
            self.messages.push(message);
        }
    }
}
