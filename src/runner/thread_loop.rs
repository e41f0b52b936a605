//! Thread loop - runs one asynchronous unit of work until stopped.
//!
//! The loop owns a single running flag. Starting is an atomic check-and-set
//! under the same mutex that `stop` uses, so two concurrent starts can never
//! both succeed. Each start also takes a new generation number: a run keeps
//! going only while the flag is set for its own generation, so a stopped run
//! cannot pick up the flag of a later restart. Iterations are strictly
//! sequential and cancellation is only observed between them.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{ClipshiftError, Result};
use crate::logging::Logger;

use super::cancel::CancellationSignal;

/// Repeatedly awaits a unit of work until stopped, cancelled or failed.
///
/// Cloning yields another handle to the same loop, which is how work running
/// inside the loop gets to call [`ThreadLoop::stop`].
#[derive(Debug, Clone)]
pub struct ThreadLoop {
    state: Arc<Mutex<RunState>>,
    logger: Logger,
}

#[derive(Debug, Default)]
struct RunState {
    running: bool,
    generation: u64,
}

impl ThreadLoop {
    pub fn new(logger: Logger) -> Self {
        Self {
            state: Arc::new(Mutex::new(RunState::default())),
            logger,
        }
    }

    /// Snapshot of the running flag. Informational only.
    pub fn is_running(&self) -> bool {
        self.state().running
    }

    /// Run `work` until `cancellation` fires, `stop` is called or `work` fails.
    ///
    /// Fails with [`ClipshiftError::AlreadyRunning`] if the loop is already
    /// running. A failure from `work` is logged and returned unchanged.
    pub async fn start<F, Fut>(&self, mut work: F, cancellation: CancellationSignal) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let generation = self.mark_running()?;
        let _running = StopOnExit {
            thread_loop: self,
            generation,
        };
        let _indent = self.logger.indent();

        while !cancellation.is_cancelled() && self.is_current(generation) {
            if let Err(err) = work().await {
                self.logger
                    .error(format!("An error occurred in the thread loop: {err:?}"));
                return Err(err);
            }
        }

        Ok(())
    }

    /// Ask the loop to finish after the current iteration. Idempotent.
    pub fn stop(&self) {
        self.state().running = false;
    }

    fn mark_running(&self) -> Result<u64> {
        let mut state = self.state();
        if state.running {
            return Err(ClipshiftError::AlreadyRunning);
        }
        state.running = true;
        state.generation = state.generation.wrapping_add(1);
        Ok(state.generation)
    }

    fn is_current(&self, generation: u64) -> bool {
        let state = self.state();
        state.running && state.generation == generation
    }

    /// Clear the flag only if no later start has claimed it.
    fn finish(&self, generation: u64) {
        let mut state = self.state();
        if state.generation == generation {
            state.running = false;
        }
    }

    fn state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Clears the running flag however `start` exits, including when its future
/// is dropped mid-iteration.
struct StopOnExit<'a> {
    thread_loop: &'a ThreadLoop,
    generation: u64,
}

impl Drop for StopOnExit<'_> {
    fn drop(&mut self) {
        self.thread_loop.finish(self.generation);
    }
}
