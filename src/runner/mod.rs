//! Runner module - continuously running background work.
//!
//! This module provides:
//! - ThreadLoop, which awaits one unit of work repeatedly until stopped
//! - RetryingThreadLoop, which runs one job with bounded retry on a ThreadLoop
//! - CancellationSignal, checked by both between iterations

mod cancel;
mod retrying;
mod thread_loop;

pub use cancel::CancellationSignal;
pub use retrying::{JobAction, RetryPredicate, RetryingJob, RetryingThreadLoop};
pub use thread_loop::ThreadLoop;
