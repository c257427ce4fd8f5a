//! # Host execution facility.
//!
//! [`Host`] is the seam between the task state machine and whatever actually owns
//! threads. The state machine spawns nothing itself; it asks the host to:
//!
//! - run the background phase **off** the calling thread ([`Host::spawn_background`]);
//! - run pre/progress/post work **on** the creating thread ([`Host::post`]);
//! - wait out an `after` delay on the worker thread ([`Host::sleep`]);
//! - surface a background failure ([`Host::unhandled`]).
//!
//! ## Rules
//! - `post` must be FIFO: jobs run in the order they were posted, one at a time.
//! - `spawn_background` must not run the job inline on the calling thread.
//! - Progress, terminal dispatch and failure reporting are all posted, never
//!   run from the worker directly.
//!
//! The crate ships [`TokioHost`](crate::TokioHost) backed by a tokio runtime and a
//! [`MainLoop`](crate::MainLoop); embedders with their own UI thread implement this trait.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// A unit of work handed to the host.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Shared handle to a host (`Arc<dyn Host>`).
pub type HostRef = Arc<dyn Host>;

/// Granularity of the default interruptible sleep.
const SLEEP_SLICE: Duration = Duration::from_millis(10);

/// Platform integration used by every task.
pub trait Host: Send + Sync + 'static {
    /// Runs `job` on a worker thread.
    fn spawn_background(&self, job: Job);

    /// Queues `job` for the creating thread (FIFO).
    fn post(&self, job: Job);

    /// Blocks the current worker thread for `delay`, returning early once `interrupt` fires.
    ///
    /// The default implementation sleeps in short slices and polls `interrupt` between them.
    fn sleep(&self, delay: Duration, interrupt: &CancellationToken) {
        let deadline = Instant::now() + delay;
        while !interrupt.is_cancelled() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep((deadline - now).min(SLEEP_SLICE));
        }
    }

    /// Surfaces a failure nobody handled. Called on the creating thread.
    ///
    /// The default implementation re-raises `error` as a panic payload, so it reaches
    /// whatever unhandled-error channel drives the creating thread (for a
    /// [`MainLoop`](crate::MainLoop), its error hook).
    fn unhandled(&self, error: TaskError) {
        std::panic::resume_unwind(Box::new(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Inline;

    impl Host for Inline {
        fn spawn_background(&self, job: Job) {
            job();
        }

        fn post(&self, job: Job) {
            job();
        }
    }

    #[test]
    fn test_default_sleep_waits() {
        let start = Instant::now();
        Inline.sleep(Duration::from_millis(30), &CancellationToken::new());
        assert!(start.elapsed() >= Duration::from_millis(30));
    }

    #[test]
    fn test_default_sleep_interrupted() {
        let token = CancellationToken::new();
        token.cancel();
        let start = Instant::now();
        Inline.sleep(Duration::from_secs(5), &token);
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_default_unhandled_reraises() {
        let err = TaskError::HandlerPanicked {
            message: "boom".into(),
        };
        let caught = std::panic::catch_unwind(|| Inline.unhandled(err.clone()))
            .expect_err("must unwind");
        assert_eq!(TaskError::from_panic(caught), err);
    }
}
