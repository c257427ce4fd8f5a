//! # Creating-thread dispatcher and the tokio-backed host.
//!
//! [`MainLoop`] plays the role of a UI thread's message queue: every job posted
//! through a [`MainSender`] runs on whichever thread pumps the loop, one at a
//! time, in posting order. [`TokioHost`] wires a tokio runtime (worker side) to a
//! `MainLoop` (creating side).
//!
//! ## Architecture
//! ```text
//! creating thread                          tokio blocking pool
//! ───────────────                          ───────────────────
//! Offload::spawn ──► pre_execute (inline)
//!                └─► TokioHost::spawn_background ──► [delay] ──► background(&task)
//!                                                                   │ report_progress(v)
//! MainLoop::run_until ◄── [mpsc FIFO] ◄── MainSender::send ◄────────┤
//!   ├─► progress(v)                                                 │ return
//!   └─► completion / cancelled ◄────────────────────────────────────┘
//! ```
//!
//! ## Rules
//! - Jobs run sequentially on the pumping thread, never concurrently.
//! - A panicking job is caught (`catch_unwind`) and handed to the error hook;
//!   the loop keeps going with the next job.
//! - The default error hook logs with `tracing::error!`.

use std::panic::AssertUnwindSafe;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::core::host::{Host, Job};
use crate::error::{RuntimeError, TaskError};

/// Cloneable, `Send` handle for posting jobs to a [`MainLoop`].
#[derive(Clone, Debug)]
pub struct MainSender {
    tx: mpsc::UnboundedSender<Job>,
}

impl MainSender {
    /// Queues `job`. Returns `false` if the loop was dropped and the job discarded.
    pub fn send(&self, job: Job) -> bool {
        self.tx.send(job).is_ok()
    }
}

/// FIFO job queue drained by the creating thread.
///
/// ## Example
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::time::Duration;
/// use offload::MainLoop;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut main_loop = MainLoop::new();
/// let flag = Arc::new(AtomicBool::new(false));
///
/// let f = flag.clone();
/// let sender = main_loop.sender();
/// std::thread::spawn(move || {
///     sender.send(Box::new(move || f.store(true, Ordering::SeqCst)));
/// });
///
/// main_loop
///     .run_until(|| flag.load(Ordering::SeqCst), Duration::from_secs(1))
///     .await
///     .unwrap();
/// # }
/// ```
pub struct MainLoop {
    tx: mpsc::UnboundedSender<Job>,
    rx: mpsc::UnboundedReceiver<Job>,
    on_error: Box<dyn FnMut(TaskError)>,
}

impl MainLoop {
    /// Creates an empty loop with the logging error hook.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx,
            on_error: Box::new(|err| {
                tracing::error!(label = err.as_label(), "unhandled: {err}");
            }),
        }
    }

    /// Replaces the hook that receives panics caught while running jobs.
    ///
    /// Background failures reach this hook as [`TaskError::BackgroundPanicked`]
    /// through [`Host::unhandled`]'s default implementation.
    pub fn with_error_hook<F>(mut self, hook: F) -> Self
    where
        F: FnMut(TaskError) + 'static,
    {
        self.on_error = Box::new(hook);
        self
    }

    /// Returns a new sender for this loop.
    pub fn sender(&self) -> MainSender {
        MainSender {
            tx: self.tx.clone(),
        }
    }

    /// Builds a [`TokioHost`] that runs background work on `runtime` and posts here.
    pub fn host(&self, runtime: Handle) -> TokioHost {
        TokioHost::new(runtime, self.sender())
    }

    /// Runs every job already queued (and any they queue) without waiting.
    ///
    /// Returns the number of jobs run.
    pub fn run_pending(&mut self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.rx.try_recv() {
            self.run_job(job);
            ran += 1;
        }
        ran
    }

    /// Waits for the next job and runs it.
    pub async fn turn(&mut self) {
        if let Some(job) = self.rx.recv().await {
            self.run_job(job);
        }
    }

    /// Pumps the loop until `done` returns `true`.
    ///
    /// `done` is checked after every drained batch. Fails with
    /// [`RuntimeError::LoopTimeout`] once `timeout` elapses first.
    pub async fn run_until<F>(&mut self, mut done: F, timeout: Duration) -> Result<(), RuntimeError>
    where
        F: FnMut() -> bool,
    {
        let deadline = time::Instant::now() + timeout;
        loop {
            self.run_pending();
            if done() {
                return Ok(());
            }
            match time::timeout_at(deadline, self.rx.recv()).await {
                Ok(Some(job)) => self.run_job(job),
                _ => return Err(RuntimeError::LoopTimeout { timeout }),
            }
        }
    }

    fn run_job(&mut self, job: Job) {
        if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(job)) {
            let err = TaskError::from_panic(payload);
            tracing::debug!(label = err.as_label(), "main loop job panicked");
            (self.on_error)(err);
        }
    }
}

impl Default for MainLoop {
    fn default() -> Self {
        Self::new()
    }
}

/// [`Host`] over a tokio runtime and a [`MainLoop`].
///
/// - background phase: `Handle::spawn_blocking`
/// - creating-thread jobs: [`MainSender::send`]
/// - `after` delay: `tokio::time::sleep` raced against the interrupt token
///
/// The runtime's timer must be driven while a delay is pending: use a multi-thread
/// runtime, or pump the `MainLoop` from inside the current-thread runtime's
/// `block_on` (as `#[tokio::main(flavor = "current_thread")]` does).
#[derive(Clone, Debug)]
pub struct TokioHost {
    runtime: Handle,
    main: MainSender,
}

impl TokioHost {
    /// Creates a host from a runtime handle and a main-loop sender.
    pub fn new(runtime: Handle, main: MainSender) -> Self {
        Self { runtime, main }
    }

    /// Uses the runtime the caller is running in.
    ///
    /// # Panics
    /// Panics when called outside of a tokio runtime, like [`Handle::current`].
    pub fn current(main: MainSender) -> Self {
        Self::new(Handle::current(), main)
    }
}

impl Host for TokioHost {
    fn spawn_background(&self, job: Job) {
        drop(self.runtime.spawn_blocking(job));
    }

    fn post(&self, job: Job) {
        if !self.main.send(job) {
            tracing::warn!("main loop is gone; creating-thread job discarded");
        }
    }

    fn sleep(&self, delay: Duration, interrupt: &CancellationToken) {
        self.runtime.block_on(async {
            tokio::select! {
                _ = time::sleep(delay) => {}
                _ = interrupt.cancelled() => {}
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[tokio::test]
    async fn test_jobs_run_in_post_order() {
        let mut main_loop = MainLoop::new();
        let seen = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sender = main_loop.sender();
        for i in 0..5 {
            let seen = seen.clone();
            sender.send(Box::new(move || seen.lock().push(i)));
        }
        assert_eq!(main_loop.run_pending(), 5);
        assert_eq!(*seen.lock(), vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_panicking_job_reaches_hook() {
        let errors = Rc::new(RefCell::new(Vec::new()));
        let sink = errors.clone();
        let mut main_loop = MainLoop::new().with_error_hook(move |err| sink.borrow_mut().push(err));

        let sender = main_loop.sender();
        sender.send(Box::new(|| panic!("kaboom")));
        sender.send(Box::new(|| {}));
        assert_eq!(main_loop.run_pending(), 2);

        assert_eq!(
            *errors.borrow(),
            vec![TaskError::HandlerPanicked {
                message: "kaboom".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_run_until_times_out() {
        let mut main_loop = MainLoop::new();
        let res = main_loop
            .run_until(|| false, Duration::from_millis(20))
            .await;
        assert_eq!(
            res,
            Err(RuntimeError::LoopTimeout {
                timeout: Duration::from_millis(20)
            })
        );
    }

    #[test]
    fn test_send_after_loop_dropped() {
        let main_loop = MainLoop::new();
        let sender = main_loop.sender();
        drop(main_loop);
        assert!(!sender.send(Box::new(|| {})));
    }
}
