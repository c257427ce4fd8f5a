//! # Task state machine.
//!
//! [`TaskHandle`] is both the executable unit and the caller's handle to it. It
//! tracks status, drives the host's three-phase protocol and dispatches the
//! registered handlers at the right phase on the right thread.
//!
//! ## Lifecycle
//! ```text
//! Pending ──execute()──► Running ──┬──► Finished   (completion fired)
//!    (creating thread:             ├──► Cancelled  (cancelled fired)
//!     pre_execute inline)          └──► Failed     (background panicked, host.unhandled)
//!
//! creating thread            worker thread                 creating thread
//! ───────────────            ─────────────                 ───────────────
//! pre_execute()  ──spawn──►  [delay]
//!                            cancelled? ─yes─► skip work ─┐
//!                            background(&task) ───────────┼─post─► finish()
//!                              └─ report_progress(v) ─post─► progress(v)
//! ```
//!
//! ## Rules
//! - A task executes **at most once**; `execute` on a non-pending task is ignored.
//! - Exactly one terminal outcome is recorded, under the same lock `cancel` takes,
//!   so a cancel request either lands before the outcome is decided or is a no-op.
//! - No lock is held while any handler runs; handlers may call back into the handle.
//! - Only `completion` replays when registered after the fact.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::core::host::HostRef;
use crate::error::{TaskError, panic_message};
use crate::events::{Bus, Event, EventKind};
use crate::tasks::{CallbackKind, Callbacks, Handler, TaskConfig};

/// Source of process-unique task ids.
static TASK_IDS: AtomicU64 = AtomicU64::new(1);

/// Lifecycle status of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TaskStatus {
    /// Built but not yet handed to the host.
    Pending = 0,
    /// `pre_execute` ran; background work is queued or running.
    Running = 1,
    /// `cancelled` was dispatched.
    Cancelled = 2,
    /// `completion` was dispatched.
    Finished = 3,
    /// The background handler panicked and no cancellation preceded it.
    Failed = 4,
}

impl TaskStatus {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => TaskStatus::Pending,
            1 => TaskStatus::Running,
            2 => TaskStatus::Cancelled,
            3 => TaskStatus::Finished,
            _ => TaskStatus::Failed,
        }
    }

    /// Returns `true` for states with no outgoing transition.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TaskStatus::Cancelled | TaskStatus::Finished | TaskStatus::Failed
        )
    }
}

/// Terminal decision, recorded before the terminal handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Completed,
    Cancelled,
    Failed,
}

/// What the worker hands back to the creating thread.
enum BackgroundOutcome<R> {
    Returned(Option<R>),
    Panicked { message: String, cancelled: bool },
}

/// State guarded by the task lock.
struct Shared<R, P> {
    callbacks: Callbacks<R, P>,
    result: Option<Arc<R>>,
    outcome: Option<Outcome>,
}

struct Inner<R, P> {
    id: u64,
    status: AtomicU8,
    cancel: CancellationToken,
    interrupt: CancellationToken,
    delay: Option<Duration>,
    host: HostRef,
    bus: Bus,
    shared: Mutex<Shared<R, P>>,
}

/// Handle to one task: cancellation, late handler registration, status queries,
/// progress reporting (from inside `background`) and the stored result.
///
/// Cloning is cheap and every clone refers to the same task.
pub struct TaskHandle<R = (), P = ()> {
    inner: Arc<Inner<R, P>>,
}

impl<R, P> Clone for TaskHandle<R, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, P> TaskHandle<R, P>
where
    R: Send + Sync + 'static,
    P: Send + 'static,
{
    pub(crate) fn new(config: TaskConfig<R, P>, host: HostRef, bus: Bus) -> Self {
        Self {
            inner: Arc::new(Inner {
                id: TASK_IDS.fetch_add(1, Ordering::Relaxed),
                status: AtomicU8::new(TaskStatus::Pending as u8),
                cancel: CancellationToken::new(),
                interrupt: CancellationToken::new(),
                delay: config.delay,
                host,
                bus,
                shared: Mutex::new(Shared {
                    callbacks: config.callbacks,
                    result: None,
                    outcome: None,
                }),
            }),
        }
    }

    /// Moves the task to Running, runs `pre_execute` inline and dispatches the
    /// background phase. Must be called on the creating thread.
    pub(crate) fn execute(&self) {
        if self
            .inner
            .status
            .compare_exchange(
                TaskStatus::Pending as u8,
                TaskStatus::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            tracing::warn!(task = self.id(), "task already executed; ignoring");
            return;
        }

        let mut submitted = Event::new(EventKind::TaskSubmitted).with_task(self.id());
        if let Some(delay) = self.inner.delay {
            submitted = submitted.with_delay(delay);
        }
        self.inner.bus.publish(submitted);

        let pre_execute = self.inner.shared.lock().callbacks.pre_execute.take();
        if let Some(f) = pre_execute {
            f();
        }
        self.publish(EventKind::TaskStarted);

        let task = self.clone();
        self.inner
            .host
            .spawn_background(Box::new(move || task.run_background()));
    }

    /// Background phase. Runs on a worker thread.
    fn run_background(self) {
        if let Some(delay) = self.inner.delay {
            self.inner.host.sleep(delay, &self.inner.interrupt);
        }

        let outcome = if self.inner.cancel.is_cancelled() {
            tracing::debug!(task = self.id(), "cancelled before background handler started");
            BackgroundOutcome::Returned(None)
        } else {
            let work = self.inner.shared.lock().callbacks.background.take();
            self.publish(EventKind::BackgroundStarted);
            match work {
                None => BackgroundOutcome::Returned(None),
                Some(work) => match panic::catch_unwind(AssertUnwindSafe(|| work(&self))) {
                    Ok(value) => BackgroundOutcome::Returned(Some(value)),
                    Err(payload) => BackgroundOutcome::Panicked {
                        message: panic_message(payload.as_ref()),
                        cancelled: self.inner.cancel.is_cancelled(),
                    },
                },
            }
        };

        let host = Arc::clone(&self.inner.host);
        host.post(Box::new(move || self.finish(outcome)));
    }

    /// Post phase. Runs on the creating thread.
    fn finish(self, outcome: BackgroundOutcome<R>) {
        let mut shared = self.inner.shared.lock();
        match outcome {
            BackgroundOutcome::Returned(value) => {
                let value = value.map(Arc::new);
                shared.result = value.clone();
                if self.inner.cancel.is_cancelled() {
                    shared.outcome = Some(Outcome::Cancelled);
                    let handler = shared.callbacks.cancelled.take();
                    drop(shared);
                    self.dispatch_terminal(TaskStatus::Cancelled, move || {
                        if let Some(f) = handler {
                            f(value.as_deref());
                        }
                    });
                } else {
                    shared.outcome = Some(Outcome::Completed);
                    let handler = shared.callbacks.completion.take();
                    drop(shared);
                    self.dispatch_terminal(TaskStatus::Finished, move || {
                        if let Some(f) = handler {
                            f(value.as_deref());
                        }
                    });
                }
            }
            BackgroundOutcome::Panicked { cancelled: true, .. } => {
                shared.outcome = Some(Outcome::Cancelled);
                let handler = shared.callbacks.cancelled.take();
                drop(shared);
                self.dispatch_terminal(TaskStatus::Cancelled, move || {
                    if let Some(f) = handler {
                        f(None);
                    }
                });
            }
            BackgroundOutcome::Panicked { message, .. } => {
                shared.outcome = Some(Outcome::Failed);
                drop(shared);
                self.set_status(TaskStatus::Failed);
                self.inner.bus.publish(
                    Event::new(EventKind::TaskFailed)
                        .with_task(self.id())
                        .with_reason(message.as_str()),
                );
                self.inner.host.unhandled(TaskError::BackgroundPanicked {
                    task: self.id(),
                    message,
                });
            }
        }
    }

    /// Runs a terminal handler, then records `status` even if the handler panicked.
    fn dispatch_terminal<F>(&self, status: TaskStatus, call: F)
    where
        F: FnOnce(),
    {
        let res = panic::catch_unwind(AssertUnwindSafe(call));
        self.set_status(status);
        self.publish(match status {
            TaskStatus::Cancelled => EventKind::TaskCancelled,
            _ => EventKind::TaskCompleted,
        });
        if let Err(payload) = res {
            panic::resume_unwind(payload);
        }
    }

    /// Reports a progress value from inside the `background` handler.
    ///
    /// The value is delivered to the `progress` handler on the creating thread.
    /// Deliveries keep the reporting order; the worker does not wait for them.
    pub fn report_progress(&self, value: P) {
        self.publish(EventKind::ProgressReported);
        let task = self.clone();
        self.inner
            .host
            .post(Box::new(move || task.deliver_progress(value)));
    }

    fn deliver_progress(&self, value: P) {
        let handler = {
            let mut shared = self.inner.shared.lock();
            if shared.outcome.is_some() {
                tracing::trace!(task = self.id(), "progress after terminal outcome dropped");
                return;
            }
            shared.callbacks.progress.take()
        };
        let Some(mut f) = handler else {
            return;
        };

        let res = panic::catch_unwind(AssertUnwindSafe(|| f(value)));
        {
            // Keep a handler registered while this one was running.
            let mut shared = self.inner.shared.lock();
            if shared.callbacks.progress.is_none() {
                shared.callbacks.progress = Some(f);
            }
        }
        if let Err(payload) = res {
            panic::resume_unwind(payload);
        }
    }

    /// Registers `handler`, replacing any handler of the same kind.
    ///
    /// Registering `completion` on a task that already completed invokes it
    /// immediately with the stored result instead. No other kind replays.
    /// Returns a clone of the handle for chaining.
    pub fn on(&self, handler: Handler<R, P>) -> Self {
        let kind = handler.kind();
        let mut shared = self.inner.shared.lock();
        match handler {
            Handler::Completion(f) if shared.outcome == Some(Outcome::Completed) => {
                let result = shared.result.clone();
                drop(shared);
                tracing::debug!(task = self.id(), "completion registered after finish; replaying");
                f(result.as_deref());
            }
            handler => {
                if shared.callbacks.set(handler) {
                    tracing::trace!(task = self.id(), %kind, "handler replaced");
                }
                if shared.outcome.is_some() && kind != CallbackKind::Completion {
                    tracing::trace!(task = self.id(), %kind, "handler registered after terminal outcome");
                }
            }
        }
        self.clone()
    }

    /// Shorthand for `on(Handler::pre_execute(f))`.
    pub fn on_pre_execute<F>(&self, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on(Handler::pre_execute(f))
    }

    /// Shorthand for `on(Handler::background(f))`.
    pub fn on_background<F>(&self, f: F) -> Self
    where
        F: FnOnce(&TaskHandle<R, P>) -> R + Send + 'static,
    {
        self.on(Handler::background(f))
    }

    /// Shorthand for `on(Handler::progress(f))`.
    pub fn on_progress<F>(&self, f: F) -> Self
    where
        F: FnMut(P) + Send + 'static,
    {
        self.on(Handler::progress(f))
    }

    /// Shorthand for `on(Handler::cancelled(f))`.
    pub fn on_cancelled<F>(&self, f: F) -> Self
    where
        F: FnOnce(Option<&R>) + Send + 'static,
    {
        self.on(Handler::cancelled(f))
    }

    /// Shorthand for `on(Handler::completion(f))`.
    pub fn on_completion<F>(&self, f: F) -> Self
    where
        F: FnOnce(Option<&R>) + Send + 'static,
    {
        self.on(Handler::completion(f))
    }

    /// Requests cooperative cancellation.
    ///
    /// The flag flips immediately, so a concurrent [`is_cancelled`](Self::is_cancelled)
    /// poll inside `background` observes it. A running handler is never interrupted;
    /// `may_interrupt_if_running` only cuts a pending start delay short.
    ///
    /// Returns `false` (and does nothing) when the task already reached its
    /// terminal outcome or was already cancelled.
    pub fn cancel(&self, may_interrupt_if_running: bool) -> bool {
        let shared = self.inner.shared.lock();
        if may_interrupt_if_running && shared.outcome.is_none() {
            self.inner.interrupt.cancel();
        }
        if shared.outcome.is_some() || self.inner.cancel.is_cancelled() {
            return false;
        }
        self.inner.cancel.cancel();
        drop(shared);

        let mut ev = Event::new(EventKind::CancelRequested).with_task(self.id());
        if may_interrupt_if_running {
            ev = ev.with_reason("interrupt");
        }
        self.inner.bus.publish(ev);
        true
    }

    /// Returns a token cancelled together with this task.
    ///
    /// Cancelling the returned token does not cancel the task.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.cancel.child_token()
    }

    /// Returns the stored result once the task completed without cancellation.
    pub fn result(&self) -> Option<Arc<R>> {
        let shared = self.inner.shared.lock();
        match shared.outcome {
            Some(Outcome::Completed) => shared.result.clone(),
            _ => None,
        }
    }

    fn publish(&self, kind: EventKind) {
        self.inner.bus.publish(Event::new(kind).with_task(self.id()));
    }
}

impl<R, P> TaskHandle<R, P> {
    /// Process-unique task id (as carried by lifecycle events).
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Current lifecycle status.
    pub fn status(&self) -> TaskStatus {
        TaskStatus::from_u8(self.inner.status.load(Ordering::Acquire))
    }

    fn set_status(&self, status: TaskStatus) {
        self.inner.status.store(status as u8, Ordering::Release);
    }

    /// `true` until the task is handed to the host.
    pub fn is_pending(&self) -> bool {
        self.status() == TaskStatus::Pending
    }

    /// `true` between `pre_execute` and the terminal dispatch.
    pub fn is_running(&self) -> bool {
        self.status() == TaskStatus::Running
    }

    /// `true` once cancellation was requested. Safe to poll from `background`.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// `true` once `completion` was dispatched.
    pub fn is_finished(&self) -> bool {
        self.status() == TaskStatus::Finished
    }

    /// `true` once the background handler's panic was surfaced.
    pub fn is_failed(&self) -> bool {
        self.status() == TaskStatus::Failed
    }
}

impl<R, P> fmt::Debug for TaskHandle<R, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskHandle")
            .field("id", &self.id())
            .field("status", &self.status())
            .field("cancelled", &self.is_cancelled())
            .field("delay", &self.inner.delay)
            .finish()
    }
}
