//! # Task configuration.
//!
//! Defines [`TaskConfig`] the bundle of handlers (plus optional start delay) an
//! [`Offload`](crate::Offload) façade turns into a running task.
//!
//! A config can be created:
//! - **Fluently** with [`TaskConfig::new`] and one method per hook
//! - **Generically** with [`TaskConfig::handler`] and a tagged [`Handler`]
//!
//! ## Rules
//! - At most one handler per hook; a later call for the same hook replaces the earlier one.
//! - Every hook is optional. A config with no handlers at all builds a no-op task.
//! - The start delay is normally injected by [`Offload::after`](crate::Offload::after).

use std::fmt;
use std::time::Duration;

use crate::core::TaskHandle;
use crate::tasks::callbacks::{CallbackKind, Callbacks, Handler};

/// Handlers and options for one task.
///
/// `R` is the value produced by the `background` handler, `P` the type of the
/// progress values it reports.
///
/// ## Example
/// ```rust
/// use offload::{CallbackKind, TaskConfig};
///
/// let cfg: TaskConfig<usize, u8> = TaskConfig::new()
///     .pre_execute(|| println!("about to start"))
///     .background(|task| {
///         for pct in (0..=100).step_by(25) {
///             task.report_progress(pct as u8);
///         }
///         42
///     })
///     .progress(|pct| println!("{pct}%"))
///     .completion(|result| println!("result: {result:?}"));
///
/// assert!(cfg.has(CallbackKind::Background));
/// assert!(!cfg.has(CallbackKind::Cancelled));
/// ```
pub struct TaskConfig<R = (), P = ()> {
    pub(crate) callbacks: Callbacks<R, P>,
    pub(crate) delay: Option<Duration>,
}

impl<R, P> TaskConfig<R, P> {
    /// Creates an empty configuration (no handlers, no delay).
    pub fn new() -> Self {
        Self {
            callbacks: Callbacks::default(),
            delay: None,
        }
    }

    /// Registers any handler through its tagged form.
    pub fn handler(mut self, handler: Handler<R, P>) -> Self {
        self.callbacks.set(handler);
        self
    }

    /// Sets the `pre_execute` hook.
    pub fn pre_execute<F>(self, f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.handler(Handler::pre_execute(f))
    }

    /// Sets the `background` hook.
    pub fn background<F>(self, f: F) -> Self
    where
        F: FnOnce(&TaskHandle<R, P>) -> R + Send + 'static,
    {
        self.handler(Handler::background(f))
    }

    /// Sets the `progress` hook.
    pub fn progress<F>(self, f: F) -> Self
    where
        F: FnMut(P) + Send + 'static,
    {
        self.handler(Handler::progress(f))
    }

    /// Sets the `cancelled` hook.
    pub fn cancelled<F>(self, f: F) -> Self
    where
        F: FnOnce(Option<&R>) + Send + 'static,
    {
        self.handler(Handler::cancelled(f))
    }

    /// Sets the `completion` hook.
    pub fn completion<F>(self, f: F) -> Self
    where
        F: FnOnce(Option<&R>) + Send + 'static,
    {
        self.handler(Handler::completion(f))
    }

    /// Delays the `background` handler by `delay`, measured on the worker thread.
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Returns the configured start delay, if any.
    pub fn start_delay(&self) -> Option<Duration> {
        self.delay
    }

    /// Returns `true` if a handler is registered for `kind`.
    pub fn has(&self, kind: CallbackKind) -> bool {
        self.callbacks.has(kind)
    }

    /// Uses `work` as the `background` handler unless one is already set.
    ///
    /// Returns `false` when `work` was discarded.
    pub(crate) fn fill_background<F>(&mut self, work: F) -> bool
    where
        F: FnOnce(&TaskHandle<R, P>) -> R + Send + 'static,
    {
        if self.callbacks.background.is_some() {
            return false;
        }
        self.callbacks.background = Some(Box::new(work));
        true
    }
}

impl<R, P> Default for TaskConfig<R, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, P> fmt::Debug for TaskConfig<R, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kinds = [
            CallbackKind::PreExecute,
            CallbackKind::Background,
            CallbackKind::Progress,
            CallbackKind::Cancelled,
            CallbackKind::Completion,
        ];
        let registered: Vec<&'static str> = kinds
            .iter()
            .filter(|k| self.has(**k))
            .map(CallbackKind::as_str)
            .collect();
        f.debug_struct("TaskConfig")
            .field("callbacks", &registered)
            .field("delay", &self.delay)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_work_does_not_override_background() {
        let mut cfg: TaskConfig<u32> = TaskConfig::new().background(|_| 1);
        assert!(!cfg.fill_background(|_| 2));

        let mut empty: TaskConfig<u32> = TaskConfig::new();
        assert!(empty.fill_background(|_| 2));
        assert!(empty.has(CallbackKind::Background));
    }

    #[test]
    fn test_empty_config() {
        let cfg: TaskConfig = TaskConfig::default();
        assert_eq!(cfg.start_delay(), None);
        assert_eq!(
            format!("{cfg:?}"),
            "TaskConfig { callbacks: [], delay: None }"
        );
    }

    #[test]
    fn test_delay_and_debug() {
        let cfg: TaskConfig = TaskConfig::new()
            .completion(|_| {})
            .delay(Duration::from_millis(5));
        assert_eq!(cfg.start_delay(), Some(Duration::from_millis(5)));
        assert_eq!(
            format!("{cfg:?}"),
            "TaskConfig { callbacks: [\"completion\"], delay: Some(5ms) }"
        );
    }
}
