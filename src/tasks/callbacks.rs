//! # Callback slots.
//!
//! A task owns exactly one slot per [`CallbackKind`]. Registering a handler for a
//! kind that already has one replaces it; the previous handler is dropped unused.
//!
//! Handlers that fire at most once are `FnOnce` and are *taken* out of their slot
//! when dispatched, so a second dispatch of the same kind finds nothing to call.
//! `progress` is `FnMut` and is put back after every delivery.
//!
//! | Kind          | Thread   | Fires              | Signature                         |
//! |---------------|----------|--------------------|-----------------------------------|
//! | `PreExecute`  | creating | once, before work  | `FnOnce()`                        |
//! | `Background`  | worker   | once               | `FnOnce(&TaskHandle<R, P>) -> R`  |
//! | `Progress`    | creating | per report         | `FnMut(P)`                        |
//! | `Cancelled`   | creating | at most once       | `FnOnce(Option<&R>)`              |
//! | `Completion`  | creating | at most once       | `FnOnce(Option<&R>)`              |

use std::fmt;

use crate::core::TaskHandle;

pub(crate) type PreExecuteFn = Box<dyn FnOnce() + Send + 'static>;
pub(crate) type BackgroundFn<R, P> = Box<dyn FnOnce(&TaskHandle<R, P>) -> R + Send + 'static>;
pub(crate) type ProgressFn<P> = Box<dyn FnMut(P) + Send + 'static>;
pub(crate) type CancelledFn<R> = Box<dyn FnOnce(Option<&R>) + Send + 'static>;
pub(crate) type CompletionFn<R> = Box<dyn FnOnce(Option<&R>) + Send + 'static>;

/// The five lifecycle hooks a task understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackKind {
    /// Runs on the creating thread before the background phase is dispatched.
    PreExecute,
    /// Runs on a worker thread and produces the task result.
    Background,
    /// Runs on the creating thread once per reported progress value.
    Progress,
    /// Terminal hook when the task was cancelled.
    Cancelled,
    /// Terminal hook when the task finished without cancellation.
    Completion,
}

impl CallbackKind {
    /// Stable snake_case name, matching the configuration keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            CallbackKind::PreExecute => "pre_execute",
            CallbackKind::Background => "background",
            CallbackKind::Progress => "progress",
            CallbackKind::Cancelled => "cancelled",
            CallbackKind::Completion => "completion",
        }
    }
}

impl fmt::Display for CallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A handler tagged with the lifecycle hook it belongs to.
///
/// Used by [`TaskHandle::on`](crate::TaskHandle::on) and
/// [`TaskConfig::handler`](crate::TaskConfig::handler) to register any kind through
/// one entry point.
///
/// ## Example
/// ```rust
/// use offload::{CallbackKind, Handler};
///
/// let h: Handler<u32> = Handler::completion(|result| println!("done: {result:?}"));
/// assert_eq!(h.kind(), CallbackKind::Completion);
/// ```
pub enum Handler<R = (), P = ()> {
    /// See [`CallbackKind::PreExecute`].
    PreExecute(PreExecuteFn),
    /// See [`CallbackKind::Background`].
    Background(BackgroundFn<R, P>),
    /// See [`CallbackKind::Progress`].
    Progress(ProgressFn<P>),
    /// See [`CallbackKind::Cancelled`].
    Cancelled(CancelledFn<R>),
    /// See [`CallbackKind::Completion`].
    Completion(CompletionFn<R>),
}

impl<R, P> Handler<R, P> {
    /// Wraps a `pre_execute` closure.
    pub fn pre_execute<F>(f: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Handler::PreExecute(Box::new(f))
    }

    /// Wraps a `background` closure.
    pub fn background<F>(f: F) -> Self
    where
        F: FnOnce(&TaskHandle<R, P>) -> R + Send + 'static,
    {
        Handler::Background(Box::new(f))
    }

    /// Wraps a `progress` closure.
    pub fn progress<F>(f: F) -> Self
    where
        F: FnMut(P) + Send + 'static,
    {
        Handler::Progress(Box::new(f))
    }

    /// Wraps a `cancelled` closure.
    pub fn cancelled<F>(f: F) -> Self
    where
        F: FnOnce(Option<&R>) + Send + 'static,
    {
        Handler::Cancelled(Box::new(f))
    }

    /// Wraps a `completion` closure.
    pub fn completion<F>(f: F) -> Self
    where
        F: FnOnce(Option<&R>) + Send + 'static,
    {
        Handler::Completion(Box::new(f))
    }

    /// Returns the hook this handler is registered under.
    pub fn kind(&self) -> CallbackKind {
        match self {
            Handler::PreExecute(_) => CallbackKind::PreExecute,
            Handler::Background(_) => CallbackKind::Background,
            Handler::Progress(_) => CallbackKind::Progress,
            Handler::Cancelled(_) => CallbackKind::Cancelled,
            Handler::Completion(_) => CallbackKind::Completion,
        }
    }
}

impl<R, P> fmt::Debug for Handler<R, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Handler").field(&self.kind()).finish()
    }
}

/// One optional slot per [`CallbackKind`].
pub(crate) struct Callbacks<R, P> {
    pub(crate) pre_execute: Option<PreExecuteFn>,
    pub(crate) background: Option<BackgroundFn<R, P>>,
    pub(crate) progress: Option<ProgressFn<P>>,
    pub(crate) cancelled: Option<CancelledFn<R>>,
    pub(crate) completion: Option<CompletionFn<R>>,
}

impl<R, P> Callbacks<R, P> {
    /// Stores `handler` in its slot, returning `true` if it replaced another one.
    pub(crate) fn set(&mut self, handler: Handler<R, P>) -> bool {
        match handler {
            Handler::PreExecute(f) => self.pre_execute.replace(f).is_some(),
            Handler::Background(f) => self.background.replace(f).is_some(),
            Handler::Progress(f) => self.progress.replace(f).is_some(),
            Handler::Cancelled(f) => self.cancelled.replace(f).is_some(),
            Handler::Completion(f) => self.completion.replace(f).is_some(),
        }
    }

    /// Returns `true` if a handler is registered for `kind`.
    pub(crate) fn has(&self, kind: CallbackKind) -> bool {
        match kind {
            CallbackKind::PreExecute => self.pre_execute.is_some(),
            CallbackKind::Background => self.background.is_some(),
            CallbackKind::Progress => self.progress.is_some(),
            CallbackKind::Cancelled => self.cancelled.is_some(),
            CallbackKind::Completion => self.completion.is_some(),
        }
    }
}

impl<R, P> Default for Callbacks<R, P> {
    fn default() -> Self {
        Self {
            pre_execute: None,
            background: None,
            progress: None,
            cancelled: None,
            completion: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_reports_replacement() {
        let mut cbs: Callbacks<u8, ()> = Callbacks::default();
        assert!(!cbs.has(CallbackKind::Completion));
        assert!(!cbs.set(Handler::completion(|_| {})));
        assert!(cbs.set(Handler::completion(|_| {})));
        assert!(cbs.has(CallbackKind::Completion));
        assert!(!cbs.has(CallbackKind::Cancelled));
    }

    #[test]
    fn test_later_registration_wins() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        let hits = Arc::new(AtomicUsize::new(0));
        let mut cbs: Callbacks<(), u32> = Callbacks::default();

        let first = hits.clone();
        cbs.set(Handler::progress(move |v| {
            first.fetch_add(v as usize, Ordering::SeqCst);
        }));
        let second = hits.clone();
        cbs.set(Handler::progress(move |v| {
            second.fetch_add(v as usize * 100, Ordering::SeqCst);
        }));

        let mut f = cbs.progress.take().expect("progress slot");
        f(1);
        assert_eq!(hits.load(Ordering::SeqCst), 100);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(CallbackKind::PreExecute.to_string(), "pre_execute");
        assert_eq!(Handler::<(), ()>::pre_execute(|| {}).kind(), CallbackKind::PreExecute);
    }
}
