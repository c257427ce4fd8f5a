//! Error types used by offload tasks and the main-thread dispatcher.
//!
//! This module defines two main error enums:
//!
//! - [`TaskError`] — failures surfaced by a single task's lifecycle.
//! - [`RuntimeError`] — failures of the [`MainLoop`](crate::MainLoop) that pumps
//!   creating-thread work.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::any::Any;
use std::time::Duration;
use thiserror::Error;

/// # Errors produced by task execution.
///
/// None of these are returned from the façade: a task never fails to build.
/// They are handed to [`Host::unhandled`](crate::Host::unhandled) or to the
/// [`MainLoop`](crate::MainLoop) error hook on the creating thread.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The `background` handler panicked and no cancellation preceded the panic.
    #[error("background handler of task {task} panicked: {message}")]
    BackgroundPanicked {
        /// Identifier of the failed task.
        task: u64,
        /// Panic payload rendered as text.
        message: String,
    },

    /// A handler running on the creating thread panicked.
    #[error("handler panicked: {message}")]
    HandlerPanicked {
        /// Panic payload rendered as text.
        message: String,
    },
}

impl TaskError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use offload::TaskError;
    ///
    /// let err = TaskError::HandlerPanicked { message: "boom".into() };
    /// assert_eq!(err.as_label(), "task_handler_panicked");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::BackgroundPanicked { .. } => "task_background_panicked",
            TaskError::HandlerPanicked { .. } => "task_handler_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            TaskError::BackgroundPanicked { task, message } => {
                format!("background panic: task={task} {message}")
            }
            TaskError::HandlerPanicked { message } => format!("handler panic: {message}"),
        }
    }

    /// Converts a caught panic payload into a [`TaskError`].
    ///
    /// A payload that already carries a `TaskError` (re-raised by
    /// [`Host::unhandled`](crate::Host::unhandled)) is returned as is.
    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        match payload.downcast::<TaskError>() {
            Ok(err) => *err,
            Err(other) => TaskError::HandlerPanicked {
                message: panic_message(other.as_ref()),
            },
        }
    }
}

/// # Errors produced by the main-thread dispatcher.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// `MainLoop::run_until` gave up before its condition held.
    #[error("main loop condition not reached within {timeout:?}")]
    LoopTimeout {
        /// The configured wait.
        timeout: Duration,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use offload::RuntimeError;
    /// use std::time::Duration;
    ///
    /// let err = RuntimeError::LoopTimeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "runtime_loop_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::LoopTimeout { .. } => "runtime_loop_timeout",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            RuntimeError::LoopTimeout { timeout } => format!("loop timeout: {timeout:?}"),
        }
    }
}

/// Renders a panic payload the way `std` does for `&str` and `String` payloads.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_panic_keeps_task_error() {
        let surfaced = TaskError::BackgroundPanicked {
            task: 7,
            message: "boom".into(),
        };
        let payload: Box<dyn Any + Send> = Box::new(surfaced.clone());
        assert_eq!(TaskError::from_panic(payload), surfaced);
    }

    #[test]
    fn test_from_panic_wraps_strings() {
        let payload: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(
            TaskError::from_panic(payload),
            TaskError::HandlerPanicked {
                message: "static str".into()
            }
        );

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(TaskError::from_panic(payload).as_message(), "handler panic: owned");
    }

    #[test]
    fn test_unknown_payload() {
        let payload: Box<dyn Any + Send> = Box::new(42_u32);
        assert_eq!(
            TaskError::from_panic(payload),
            TaskError::HandlerPanicked {
                message: "unknown panic".into()
            }
        );
    }
}
