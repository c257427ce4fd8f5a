//! # Lifecycle events emitted by offload tasks.
//!
//! The [`EventKind`] enum classifies event types across two categories:
//! - **Phase events**: the task moving through pre, background and post phases
//! - **Terminal events**: exactly one of completed, cancelled or failed per task
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the task id,
//! reasons, and delays.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use offload::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::TaskSubmitted)
//!     .with_task(3)
//!     .with_delay(Duration::from_millis(250));
//!
//! assert_eq!(ev.kind, EventKind::TaskSubmitted);
//! assert_eq!(ev.task, Some(3));
//! assert_eq!(ev.delay_ms, Some(250));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of task lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `reason`: subscriber name and panic message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `reason`: subscriber name and "full" / "closed"
    SubscriberOverflow,

    // === Phase events ===
    /// Task was built and handed to the host.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `delay_ms`: start delay, when built through `after`
    TaskSubmitted,

    /// Task moved to Running; `pre_execute` already ran on the creating thread.
    ///
    /// Sets:
    /// - `task`: task id
    TaskStarted,

    /// Worker is about to invoke the `background` handler (after any delay).
    ///
    /// Sets:
    /// - `task`: task id
    BackgroundStarted,

    /// Background handler reported a progress value.
    ///
    /// Sets:
    /// - `task`: task id
    ProgressReported,

    /// Cancellation was requested and the flag flipped.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `reason`: "interrupt" when the delay may be cut short
    CancelRequested,

    // === Terminal events ===
    /// `completion` was dispatched; status is Finished.
    ///
    /// Sets:
    /// - `task`: task id
    TaskCompleted,

    /// `cancelled` was dispatched; status is Cancelled.
    ///
    /// Sets:
    /// - `task`: task id
    TaskCancelled,

    /// Background handler panicked without a prior cancellation.
    ///
    /// Sets:
    /// - `task`: task id
    /// - `reason`: panic message
    TaskFailed,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,

    /// Start delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
    /// Human-readable reason (panic message, overflow details, etc.).
    pub reason: Option<Arc<str>>,
    /// Id of the task, if applicable.
    pub task: Option<u64>,
    /// Event classification.
    pub kind: EventKind,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            delay_ms: None,
            reason: None,
            task: None,
            kind,
        }
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a task id.
    #[inline]
    pub fn with_task(mut self, task: u64) -> Self {
        self.task = Some(task);
        self
    }

    /// Attaches a start delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_reason(format!("subscriber={subscriber} info={info}"))
    }

    /// Returns `true` for the three events that end a task.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            EventKind::TaskCompleted | EventKind::TaskCancelled | EventKind::TaskFailed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::TaskStarted);
        let b = Event::new(EventKind::TaskStarted);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_delay_saturates() {
        let ev = Event::new(EventKind::TaskSubmitted).with_delay(Duration::from_secs(u64::MAX));
        assert_eq!(ev.delay_ms, Some(u32::MAX));
    }

    #[test]
    fn test_terminal_kinds() {
        assert!(Event::new(EventKind::TaskFailed).is_terminal());
        assert!(Event::new(EventKind::TaskCancelled).is_terminal());
        assert!(!Event::new(EventKind::CancelRequested).is_terminal());
    }
}
