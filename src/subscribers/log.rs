//! # LogWriter — lifecycle events as tracing records
//!
//! A minimal subscriber that renders incoming [`Event`]s through `tracing`.
//! Use it for debugging or demos; install any `tracing` subscriber to see output.
//!
//! ## Example output (with `tracing_subscriber::fmt`)
//! ```text
//! INFO offload: [submitted] task=3 delay_ms=Some(2000)
//! DEBUG offload: [started] task=3
//! DEBUG offload: [background] task=3
//! INFO offload: [completed] task=3
//! WARN offload: [cancel-requested] task=4 reason=Some("interrupt")
//! ERROR offload: [failed] task=5 reason=Some("boom")
//! ```

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;
use async_trait::async_trait;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let task = e.task.unwrap_or_default();
        match e.kind {
            EventKind::TaskSubmitted => {
                tracing::info!(target: "offload", "[submitted] task={task} delay_ms={:?}", e.delay_ms);
            }
            EventKind::TaskStarted => {
                tracing::debug!(target: "offload", "[started] task={task}");
            }
            EventKind::BackgroundStarted => {
                tracing::debug!(target: "offload", "[background] task={task}");
            }
            EventKind::ProgressReported => {
                tracing::trace!(target: "offload", "[progress] task={task}");
            }
            EventKind::CancelRequested => {
                tracing::warn!(target: "offload", "[cancel-requested] task={task} reason={:?}", e.reason);
            }
            EventKind::TaskCompleted => {
                tracing::info!(target: "offload", "[completed] task={task}");
            }
            EventKind::TaskCancelled => {
                tracing::info!(target: "offload", "[cancelled] task={task}");
            }
            EventKind::TaskFailed => {
                tracing::error!(target: "offload", "[failed] task={task} reason={:?}", e.reason);
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(target: "offload", "[subscriber-overflow] {}", e.reason.as_deref().unwrap_or("unknown"));
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(target: "offload", "[subscriber-panicked] {}", e.reason.as_deref().unwrap_or("unknown"));
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
