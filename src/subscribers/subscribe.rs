//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for observing task lifecycles without
//! registering per-task callbacks. Each subscriber is driven by a dedicated worker
//! loop fed by a bounded queue that is owned by the
//! [`SubscriberSet`](crate::subscribers::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow (I/O, batching) – they do **not** block the
//!   creating thread, the worker threads, nor other subscribers.
//! - Each subscriber **declares** its preferred queue capacity via
//!   [`Subscribe::queue_capacity`]. If a queue overflows, events for that
//!   subscriber are **dropped**.

use crate::events::Event;
use async_trait::async_trait;

/// Contract for event subscribers.
///
/// Called from a subscriber-dedicated tokio task. Implementations should avoid
/// blocking the async runtime.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use offload::{Event, EventKind, Subscribe};
///
/// struct FailureCounter;
///
/// #[async_trait]
/// impl Subscribe for FailureCounter {
///     async fn on_event(&self, event: &Event) {
///         if event.kind == EventKind::TaskFailed {
///             // increment a counter...
///         }
///     }
///
///     fn name(&self) -> &'static str {
///         "failure-counter"
///     }
/// }
/// ```
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
