//! # offload
//!
//! **Offload** is a small façade for running one unit of work off the thread that
//! created it, with lifecycle callbacks delivered back on that thread.
//!
//! A task is built from up to five handlers. `background` runs on a worker; every
//! other handler runs on the creating thread. Progress values reported from the
//! worker are delivered in order, and exactly one of `completion` / `cancelled`
//! ends the task.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  TaskConfig  │   │  TaskConfig  │   │  TaskConfig  │
//!     │  (+ work)    │   │  (+ delay)   │   │              │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Offload (façade)                                                 │
//! │  - spawn / spawn_with / after / after_with                        │
//! │  - Bus (broadcast events)                                         │
//! │  - SubscriberSet (fans out to user subscribers)                   │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!     ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//!     │  TaskHandle  │   │  TaskHandle  │   │  TaskHandle  │
//!     └──────┬───────┘   └──────┬───────┘   └──────┬───────┘
//!            ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Host                                                             │
//! │  - spawn_background: worker pool                                  │
//! │  - post: creating-thread FIFO (MainLoop)                          │
//! │  - sleep: interruptible start delay                               │
//! │  - unhandled: background failures                                 │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ### Lifecycle
//! ```text
//! Pending ─► Running ─┬─► Finished   (completion(Some(&result)))
//!                     ├─► Cancelled  (cancelled(result or None))
//!                     └─► Failed     (background panicked; Host::unhandled)
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                      |
//! |-------------------|---------------------------------------------------------------|-----------------------------------------|
//! | **Façade**        | Build and submit tasks, optionally after a delay.             | [`Offload`], [`OffloadBuilder`]         |
//! | **Tasks**         | Handlers, progress, cancellation, status and result.          | [`TaskConfig`], [`TaskHandle`], [`Handler`] |
//! | **Hosts**         | Where background work and creating-thread work run.           | [`Host`], [`TokioHost`], [`MainLoop`]   |
//! | **Subscriber API**| Hook into task lifecycle events (logging, metrics).           | [`Subscribe`], [`Event`]                |
//! | **Errors**        | Typed failures handed to the host or the main loop.           | [`TaskError`], [`RuntimeError`]         |
//! | **Configuration** | Bus capacity and the long-delay warning.                      | [`Config`]                              |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] backed by `tracing`.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use offload::{Config, MainLoop, Offload, TaskConfig, TaskHandle};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut main_loop = MainLoop::new();
//!
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn offload::Subscribe>> = vec![Arc::new(offload::LogWriter::default())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn offload::Subscribe>> = Vec::new();
//!
//!     let offload = Offload::builder(Config::default())
//!         .with_subscribers(subs)
//!         .build(main_loop.host(tokio::runtime::Handle::current()));
//!
//!     let config = TaskConfig::<usize, usize>::new()
//!         .progress(|done| println!("{done} items done"))
//!         .completion(|total| println!("finished with {total:?}"));
//!
//!     let task: TaskHandle<usize, usize> = offload.spawn_with(config, |task| {
//!         for i in 1..=3 {
//!             task.report_progress(i);
//!         }
//!         3
//!     });
//!
//!     main_loop
//!         .run_until(|| task.is_finished(), Duration::from_secs(5))
//!         .await?;
//!     assert_eq!(task.result().as_deref(), Some(&3));
//!
//!     offload.shutdown().await;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use config::Config;
pub use core::{
    Host, HostRef, Job, MainLoop, MainSender, Offload, OffloadBuilder, TaskHandle, TaskStatus,
    TokioHost,
};
pub use error::{RuntimeError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use subscribers::{Subscribe, SubscriberSet};
pub use tasks::{CallbackKind, Handler, TaskConfig};

// Optional: expose a simple built-in logger subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
