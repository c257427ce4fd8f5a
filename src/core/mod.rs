//! Runtime core: task state machine, hosts and the façade.
//!
//! The public surface of this module is [`Offload`] (with its builder), the
//! [`TaskHandle`] it returns, and the [`Host`] seam with its tokio-backed
//! implementation.
//!
//! Internal modules:
//! - [`task`]: lifecycle, cancellation and handler dispatch of a single task;
//! - [`host`]: the background/creating-thread execution seam;
//! - [`main_loop`]: creating-thread FIFO dispatcher and [`TokioHost`];
//! - [`facade`]: builds tasks and hands them to the host;
//! - [`builder`]: wires config, bus and subscribers into a façade.

mod builder;
mod facade;
mod host;
mod main_loop;
mod task;

pub use builder::OffloadBuilder;
pub use facade::Offload;
pub use host::{Host, HostRef, Job};
pub use main_loop::{MainLoop, MainSender, TokioHost};
pub use task::{TaskHandle, TaskStatus};
