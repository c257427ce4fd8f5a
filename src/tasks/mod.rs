//! # Task configuration and callback slots.
//!
//! This module provides the data a task is built from:
//! - [`TaskConfig`] - handlers plus optional start delay, consumed by the façade
//! - [`Handler`] - a closure tagged with the hook it belongs to
//! - [`CallbackKind`] - the five hooks (`pre_execute`, `background`, `progress`,
//!   `cancelled`, `completion`)

mod callbacks;
mod config;

pub(crate) use callbacks::Callbacks;
pub use callbacks::{CallbackKind, Handler};
pub use config::TaskConfig;
