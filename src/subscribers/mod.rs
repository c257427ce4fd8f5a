//! # Event subscribers.
//!
//! This module provides the [`Subscribe`] trait and the [`SubscriberSet`] fan-out
//! that delivers lifecycle events broadcast through the [`Bus`](crate::events::Bus).
//!
//! ## Architecture
//! ```text
//! TaskHandle ── publish(Event) ──► Bus ──► Offload listener ──► SubscriberSet
//!                                                                  │
//!                                                   ┌──────────────┼──────────┐
//!                                                   ▼              ▼          ▼
//!                                               LogWriter       Metrics    Custom
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
