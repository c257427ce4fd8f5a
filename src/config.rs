//! # Façade configuration.
//!
//! Provides [`Config`] centralized settings for an [`Offload`](crate::Offload) façade.
//!
//! ## Sentinel values
//! - `long_delay = 0s` → never warn about long `after` delays

use std::time::Duration;

/// Configuration shared by every task an [`Offload`](crate::Offload) builds.
///
/// ## Field semantics
/// - `bus_capacity`: Event bus ring buffer size (min 1; clamped by Bus)
/// - `long_delay`: `after` delays above this log a warning (`0s` = disabled)
#[derive(Clone, Debug)]
pub struct Config {
    /// Capacity of the lifecycle event broadcast channel ring buffer.
    ///
    /// Receivers that lag behind more than `bus_capacity` events observe
    /// `Lagged` and skip older items.
    pub bus_capacity: usize,

    /// Threshold above which an `after` delay is reported as suspicious.
    ///
    /// The delay blocks a worker thread for its whole duration, so it is meant
    /// for a few seconds at most; longer waits belong to a real scheduler.
    pub long_delay: Duration,
}

impl Config {
    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Returns the long-delay warning threshold as an `Option`.
    ///
    /// - `None` → never warn
    /// - `Some(d)` → warn for delays strictly above `d`
    #[inline]
    pub fn long_delay_warning(&self) -> Option<Duration> {
        if self.long_delay == Duration::ZERO {
            None
        } else {
            Some(self.long_delay)
        }
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `bus_capacity = 1024`
    /// - `long_delay = 10s`
    fn default() -> Self {
        Self {
            bus_capacity: 1024,
            long_delay: Duration::from_secs(10),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_long_delay_disables_warning() {
        let cfg = Config {
            long_delay: Duration::ZERO,
            ..Config::default()
        };
        assert_eq!(cfg.long_delay_warning(), None);
        assert_eq!(
            Config::default().long_delay_warning(),
            Some(Duration::from_secs(10))
        );
    }

    #[test]
    fn test_bus_capacity_clamped() {
        let cfg = Config {
            bus_capacity: 0,
            ..Config::default()
        };
        assert_eq!(cfg.bus_capacity_clamped(), 1);
    }
}
