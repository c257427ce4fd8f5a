use std::sync::Arc;

use crate::{
    config::Config,
    core::host::{Host, HostRef},
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};

use super::facade::Offload;

/// Builder for constructing an [`Offload`] with optional features.
pub struct OffloadBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl OffloadBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive lifecycle events of every task built by the façade
    /// through dedicated workers with bounded queues. With at least one subscriber,
    /// [`build`](Self::build) must run inside a tokio runtime.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Builds the façade around `host`.
    pub fn build<H: Host>(self, host: H) -> Offload {
        self.build_shared(Arc::new(host))
    }

    /// Builds the façade around an already shared host.
    pub fn build_shared(self, host: HostRef) -> Offload {
        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = SubscriberSet::new(self.subscribers, bus.clone());
        Offload::new_internal(self.cfg, host, bus, subs)
    }
}
