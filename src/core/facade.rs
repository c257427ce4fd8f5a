//! # Offload: the task façade.
//!
//! The [`Offload`] owns the [`Host`], the event [`Bus`], and (optionally) a
//! [`SubscriberSet`]. Every call to [`spawn`](Offload::spawn) or
//! [`after`](Offload::after) builds exactly one task from a [`TaskConfig`] and
//! hands it to the host before returning the live [`TaskHandle`].
//!
//! ## High-level architecture
//! ```text
//! Inputs:
//!   TaskConfig (+ trailing work) ──► Offload::spawn / spawn_with / after / after_with
//!
//! Build + submit (synchronous, on the caller's thread):
//!   TaskHandle::new(config, host, bus)
//!       └──► execute(): status Running, pre_execute(), host.spawn_background(...)
//!
//! Event flow:
//!   TaskHandle ── publish(Event) ──► Bus ──► listener ──► SubscriberSet::emit(&Event)
//!                                     └────► Offload::subscribe() receivers
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use offload::{MainLoop, Offload, TaskConfig, TaskHandle};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut main_loop = MainLoop::new();
//!     let offload = Offload::new(main_loop.host(tokio::runtime::Handle::current()));
//!
//!     let task: TaskHandle<u64> = offload.spawn_with(TaskConfig::new(), |_task| {
//!         (1..=20u64).product()
//!     });
//!
//!     main_loop
//!         .run_until(|| task.is_finished(), Duration::from_secs(5))
//!         .await?;
//!     assert_eq!(task.result().as_deref(), Some(&2_432_902_008_176_640_000));
//!     Ok(())
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::core::builder::OffloadBuilder;
use crate::core::host::{Host, HostRef};
use crate::core::task::TaskHandle;
use crate::events::{Bus, Event};
use crate::subscribers::SubscriberSet;
use crate::tasks::TaskConfig;

/// Background listener forwarding bus events to the subscriber set.
struct Listener {
    token: CancellationToken,
    join: JoinHandle<SubscriberSet>,
}

/// Builds tasks and submits them to a host.
pub struct Offload {
    cfg: Config,
    host: HostRef,
    bus: Bus,
    listener: Option<Listener>,
}

impl Offload {
    /// Creates a façade with default [`Config`] and no subscribers.
    pub fn new<H: Host>(host: H) -> Self {
        OffloadBuilder::new(Config::default()).build(host)
    }

    /// Returns a builder for configuring subscribers and settings.
    pub fn builder(cfg: Config) -> OffloadBuilder {
        OffloadBuilder::new(cfg)
    }

    pub(crate) fn new_internal(cfg: Config, host: HostRef, bus: Bus, subs: SubscriberSet) -> Self {
        let listener = if subs.is_empty() {
            None
        } else {
            Some(Self::subscriber_listener(&bus, subs))
        };
        Self {
            cfg,
            host,
            bus,
            listener,
        }
    }

    /// Subscribes to the bus and forwards events to the subscriber set.
    ///
    /// Pending events are drained before the listener honours its stop token.
    fn subscriber_listener(bus: &Bus, set: SubscriberSet) -> Listener {
        let mut rx = bus.subscribe();
        let token = CancellationToken::new();
        let stop = token.clone();
        let join = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    res = rx.recv() => match res {
                        Ok(ev) => set.emit(&ev),
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "event listener lagged behind the bus");
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                    _ = stop.cancelled() => break,
                }
            }
            set
        });
        Listener { token, join }
    }

    /// Builds a task from `config` and submits it immediately.
    ///
    /// `pre_execute` runs before this returns, on the calling thread.
    pub fn spawn<R, P>(&self, config: TaskConfig<R, P>) -> TaskHandle<R, P>
    where
        R: Send + Sync + 'static,
        P: Send + 'static,
    {
        let task = TaskHandle::new(config, Arc::clone(&self.host), self.bus.clone());
        task.execute();
        task
    }

    /// Like [`spawn`](Self::spawn), with `work` as the `background` handler.
    ///
    /// An explicit `background` entry in `config` wins; `work` only fills an empty slot.
    pub fn spawn_with<R, P, F>(&self, mut config: TaskConfig<R, P>, work: F) -> TaskHandle<R, P>
    where
        R: Send + Sync + 'static,
        P: Send + 'static,
        F: FnOnce(&TaskHandle<R, P>) -> R + Send + 'static,
    {
        if !config.fill_background(work) {
            tracing::debug!("explicit background handler kept; trailing work ignored");
        }
        self.spawn(config)
    }

    /// Like [`spawn`](Self::spawn), but the `background` handler starts `delay` later.
    ///
    /// The wait happens on the worker thread; the caller is never blocked.
    pub fn after<R, P>(&self, delay: Duration, config: TaskConfig<R, P>) -> TaskHandle<R, P>
    where
        R: Send + Sync + 'static,
        P: Send + 'static,
    {
        self.spawn(self.delayed(delay, config))
    }

    /// Like [`after`](Self::after), with `work` as the `background` handler.
    pub fn after_with<R, P, F>(
        &self,
        delay: Duration,
        config: TaskConfig<R, P>,
        work: F,
    ) -> TaskHandle<R, P>
    where
        R: Send + Sync + 'static,
        P: Send + 'static,
        F: FnOnce(&TaskHandle<R, P>) -> R + Send + 'static,
    {
        self.spawn_with(self.delayed(delay, config), work)
    }

    fn delayed<R, P>(&self, delay: Duration, config: TaskConfig<R, P>) -> TaskConfig<R, P> {
        if let Some(limit) = self.cfg.long_delay_warning() {
            if delay > limit {
                tracing::warn!(
                    ?delay,
                    ?limit,
                    "long start delay holds a worker thread for its whole duration"
                );
            }
        }
        config.delay(delay)
    }

    /// Creates a receiver for lifecycle events published after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.bus.subscribe()
    }

    /// Returns the façade configuration.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Returns the shared host handle.
    pub fn host(&self) -> &HostRef {
        &self.host
    }

    /// Stops the event listener after it drained pending events, then shuts
    /// down subscriber workers. Tasks already submitted keep running.
    pub async fn shutdown(self) {
        if let Some(listener) = self.listener {
            listener.token.cancel();
            match listener.join.await {
                Ok(set) => set.shutdown().await,
                Err(e) => tracing::warn!(error = %e, "event listener ended abnormally"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::host::Job;
    use crate::events::EventKind;

    /// Accepts jobs and never runs them.
    struct Parked;

    impl Host for Parked {
        fn spawn_background(&self, _job: Job) {}
        fn post(&self, _job: Job) {}
    }

    #[test]
    fn test_after_injects_delay() {
        let offload = Offload::new(Parked);
        let cfg: TaskConfig = TaskConfig::new();
        let delayed = offload.delayed(Duration::from_millis(1500), cfg);
        assert_eq!(delayed.start_delay(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_spawn_submits_synchronously() {
        let offload = Offload::new(Parked);
        let mut rx = offload.subscribe();

        let task = offload.after(Duration::from_millis(200), TaskConfig::<()>::new());
        assert!(task.is_running());

        let submitted = rx.try_recv().expect("submitted event");
        assert_eq!(submitted.kind, EventKind::TaskSubmitted);
        assert_eq!(submitted.task, Some(task.id()));
        assert_eq!(submitted.delay_ms, Some(200));
        assert_eq!(rx.try_recv().expect("started event").kind, EventKind::TaskStarted);
    }

    mod tokio_host {
        use super::super::*;
        use crate::core::main_loop::MainLoop;
        use crate::core::task::TaskStatus;
        use crate::error::TaskError;
        use crate::events::EventKind;
        use crate::subscribers::Subscribe;
        use async_trait::async_trait;
        use parking_lot::Mutex;
        use std::cell::RefCell;
        use std::rc::Rc;
        use std::thread::{self, ThreadId};
        use std::time::Instant;
        use tokio::runtime::Handle;

        const WAIT: Duration = Duration::from_secs(5);

        #[derive(Debug, PartialEq)]
        enum Step {
            Pre(ThreadId),
            Progress(u32, ThreadId),
            Done(Option<u32>, ThreadId),
        }

        #[tokio::test]
        async fn test_handlers_run_on_creating_thread() {
            let mut main_loop = MainLoop::new();
            let offload = Offload::new(main_loop.host(Handle::current()));
            let me = thread::current().id();
            let log = Arc::new(Mutex::new(Vec::new()));
            let worker = Arc::new(Mutex::new(None));

            let (l1, l2, l3) = (log.clone(), log.clone(), log.clone());
            let config = TaskConfig::<u32, u32>::new()
                .pre_execute(move || l1.lock().push(Step::Pre(thread::current().id())))
                .progress(move |v| l2.lock().push(Step::Progress(v, thread::current().id())))
                .completion(move |r| l3.lock().push(Step::Done(r.copied(), thread::current().id())));

            let w = worker.clone();
            let task = offload.spawn_with(config, move |task| {
                *w.lock() = Some((thread::current().id(), task.is_running()));
                for i in 0..10 {
                    task.report_progress(i);
                }
                42
            });
            assert_eq!(*log.lock(), vec![Step::Pre(me)]);

            main_loop.run_until(|| task.is_finished(), WAIT).await.unwrap();

            let mut expected = vec![Step::Pre(me)];
            expected.extend((0..10).map(|i| Step::Progress(i, me)));
            expected.push(Step::Done(Some(42), me));
            assert_eq!(*log.lock(), expected);

            let (worker_thread, was_running) = worker.lock().expect("background ran");
            assert_ne!(worker_thread, me);
            assert!(was_running);
            assert_eq!(task.result().as_deref(), Some(&42));
        }

        #[tokio::test]
        async fn test_cancel_right_after_submit() {
            let mut main_loop = MainLoop::new();
            let offload = Offload::new(main_loop.host(Handle::current()));
            let fired = Arc::new(Mutex::new(Vec::new()));

            let (c, d) = (fired.clone(), fired.clone());
            let config = TaskConfig::<u32>::new()
                .cancelled(move |_| c.lock().push("cancelled"))
                .completion(move |_| d.lock().push("completion"));
            let task = offload.spawn_with(config, |task| {
                while !task.is_cancelled() {
                    std::thread::sleep(Duration::from_millis(5));
                }
                7
            });
            assert!(task.cancel(true));
            assert!(!task.cancel(true));

            main_loop
                .run_until(|| task.status().is_terminal(), WAIT)
                .await
                .unwrap();
            assert_eq!(task.status(), TaskStatus::Cancelled);
            assert_eq!(*fired.lock(), vec!["cancelled"]);
            assert!(task.result().is_none());
        }

        #[tokio::test]
        async fn test_after_waits_for_delay() {
            let mut main_loop = MainLoop::new();
            let offload = Offload::new(main_loop.host(Handle::current()));
            let delay = Duration::from_millis(200);

            let submitted = Instant::now();
            let task: TaskHandle<Duration> =
                offload.after_with(delay, TaskConfig::new(), move |_| submitted.elapsed());
            assert!(task.is_running());

            main_loop.run_until(|| task.is_finished(), WAIT).await.unwrap();
            let waited = *task.result().expect("result");
            assert!(waited >= delay, "started after {waited:?}");
            assert!(waited <= delay + Duration::from_secs(1), "started after {waited:?}");
        }

        #[tokio::test]
        async fn test_interrupt_cuts_delay_short() {
            let mut main_loop = MainLoop::new();
            let offload = Offload::new(main_loop.host(Handle::current()));
            let ran = Arc::new(Mutex::new(false));
            let seen = Arc::new(Mutex::new(None));

            let (r, s) = (ran.clone(), seen.clone());
            let config = TaskConfig::<u8>::new().cancelled(move |v| *s.lock() = Some(v.copied()));
            let task = offload.after_with(Duration::from_secs(60), config, move |_| {
                *r.lock() = true;
                1
            });
            let started = Instant::now();
            task.cancel(true);

            main_loop
                .run_until(|| task.status().is_terminal(), WAIT)
                .await
                .unwrap();
            assert!(started.elapsed() < Duration::from_secs(2));
            assert!(!*ran.lock());
            assert_eq!(*seen.lock(), Some(None));
        }

        #[tokio::test]
        async fn test_late_completion_replays() {
            let mut main_loop = MainLoop::new();
            let offload = Offload::new(main_loop.host(Handle::current()));
            let task: TaskHandle<String> =
                offload.spawn_with(TaskConfig::new(), |_| "ready".to_string());
            main_loop.run_until(|| task.is_finished(), WAIT).await.unwrap();

            let got = Arc::new(Mutex::new(None));
            let g = got.clone();
            task.on_completion(move |r| *g.lock() = r.cloned());
            assert_eq!(got.lock().as_deref(), Some("ready"));
        }

        #[tokio::test]
        async fn test_no_handlers_is_harmless() {
            let mut main_loop = MainLoop::new();
            let offload = Offload::new(main_loop.host(Handle::current()));
            let task: TaskHandle = offload.spawn(TaskConfig::new());
            main_loop.run_until(|| task.is_finished(), WAIT).await.unwrap();
            assert_eq!(task.result(), None);
        }

        #[tokio::test]
        async fn test_background_panic_reaches_error_hook() {
            let errors = Rc::new(RefCell::new(Vec::new()));
            let sink = errors.clone();
            let mut main_loop = MainLoop::new().with_error_hook(move |e| sink.borrow_mut().push(e));
            let offload = Offload::new(main_loop.host(Handle::current()));

            let task: TaskHandle = offload.spawn_with(TaskConfig::new(), |_| panic!("worker blew up"));
            main_loop.run_until(|| task.is_failed(), WAIT).await.unwrap();

            assert_eq!(
                *errors.borrow(),
                vec![TaskError::BackgroundPanicked {
                    task: task.id(),
                    message: "worker blew up".into(),
                }]
            );
        }

        #[derive(Default)]
        struct Recorder {
            seen: Mutex<Vec<EventKind>>,
        }

        #[async_trait]
        impl Subscribe for Recorder {
            async fn on_event(&self, event: &Event) {
                self.seen.lock().push(event.kind);
            }

            fn name(&self) -> &'static str {
                "recorder"
            }
        }

        #[tokio::test]
        async fn test_subscribers_see_lifecycle() {
            let mut main_loop = MainLoop::new();
            let recorder = Arc::new(Recorder::default());
            let subs: Vec<Arc<dyn Subscribe>> = vec![recorder.clone()];
            let offload = Offload::builder(Config::default())
                .with_subscribers(subs)
                .build(main_loop.host(Handle::current()));

            let task: TaskHandle<(), u8> = offload.spawn_with(TaskConfig::new(), |task| {
                task.report_progress(1);
            });
            main_loop.run_until(|| task.is_finished(), WAIT).await.unwrap();
            offload.shutdown().await;

            assert_eq!(
                *recorder.seen.lock(),
                vec![
                    EventKind::TaskSubmitted,
                    EventKind::TaskStarted,
                    EventKind::BackgroundStarted,
                    EventKind::ProgressReported,
                    EventKind::TaskCompleted,
                ]
            );
        }
    }
}
