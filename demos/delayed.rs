//! # Example: delayed
//!
//! Schedules work with a start delay and watches the lifecycle through
//! [`LogWriter`] events.
//!
//! Shows how to:
//! - Wire a subscriber through [`Offload::builder`].
//! - Start work later with [`Offload::after_with`].
//! - Cut a pending delay short with `cancel(true)`.
//! - Attach `completion` after the fact and get it replayed.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► after_with(300ms, work)  ──► TaskSubmitted{delay_ms=300}
//!   ├─► after_with(60s, work)    ──► cancel(true): delay interrupted, cancelled(None)
//!   ├─► MainLoop::run_until(both terminal)
//!   ├─► on_completion(...) on the finished task ──► replayed immediately
//!   └─► Offload::shutdown() (drains LogWriter)
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=offload=debug cargo run --example delayed --features logging
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use offload::{Config, LogWriter, MainLoop, Offload, Subscribe, TaskConfig, TaskHandle};
use tokio::runtime::Handle;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== delayed example ===\n");

    let mut main_loop = MainLoop::new();
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let offload = Offload::builder(Config::default())
        .with_subscribers(subs)
        .build(main_loop.host(Handle::current()));

    let started = Instant::now();
    let soon: TaskHandle<Duration> =
        offload.after_with(Duration::from_millis(300), TaskConfig::new(), move |_task| {
            started.elapsed()
        });

    let never: TaskHandle = offload.after_with(
        Duration::from_secs(60),
        TaskConfig::new().cancelled(|_| println!("[never] delay interrupted")),
        |_task| println!("[never] this does not run"),
    );
    never.cancel(true);

    main_loop
        .run_until(
            || soon.is_finished() && never.status().is_terminal(),
            Duration::from_secs(5),
        )
        .await?;

    soon.on_completion(|elapsed| println!("[soon] replayed: background started after {elapsed:?}"));

    offload.shutdown().await;
    Ok(())
}
