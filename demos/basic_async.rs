//! # Example: basic_async
//!
//! Runs one task off the creating thread and receives its result back on it.
//!
//! Shows how to:
//! - Build a [`TaskConfig`] with `pre_execute` and `completion` hooks.
//! - Submit work through [`Offload::spawn_with`].
//! - Pump a [`MainLoop`] until the task finishes.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► Offload::spawn_with(config, work)
//!   │     ├─► pre_execute()            (this thread, before spawn_with returns)
//!   │     └─► work(&task) on a worker  (tokio blocking pool)
//!   └─► MainLoop::run_until(finished)
//!         └─► completion(Some(&sum))   (this thread)
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example basic_async
//! ```

use std::time::Duration;

use offload::{MainLoop, Offload, TaskConfig, TaskHandle};
use tokio::runtime::Handle;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    println!("=== basic_async example ===\n");

    let mut main_loop = MainLoop::new();
    let offload = Offload::new(main_loop.host(Handle::current()));
    let creator = std::thread::current().id();

    let config = TaskConfig::<u64>::new()
        .pre_execute(|| println!("[pre] preparing input"))
        .completion(move |sum| {
            assert_eq!(std::thread::current().id(), creator);
            println!("[done] sum of squares = {}", sum.copied().unwrap_or_default());
        });

    let task: TaskHandle<u64> = offload.spawn_with(config, |_task| {
        println!("[work] running on {:?}", std::thread::current().name());
        (1..=1_000u64).map(|n| n * n).sum()
    });

    main_loop
        .run_until(|| task.is_finished(), Duration::from_secs(5))
        .await?;

    println!("\nresult() = {:?}", task.result());
    Ok(())
}
