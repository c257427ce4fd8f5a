//! # Example: progress_and_cancel
//!
//! Streams progress from a long-running task, then cancels it cooperatively.
//!
//! Shows how to:
//! - Report progress with [`TaskHandle::report_progress`] from inside `background`.
//! - Poll [`TaskHandle::is_cancelled`] to stop early.
//! - Receive `cancelled` instead of `completion` once cancellation wins.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► Offload::spawn_with(config, work)
//!   │     └─► worker: loop { is_cancelled()? ; report_progress(step) ; sleep }
//!   ├─► MainLoop::run_until(3 progress values seen)
//!   │     └─► progress(step) on this thread
//!   ├─► task.cancel(false)
//!   └─► MainLoop::run_until(cancelled)
//!         └─► cancelled(Some(&partial))
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example progress_and_cancel
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use offload::{MainLoop, Offload, TaskConfig, TaskHandle};
use tokio::runtime::Handle;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    println!("=== progress_and_cancel example ===\n");

    let mut main_loop = MainLoop::new();
    let offload = Offload::new(main_loop.host(Handle::current()));

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&seen);

    let config = TaskConfig::<u32, u32>::new()
        .progress(move |step| {
            counter.fetch_add(1, Ordering::SeqCst);
            println!("[progress] step {step}");
        })
        .cancelled(|partial| println!("[cancelled] stopped after {partial:?} steps"))
        .completion(|_| println!("[done] never printed: the task is cancelled first"));

    let task: TaskHandle<u32, u32> = offload.spawn_with(config, |task| {
        let mut steps = 0;
        while !task.is_cancelled() && steps < 1_000 {
            steps += 1;
            task.report_progress(steps);
            std::thread::sleep(Duration::from_millis(50));
        }
        steps
    });

    main_loop
        .run_until(|| seen.load(Ordering::SeqCst) >= 3, Duration::from_secs(5))
        .await?;

    println!("\n[main] requesting cancellation");
    let accepted = task.cancel(false);
    println!("[main] cancel accepted: {accepted}");

    main_loop
        .run_until(|| task.status().is_terminal(), Duration::from_secs(5))
        .await?;

    println!("\nstatus = {:?}, result() = {:?}", task.status(), task.result());
    Ok(())
}
