//! # Example: cancel
//!
//! Starts a long export, cancels it, and shows that its late crash signal is
//! absorbed instead of taking the owner down.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► start_async("export", long_export)
//!   ├─► sleep 200ms
//!   ├─► cancel_async("export")       ─► stop requested, token moved to canceled
//!   └─► Owner::run()
//!         ├─► Crash(Canceled)        ─► absorbed (CrashAbsorbed)
//!         └─► shutdown
//! ```
//!
//! ## Run
//! ```bash
//! cargo run --example cancel
//! ```

use std::time::Duration;

use taskfold::{Assigns, Config, EventKind, Outcome, Owner, Socket, TaskError, Work};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let socket = Socket::connected().with("exported", 0_u64);
    let (mut owner, inbox) = Owner::<_, ()>::mount(socket, Config::default());

    owner.start_async(
        "export",
        Work::new(|ctx: CancellationToken| {
            let mut rows = 0_u64;
            while rows < 1_000 {
                if ctx.is_cancelled() {
                    println!("[export] stop requested after {rows} rows");
                    return Err(TaskError::Canceled);
                }
                std::thread::sleep(Duration::from_millis(10));
                rows += 1;
            }
            Ok(Outcome::new().set("exported", rows))
        }),
    )?;

    tokio::time::sleep(Duration::from_millis(200)).await;
    println!("[main] cancel export: {}", owner.cancel_async("export"));

    let shutdown = CancellationToken::new();
    let mut events = owner.coordinator().subscribe();
    let stop = shutdown.clone();
    tokio::spawn(async move {
        while let Ok(ev) = events.recv().await {
            if ev.kind == EventKind::CrashAbsorbed {
                println!("[absorbed] token={:?} reason={:?}", ev.token, ev.reason);
                stop.cancel();
            }
        }
    });

    let socket = owner.run(inbox, shutdown, |_, _| Ok(())).await?;
    println!("owner still alive; exported={:?}", socket.get("exported"));
    Ok(())
}
