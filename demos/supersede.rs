//! # Example: supersede
//!
//! A search box that fires a new lookup on every keystroke. Each lookup is
//! started under the same key, so only the newest one can ever land in state;
//! older lookups keep running and their results are dropped.
//!
//! ## Flow
//! ```text
//! main()
//!   ├─► Owner::mount(socket)
//!   ├─► post Other(Keystroke("r")), Other(Keystroke("ru")), Other(Keystroke("rust"))
//!   └─► Owner::run()
//!         ├─► on_info(Keystroke) ─► start_async("results", lookup(query))
//!         │     └─► previous lookup demoted to ignored (keeps running)
//!         ├─► Completion(rust)   ─► applied
//!         ├─► Completion(r / ru) ─► discarded
//!         └─► shutdown once every lookup has reported back
//! ```
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example supersede
//! ```

use std::time::Duration;

use taskfold::{Assigns, Config, EventKind, Outcome, Owner, Signal, Socket, Work};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum Msg {
    Keystroke(&'static str),
}

/// Slow lookup; shorter queries take longer so stale results arrive last.
fn lookup(query: &'static str) -> Work<String> {
    Work::new(move |_ctx: CancellationToken| {
        std::thread::sleep(Duration::from_millis(400 / query.len() as u64));
        Ok(Outcome::new().set("results", format!("matches for {query:?}")))
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let socket = Socket::connected().with("results", String::new());
    let (owner, inbox) = Owner::<_, Msg>::mount(socket, Config::default());

    let mailbox = owner.mailbox();
    for query in ["r", "ru", "rust"] {
        mailbox
            .send(Signal::Other(Msg::Keystroke(query)))
            .map_err(|_| anyhow::anyhow!("owner inbox closed"))?;
    }

    // 1 applied + 2 discarded
    let shutdown = CancellationToken::new();
    let mut events = owner.coordinator().subscribe();
    let stop = shutdown.clone();
    tokio::spawn(async move {
        let mut reported = 0;
        while let Ok(ev) = events.recv().await {
            if matches!(ev.kind, EventKind::ResultApplied | EventKind::ResultDiscarded) {
                println!("[{:?}] token={:?}", ev.kind, ev.token);
                reported += 1;
                if reported == 3 {
                    stop.cancel();
                }
            }
        }
    });

    let socket = owner
        .run(inbox, shutdown, |owner, signal| {
            if let Signal::Other(Msg::Keystroke(query)) = signal {
                println!("[keystroke] query={query:?}");
                owner.start_async("results", lookup(query))?;
            }
            Ok(())
        })
        .await?;

    println!("final results: {:?}", socket.get("results"));
    Ok(())
}
