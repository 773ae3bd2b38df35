use std::sync::mpsc as std_mpsc;
use std::time::Duration;

use taskfold::{
    Assigns, Config, Event, EventKind, Outcome, Owner, RuntimeError, Signal, Socket, TaskError,
    Work,
};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
enum Msg {
    Refresh,
}

/// Cancels `shutdown` once an event of `kind` has been observed.
fn stop_on(mut events: broadcast::Receiver<Event>, kind: EventKind, shutdown: CancellationToken) {
    tokio::spawn(async move {
        while let Ok(ev) = events.recv().await {
            if ev.kind == kind {
                shutdown.cancel();
                break;
            }
        }
    });
}

#[tokio::test]
async fn stale_result_is_discarded_end_to_end() {
    let socket = Socket::connected().with("value", 0_i64);
    let (mut owner, inbox) = Owner::<_, Msg>::mount(socket, Config::default());

    let (release_old, gate) = std_mpsc::channel::<()>();
    owner
        .start_async(
            "value",
            Work::new(move |_| {
                let _ = gate.recv();
                Ok(Outcome::new().set("value", 1))
            }),
        )
        .unwrap();
    owner
        .start_async("value", Work::new(|_| Ok(Outcome::new().set("value", 2))))
        .unwrap();

    let shutdown = CancellationToken::new();
    let mut events = owner.coordinator().subscribe();
    stop_on(owner.coordinator().subscribe(), EventKind::ResultDiscarded, shutdown.clone());
    tokio::spawn(async move {
        while let Ok(ev) = events.recv().await {
            if ev.kind == EventKind::ResultApplied {
                let _ = release_old.send(());
                break;
            }
        }
    });

    let socket = tokio::time::timeout(
        Duration::from_secs(5),
        owner.run(inbox, shutdown, |_, signal| panic!("unexpected signal {signal:?}")),
    )
    .await
    .expect("owner loop did not stop")
    .unwrap();

    assert_eq!(socket.get("value"), Some(&2));
}

#[tokio::test]
async fn crash_of_active_task_ends_the_owner() {
    let socket = Socket::connected().with("value", 0_i64);
    let (mut owner, inbox) = Owner::<_, Msg>::mount(socket, Config::default());

    owner
        .start_async("value", Work::new(|_| Err(TaskError::fail("backend unavailable"))))
        .unwrap();

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        owner.run(inbox, CancellationToken::new(), |_, _| Ok(())),
    )
    .await
    .expect("owner loop did not stop");

    match result {
        Err(RuntimeError::TaskCrashed { key, cause, .. }) => {
            assert_eq!(key.as_ref().map(|k| k.as_str()), Some("value"));
            assert_eq!(cause, TaskError::fail("backend unavailable"));
        }
        other => panic!("expected fatal crash, got {other:?}"),
    }
}

#[tokio::test]
async fn other_messages_reach_the_owner_handler() {
    let socket = Socket::connected().with("refreshes", 0_i64);
    let (owner, inbox) = Owner::<_, Msg>::mount(socket, Config::default());

    let mailbox = owner.mailbox();
    mailbox.send(Signal::Other(Msg::Refresh)).unwrap();
    mailbox.send(Signal::Other(Msg::Refresh)).unwrap();

    let shutdown = CancellationToken::new();
    stop_on(owner.coordinator().subscribe(), EventKind::ResultApplied, shutdown.clone());

    let mut seen = 0;
    let socket = tokio::time::timeout(
        Duration::from_secs(5),
        owner.run(inbox, shutdown, move |owner, signal| {
            match signal {
                Signal::Other(Msg::Refresh) => {
                    seen += 1;
                    if seen == 2 {
                        owner.start_async(
                            "refresh",
                            Work::new(|_| Ok(Outcome::new().update("refreshes", |n: i64| n + 2))),
                        )?;
                    }
                }
                other => panic!("unexpected signal {other:?}"),
            }
            Ok(())
        }),
    )
    .await
    .expect("owner loop did not stop")
    .unwrap();

    assert_eq!(socket.get("refreshes"), Some(&2));
}

#[tokio::test]
async fn shutdown_cancels_outstanding_tasks() {
    let socket = Socket::connected();
    let (mut owner, inbox) = Owner::<Socket<i64>, Msg>::mount(socket, Config::default());

    let (_keep_gate_open, gate) = std_mpsc::channel::<()>();
    owner
        .start_async(
            "slow",
            Work::new(move |ctx: CancellationToken| {
                while !ctx.is_cancelled() {
                    let _ = gate.recv_timeout(Duration::from_millis(10));
                }
                Err(TaskError::Canceled)
            }),
        )
        .unwrap();

    let mut events = owner.coordinator().subscribe();
    let shutdown = CancellationToken::new();
    shutdown.cancel();

    owner.run(inbox, shutdown, |_, _| Ok(())).await.unwrap();

    let canceled = std::iter::from_fn(|| events.try_recv().ok())
        .any(|ev| ev.kind == EventKind::TaskCanceled);
    assert!(canceled, "outstanding task was not canceled on shutdown");
}

#[test]
fn sync_mode_behaves_like_concurrent_mode() {
    let socket = Socket::connected().with("count", 5_i64);
    let (mut owner, _inbox) = Owner::<_, ()>::mount(socket, Config::synchronous());

    owner
        .start_async("count", Work::new(|_| Ok(Outcome::new().update("count", |n: i64| n + 1))))
        .unwrap();
    owner.assigns_mut().put("count", 10);
    owner
        .start_async("count", Work::new(|_| Ok(Outcome::new().update("count", |n: i64| n + 1))))
        .unwrap();

    assert_eq!(owner.assigns().get("count"), Some(&11));
    assert!(owner.coordinator().registry().is_empty());
}
