//! End-to-end message routing between supervised workers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::sleep;

use foreman::{
    Message, MessageKind, RestartPolicy, Supervisor, WorkerContext, WorkerError, WorkerFn,
    WorkerRef,
};

type Seen = Arc<Mutex<Vec<(String, Option<MessageKind>, String)>>>;

fn note(seen: &Seen, msg: &Message) {
    let data = msg.data_ref::<String>().cloned().unwrap_or_default();
    seen.lock()
        .unwrap()
        .push((msg.sender.as_str().to_owned(), msg.kind, data));
}

/// A worker that records every inbound message until cancelled.
fn collector(seen: Seen) -> WorkerRef {
    WorkerFn::arc(move |ctx: WorkerContext| {
        let seen = Arc::clone(&seen);
        async move {
            loop {
                tokio::select! {
                    _ = ctx.cancelled() => return Ok::<(), WorkerError>(()),
                    msg = ctx.mailbox().recv() => {
                        if let Some(msg) = msg {
                            note(&seen, &msg);
                        }
                    }
                }
            }
        }
    })
}

#[tokio::test]
async fn unicast_and_broadcast_delivery() {
    let a_seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let b_seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let c_seen: Seen = Arc::new(Mutex::new(Vec::new()));

    let a_log = Arc::clone(&a_seen);
    let sender = WorkerFn::arc(move |ctx: WorkerContext| {
        let seen = Arc::clone(&a_log);
        async move {
            ctx.mailbox()
                .send_to_many(1, String::from("hi"), ["b", "c"])
                .await;
            ctx.mailbox().send("*", String::from("all")).await;
            loop {
                tokio::select! {
                    _ = ctx.cancelled() => return Ok::<_, WorkerError>(()),
                    msg = ctx.mailbox().recv() => {
                        if let Some(msg) = msg {
                            note(&seen, &msg);
                        }
                    }
                }
            }
        }
    });

    let mut chief = Supervisor::new();
    chief.add_worker("a", sender, RestartPolicy::Never);
    chief.add_worker("b", collector(Arc::clone(&b_seen)), RestartPolicy::Never);
    chief.add_worker("c", collector(Arc::clone(&c_seen)), RestartPolicy::Never);
    chief.set_locker(sleep(Duration::from_millis(400)));
    let _rx = chief.events().unwrap();

    chief.run().await.unwrap();

    let expected = vec![
        (String::from("a"), Some(1), String::from("hi")),
        (String::from("a"), None, String::from("all")),
    ];
    assert_eq!(*b_seen.lock().unwrap(), expected);
    assert_eq!(*c_seen.lock().unwrap(), expected);
    // the sender receives neither its unicasts nor its own broadcast
    assert!(a_seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn nop_broker_swallows_traffic() {
    let b_seen: Seen = Arc::new(Mutex::new(Vec::new()));

    let sender = WorkerFn::arc(|ctx: WorkerContext| async move {
        ctx.mailbox().send("b", String::from("void")).await;
        ctx.cancelled().await;
        Ok::<_, WorkerError>(())
    });

    let mut chief = Supervisor::new();
    chief.use_nop_broker();
    chief.add_worker("a", sender, RestartPolicy::Never);
    chief.add_worker("b", collector(Arc::clone(&b_seen)), RestartPolicy::Never);
    chief.set_locker(sleep(Duration::from_millis(200)));
    let _rx = chief.events().unwrap();

    chief.run().await.unwrap();
    assert!(b_seen.lock().unwrap().is_empty());
}
