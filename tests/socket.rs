//! Management-socket protocol tests: standalone server plus the
//! supervisor-installed health actions.

use std::time::Duration;

use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use foreman::socket::{Action, Response, SocketClient, SocketServer, STATUS_ERR, STATUS_OK};
use foreman::{
    AppInfo, RestartPolicy, Supervisor, WorkerContext, WorkerError, WorkerFn, WorkerName,
    WorkerState,
};

#[tokio::test]
async fn custom_action_and_unknown_action() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mgmt.socket");

    let echo = Action::new("echo", |req| Response::ok(req.args));
    let server = SocketServer::new(&path, vec![echo]);

    let token = CancellationToken::new();
    let serving = tokio::spawn(server.serve(token.clone()));
    sleep(Duration::from_millis(50)).await;

    let client = SocketClient::new(&path);

    let resp = client
        .call("echo", serde_json::json!({"n": 3}))
        .await
        .unwrap();
    assert_eq!(resp.status, STATUS_OK);
    assert_eq!(resp.data["n"], 3);

    let resp = client.call("nope", serde_json::Value::Null).await.unwrap();
    assert_eq!(resp.status, STATUS_ERR);
    assert_eq!(resp.error, "unknown_action");

    token.cancel();
    serving.await.unwrap().unwrap();
    assert!(!path.exists(), "socket file must be removed on shutdown");
}

#[tokio::test]
async fn supervisor_exposes_status_and_ping() {
    let app = AppInfo {
        name: format!("foreman-it-{}", std::process::id()),
        version: "0.3.0".into(),
        build: "test".into(),
        tag: String::new(),
    };
    let path = app.socket_path();

    let idle = WorkerFn::arc(|ctx: WorkerContext| async move {
        ctx.cancelled().await;
        Ok::<_, WorkerError>(())
    });

    let mut chief = Supervisor::new();
    chief.add_worker("svc", idle, RestartPolicy::Never);
    chief.enable_service_socket(app.clone(), Vec::new());
    chief.set_locker(sleep(Duration::from_millis(500)));
    let _rx = chief.events().unwrap();

    let probe = {
        let path = path.clone();
        let app_name = app.name.clone();
        async move {
            sleep(Duration::from_millis(150)).await;
            let client = SocketClient::new(&path);

            assert!(client.ping().await.unwrap());

            let info = client.status().await.unwrap();
            assert_eq!(info.app.name, app_name);
            assert_eq!(
                info.workers[&WorkerName::from("svc")],
                WorkerState::Running
            );
        }
    };

    let (run, _probe) = tokio::join!(chief.run(), probe);
    run.unwrap();
}
