//! Coordinator link behaviour against a scripted server
//!
//! The server answers pull/push like the real one, counts pushes, and hands
//! every accepted WebSocket to the test so it can send frames or hang up.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message as WsMessage, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::sync::{mpsc, watch};
use tokio::time::{sleep, timeout};

use kanban_sync::client::{
    self, ClientConfig, ConnectionState, CoordinatorHandle, SyncStatus, SyncTimings,
};
use kanban_sync::shared::Board;

use crate::common::{board_with, WAIT};

#[derive(Clone)]
struct Shared {
    board: Board,
    pushes: Arc<AtomicUsize>,
    sockets: mpsc::UnboundedSender<WebSocket>,
}

struct ScriptedServer {
    addr: SocketAddr,
    pushes: Arc<AtomicUsize>,
    sockets: mpsc::UnboundedReceiver<WebSocket>,
}

impl ScriptedServer {
    async fn start(board: Board) -> Self {
        let (sockets_tx, sockets) = mpsc::unbounded_channel();
        let pushes = Arc::new(AtomicUsize::new(0));
        let shared = Shared {
            board,
            pushes: pushes.clone(),
            sockets: sockets_tx,
        };
        let router = Router::new()
            .route("/api/data/get", get(pull))
            .route("/api/data/sync", post(push))
            .route("/api/ws", get(upgrade))
            .with_state(shared);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        Self { addr, pushes, sockets }
    }

    fn pushes(&self) -> usize {
        self.pushes.load(Ordering::SeqCst)
    }

    async fn wait_pushes(&self, n: usize) {
        timeout(WAIT, async {
            while self.pushes() < n {
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("push never arrived");
    }

    async fn next_socket(&mut self) -> WebSocket {
        timeout(WAIT, self.sockets.recv())
            .await
            .expect("client never connected")
            .unwrap()
    }
}

async fn pull(State(shared): State<Shared>) -> Json<Value> {
    Json(json!({ "status": "success", "data": shared.board }))
}

async fn push(State(shared): State<Shared>, Json(board): Json<Board>) -> Json<Value> {
    shared.pushes.fetch_add(1, Ordering::SeqCst);
    Json(json!({ "status": "success", "data": board }))
}

async fn upgrade(State(shared): State<Shared>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| async move {
        let _ = shared.sockets.send(socket);
    })
}

fn timings() -> SyncTimings {
    SyncTimings {
        push_debounce: Duration::from_secs(60),
        fallback_interval: Duration::from_secs(3600),
        reconnect_delay: Duration::from_millis(300),
        heartbeat_interval: Duration::from_secs(3600),
        move_reconcile_delay: Duration::from_millis(500),
        request_timeout: Duration::from_secs(2),
    }
}

async fn start(server: &ScriptedServer, dir: &TempDir) -> CoordinatorHandle {
    let config = ClientConfig {
        realtime: true,
        timings: timings(),
        data_dir: Some(dir.path().to_path_buf()),
        ..ClientConfig::default()
    }
    .with_server_url(format!("http://{}", server.addr))
    .with_token("test-token");
    let (handle, _task) = client::start(config).await.unwrap();
    handle
}

async fn wait_status(
    status: &mut watch::Receiver<SyncStatus>,
    ready: impl FnMut(&SyncStatus) -> bool,
) -> SyncStatus {
    timeout(WAIT, status.wait_for(ready))
        .await
        .expect("timed out waiting for status")
        .unwrap()
        .clone()
}

fn two_columns() -> Board {
    board_with(&[("c1", "Todo"), ("c2", "Done")], &[("t1", Some("c1"))])
}

#[tokio::test]
async fn test_dropped_link_reconnects_and_pushes() {
    let mut server = ScriptedServer::start(two_columns()).await;
    let dir = TempDir::new().unwrap();
    let handle = start(&server, &dir).await;
    let mut status = handle.subscribe_status();

    let first = server.next_socket().await;
    wait_status(&mut status, |s| s.state == ConnectionState::Synced).await;
    assert_eq!(server.pushes(), 1);

    drop(first);
    let lost = wait_status(&mut status, |s| s.state == ConnectionState::Reconnecting).await;
    assert!(lost.last_error.is_some());

    let _second = server.next_socket().await;
    server.wait_pushes(2).await;
    wait_status(&mut status, |s| s.state == ConnectionState::Synced).await;
}

#[tokio::test]
async fn test_logout_stops_reconnecting() {
    let mut server = ScriptedServer::start(two_columns()).await;
    let dir = TempDir::new().unwrap();
    let handle = start(&server, &dir).await;
    let mut status = handle.subscribe_status();

    let mut socket = server.next_socket().await;
    wait_status(&mut status, |s| s.state == ConnectionState::Synced).await;

    handle.logout().unwrap();
    let closing = timeout(WAIT, socket.recv()).await.expect("link stayed open");
    assert!(matches!(closing, None | Some(Ok(WsMessage::Close(_))) | Some(Err(_))));
    drop(socket);

    let stopped = wait_status(&mut status, |s| s.state == ConnectionState::Disconnected).await;
    assert!(!stopped.needs_login);

    // Several reconnect delays pass without a new dial or push
    assert!(timeout(Duration::from_millis(1000), server.sockets.recv()).await.is_err());
    assert_eq!(server.pushes(), 1);
}

#[tokio::test]
async fn test_unknown_message_kind_triggers_resync() {
    let mut server = ScriptedServer::start(two_columns()).await;
    let dir = TempDir::new().unwrap();
    let handle = start(&server, &dir).await;
    let mut status = handle.subscribe_status();

    let mut socket = server.next_socket().await;
    wait_status(&mut status, |s| s.state == ConnectionState::Synced).await;
    assert_eq!(server.pushes(), 1);

    socket
        .send(WsMessage::Text(r#"{"type":"columnRenamed","data":{"id":"c1"}}"#.into()))
        .await
        .unwrap();
    server.wait_pushes(2).await;
}

#[tokio::test]
async fn test_task_move_applies_before_delayed_push() {
    let mut server = ScriptedServer::start(two_columns()).await;
    let dir = TempDir::new().unwrap();
    let handle = start(&server, &dir).await;
    let mut status = handle.subscribe_status();

    let mut socket = server.next_socket().await;
    wait_status(&mut status, |s| s.state == ConnectionState::Synced).await;
    assert_eq!(server.pushes(), 1);

    let mut board = handle.subscribe_board();
    socket
        .send(WsMessage::Text(
            r#"{"type":"taskMove","data":{"taskId":"t1","columnId":"c2"},"user":"alice@example.com"}"#
                .into(),
        ))
        .await
        .unwrap();

    timeout(
        WAIT,
        board.wait_for(|b| b.task("t1").and_then(|t| t.column_id.as_deref()) == Some("c2")),
    )
    .await
    .expect("move never applied")
    .unwrap();
    // Applied locally first; the full push waits for the reconcile delay
    assert_eq!(server.pushes(), 1);

    server.wait_pushes(2).await;
    sleep(Duration::from_millis(700)).await;
    assert_eq!(server.pushes(), 2);
}
