//! Coordinator against a mocked server
//!
//! Polling mode only; the realtime link is covered by `live_test`.

use std::path::Path;
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::TempDir;
use tokio::sync::watch;
use tokio::time::timeout;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kanban_sync::client::{self, ClientConfig, ConnectionState, Edit, LocalStore, SyncStatus, SyncTimings};
use kanban_sync::shared::{Board, Task};

use crate::common::{board_with, task_ids};

const TOKEN: &str = "test-token";
const WAIT: Duration = Duration::from_secs(5);

fn timings() -> SyncTimings {
    SyncTimings {
        push_debounce: Duration::from_millis(100),
        fallback_interval: Duration::from_secs(3600),
        reconnect_delay: Duration::from_millis(100),
        heartbeat_interval: Duration::from_secs(3600),
        move_reconcile_delay: Duration::from_millis(100),
        request_timeout: Duration::from_secs(2),
    }
}

fn config(server_url: &str, dir: &Path) -> ClientConfig {
    ClientConfig {
        server_url: server_url.to_string(),
        token: Some(TOKEN.to_string()),
        identity: Some("alice@example.com".to_string()),
        realtime: false,
        timings: timings(),
        data_dir: Some(dir.to_path_buf()),
    }
}

fn envelope(board: &Board) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "status": "success", "data": board }))
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

async fn seed(dir: &Path, board: &Board) {
    LocalStore::new(dir).save(board).await.unwrap();
}

#[tokio::test]
async fn test_empty_local_board_adopts_server_board() {
    let server = MockServer::start().await;
    let remote = board_with(&[("c1", "Todo")], &[("t1", Some("c1"))]);
    Mock::given(method("GET"))
        .and(path("/api/data/get"))
        .and(header("authorization", "Bearer test-token"))
        .respond_with(envelope(&remote))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/data/sync"))
        .respond_with(envelope(&remote))
        .expect(0)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let (handle, _task) = client::start(config(&server.uri(), dir.path())).await.unwrap();
    let mut status = handle.subscribe_status();
    let synced = wait_status(&mut status, |s| s.state == ConnectionState::Synced).await;

    assert!(synced.last_synced.is_some());
    assert_eq!(handle.board(), remote);
    assert_eq!(LocalStore::new(dir.path()).load().await.unwrap(), Some(remote));
}

#[tokio::test]
async fn test_local_changes_are_pushed_on_startup() {
    let server = MockServer::start().await;
    let merged = board_with(&[("c1", "Todo")], &[("t1", Some("c1")), ("t2", None)]);
    Mock::given(method("GET"))
        .and(path("/api/data/get"))
        .respond_with(envelope(&board_with(&[("c1", "Todo")], &[("t2", None)])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/data/sync"))
        .respond_with(envelope(&merged))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let local = board_with(&[("c1", "Todo")], &[("t1", Some("c1"))]);
    seed(dir.path(), &local).await;

    let (handle, _task) = client::start(config(&server.uri(), dir.path())).await.unwrap();
    let mut status = handle.subscribe_status();
    wait_status(&mut status, |s| s.state == ConnectionState::Synced).await;

    assert_eq!(handle.board(), merged);
    let pushed: Board = server.received_requests().await.unwrap()[1].body_json().unwrap();
    assert_eq!(task_ids(&pushed), vec!["t1"]);
}

#[tokio::test]
async fn test_burst_of_edits_is_pushed_once() {
    let server = MockServer::start().await;
    let remote = board_with(&[("c1", "Todo")], &[]);
    Mock::given(method("GET"))
        .and(path("/api/data/get"))
        .respond_with(envelope(&remote))
        .mount(&server)
        .await;
    let merged = board_with(&[("c1", "Todo")], &[("t1", Some("c1")), ("t2", Some("c1")), ("t3", None)]);
    Mock::given(method("POST"))
        .and(path("/api/data/sync"))
        .respond_with(envelope(&merged))
        .expect(1)
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let (handle, _task) = client::start(config(&server.uri(), dir.path())).await.unwrap();
    let mut status = handle.subscribe_status();
    let adopted = wait_status(&mut status, |s| s.state == ConnectionState::Synced).await;

    handle.edit(Edit::AddTask(Task::new("t1", "one").in_column("c1"))).unwrap();
    handle.edit(Edit::AddTask(Task::new("t2", "two").in_column("c1"))).unwrap();
    handle.edit(Edit::AddTask(Task::new("t3", "three"))).unwrap();

    wait_status(&mut status, |s| s.last_synced != adopted.last_synced).await;
    // Nothing else is pending once the single push has landed
    tokio::time::sleep(Duration::from_millis(300)).await;

    let requests = server.received_requests().await.unwrap();
    let posts: Vec<_> = requests.iter().filter(|r| r.method.as_str() == "POST").collect();
    assert_eq!(posts.len(), 1);
    let pushed: Board = posts[0].body_json().unwrap();
    assert_eq!(task_ids(&pushed), vec!["t1", "t2", "t3"]);
    assert_eq!(handle.board(), merged);
}

#[tokio::test]
async fn test_rejected_token_requires_login_and_keeps_board() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/data/get"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Invalid token" })))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let local = board_with(&[("c1", "Todo")], &[("t1", Some("c1"))]);
    seed(dir.path(), &local).await;

    let (handle, _task) = client::start(config(&server.uri(), dir.path())).await.unwrap();
    let mut status = handle.subscribe_status();
    let rejected = wait_status(&mut status, |s| s.needs_login).await;

    assert_eq!(rejected.state, ConnectionState::Disconnected);
    assert_eq!(handle.board(), local);

    // Without a token, edits stay local and nothing is pushed
    handle.edit(Edit::AddTask(Task::new("t2", "offline"))).unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    let requests = server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.method.as_str() == "GET"));
}

#[tokio::test]
async fn test_unreachable_server_keeps_local_board() {
    // Bind then release a port so nothing is listening on it
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let dir = TempDir::new().unwrap();
    let local = board_with(&[("c1", "Todo")], &[("t1", Some("c1"))]);
    seed(dir.path(), &local).await;

    let (handle, _task) = client::start(config(&format!("http://{}", addr), dir.path()))
        .await
        .unwrap();
    let mut status = handle.subscribe_status();
    let failed = wait_status(&mut status, |s| s.last_error.is_some()).await;

    assert_eq!(failed.state, ConnectionState::Reconnecting);
    assert!(!failed.needs_login);
    assert_eq!(handle.board(), local);
}

#[tokio::test]
async fn test_offline_edits_persist_locally() {
    let dir = TempDir::new().unwrap();
    let mut offline = config("http://127.0.0.1:9", dir.path());
    offline.token = None;

    let (handle, task) = client::start(offline).await.unwrap();
    handle.edit(Edit::AddColumn { id: "c1".into(), title: "Todo".into() }).unwrap();
    handle.edit(Edit::AddTask(Task::new("t1", "draft").in_column("c1"))).unwrap();
    handle.shutdown().unwrap();
    timeout(WAIT, task).await.unwrap().unwrap();

    assert_eq!(handle.status().state, ConnectionState::Disconnected);
    let saved = LocalStore::new(dir.path()).load().await.unwrap().unwrap();
    assert_eq!(task_ids(&saved), vec!["t1"]);
    assert_eq!(saved.column("c1").map(|c| c.title.as_str()), Some("Todo"));

    // A restarted coordinator sees the same board before any network I/O
    let mut again = config("http://127.0.0.1:9", dir.path());
    again.token = None;
    let (restarted, _task) = client::start(again).await.unwrap();
    assert_eq!(restarted.board(), saved);
}
