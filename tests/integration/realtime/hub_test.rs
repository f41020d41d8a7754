//! Hub fan-out and overflow policy through the public handle

use pretty_assertions::assert_eq;

use kanban_sync::backend::realtime::spawn_hub;
use kanban_sync::shared::{SyncMessage, TaskMove, WireMessage};

fn moved(task: &str) -> WireMessage {
    WireMessage::new(SyncMessage::TaskMove(TaskMove {
        task_id: task.to_string(),
        column_id: None,
    }))
}

#[tokio::test]
async fn test_broadcast_reaches_everyone_or_everyone_but_sender() {
    let hub = spawn_hub(16);
    let mut a = hub.register("a@example.com").unwrap();
    let mut b = hub.register("b@example.com").unwrap();
    let mut c = hub.register("c@example.com").unwrap();

    hub.broadcast(&moved("t1"), "").unwrap();
    for link in [&mut a, &mut b, &mut c] {
        let payload = link.outbound.recv().await.unwrap();
        assert_eq!(WireMessage::decode(&payload).unwrap(), moved("t1"));
    }

    hub.broadcast(&moved("t2"), "a@example.com").unwrap();
    for link in [&mut b, &mut c] {
        let payload = link.outbound.recv().await.unwrap();
        assert_eq!(WireMessage::decode(&payload).unwrap(), moved("t2"));
    }
    // Every earlier command has been processed once this returns
    hub.live_sessions().await.unwrap();
    assert!(a.outbound.try_recv().is_err());
}

#[tokio::test]
async fn test_full_queue_drops_only_that_session() {
    let hub = spawn_hub(2);
    let mut slow = hub.register("slow@example.com").unwrap();
    let mut fast = hub.register("fast@example.com").unwrap();

    for task in ["t1", "t2"] {
        hub.broadcast(&moved(task), "").unwrap();
        fast.outbound.recv().await.unwrap();
    }

    // slow's queue is at capacity; this offer evicts it
    hub.broadcast(&moved("t3"), "").unwrap();
    let payload = fast.outbound.recv().await.unwrap();
    assert_eq!(WireMessage::decode(&payload).unwrap(), moved("t3"));

    let live = hub.live_sessions().await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].identity, "fast@example.com");

    // Already queued messages drain, then the queue reports closed
    assert!(slow.outbound.recv().await.is_some());
    assert!(slow.outbound.recv().await.is_some());
    assert!(slow.outbound.recv().await.is_none());

    hub.broadcast(&moved("t4"), "").unwrap();
    assert!(fast.outbound.recv().await.is_some());
}
