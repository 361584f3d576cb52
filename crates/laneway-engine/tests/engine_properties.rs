//! Property tests for the engine's consistency guarantees.
//!
//! These run against the in-memory store, so no database is required; the
//! coordinator pipeline under test is identical to the one driving
//! PostgreSQL. Each test pins one guarantee: position density, serialized
//! same-queue mutations, cross-queue atomicity, broadcast scoping and
//! ordering, and notification targeting.

use std::sync::Arc;

use uuid::Uuid;

use laneway_core::{
    ActivityLog, Board, BoardSnapshot, BoardStore, Item, Mutation, NotificationStore, Queue,
};
use laneway_engine::{BoardRouter, Coordinator, MemoryStore};

async fn engine() -> (Arc<MemoryStore>, Coordinator) {
    let store = Arc::new(MemoryStore::new());
    let coordinator = Coordinator::new(store.clone(), BoardRouter::new());
    (store, coordinator)
}

async fn board_with_queues(store: &MemoryStore, queues: &[&str]) -> (Board, Vec<Queue>) {
    let board = store.create_board("test board").await.unwrap();
    let mut created = Vec::new();
    for name in queues {
        created.push(store.create_queue(board.id, name).await.unwrap());
    }
    (board, created)
}

async fn create(
    coordinator: &Coordinator,
    actor: Uuid,
    board_id: Uuid,
    queue_id: Uuid,
    title: &str,
) -> Item {
    coordinator
        .submit(
            actor,
            Mutation::CreateItem {
                board_id,
                queue_id,
                title: title.to_string(),
                body: String::new(),
                assignees: vec![],
                labels: vec![],
                due_at: None,
            },
        )
        .await
        .unwrap()
        .item
        .unwrap()
}

fn move_item(board_id: Uuid, item_id: Uuid, to_queue: Uuid, to_position: i32) -> Mutation {
    Mutation::MoveItem {
        board_id,
        item_id,
        to_queue,
        to_position,
    }
}

/// Titles of a queue's items in position order, from an unlocked snapshot.
fn titles(snapshot: &BoardSnapshot, queue_id: Uuid) -> Vec<String> {
    snapshot
        .queues
        .iter()
        .find(|q| q.queue.id == queue_id)
        .map(|q| q.items.iter().map(|v| v.item.title.clone()).collect())
        .unwrap_or_default()
}

/// Every queue's positions must form exactly `{0..N-1}` in render order.
fn assert_dense(snapshot: &BoardSnapshot) {
    for queue in &snapshot.queues {
        let positions: Vec<i32> = queue.items.iter().map(|v| v.item.position).collect();
        let expected: Vec<i32> = (0..queue.items.len() as i32).collect();
        assert_eq!(
            positions, expected,
            "queue \"{}\" is not dense",
            queue.queue.name
        );
    }
}

/// Reference model of one move: remove, clamp, reinsert.
fn model_move(order: &mut Vec<String>, title: &str, to: usize) {
    order.retain(|t| t != title);
    let slot = to.min(order.len());
    order.insert(slot, title.to_string());
}

// =============================================================================
// DENSITY
// =============================================================================

#[tokio::test]
async fn test_positions_stay_dense_through_mixed_mutations() {
    let (store, coordinator) = engine().await;
    let actor = Uuid::new_v4();
    let (board, queues) = board_with_queues(&store, &["Todo", "Doing", "Done"]).await;

    let mut items = Vec::new();
    for n in 0..8 {
        items.push(create(&coordinator, actor, board.id, queues[0].id, &format!("t{n}")).await);
    }

    // Shuffle around: in-queue moves, cross-queue moves, a delete.
    for (n, item) in items.iter().enumerate() {
        let mutation = match n % 3 {
            0 => move_item(board.id, item.id, queues[0].id, 0),
            1 => move_item(board.id, item.id, queues[1].id, n as i32),
            _ => move_item(board.id, item.id, queues[2].id, 999),
        };
        coordinator.submit(actor, mutation).await.unwrap();
    }
    coordinator
        .submit(
            actor,
            Mutation::DeleteItem {
                board_id: board.id,
                item_id: items[3].id,
            },
        )
        .await
        .unwrap();

    let snapshot = store.snapshot(board.id).await.unwrap();
    assert_dense(&snapshot);
    let total: usize = snapshot.queues.iter().map(|q| q.items.len()).sum();
    assert_eq!(total, 7);
}

// =============================================================================
// NO LOST UPDATES
// =============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_same_queue_moves_serialize() {
    let (store, coordinator) = engine().await;
    let actor = Uuid::new_v4();
    let (board, queues) = board_with_queues(&store, &["Todo"]).await;
    let queue = queues[0].id;

    let names = ["a", "b", "c", "d", "e"];
    let mut by_name = std::collections::HashMap::new();
    for name in names {
        let item = create(&coordinator, actor, board.id, queue, name).await;
        by_name.insert(name, item.id);
    }

    // Two racing drags: "b" to the end, "e" to the front.
    let first = move_item(board.id, by_name["b"], queue, 4);
    let second = move_item(board.id, by_name["e"], queue, 0);
    let (r1, r2) = tokio::join!(
        tokio::spawn({
            let coordinator = coordinator.clone();
            let m = first.clone();
            async move { coordinator.submit(actor, m).await }
        }),
        tokio::spawn({
            let coordinator = coordinator.clone();
            let m = second.clone();
            async move { coordinator.submit(actor, m).await }
        }),
    );
    r1.unwrap().unwrap();
    r2.unwrap().unwrap();

    let snapshot = store.snapshot(board.id).await.unwrap();
    assert_dense(&snapshot);
    let final_order = titles(&snapshot, queue);

    // Whatever interleaving won, the result must equal SOME sequential
    // execution of the two moves.
    let base: Vec<String> = names.iter().map(|s| s.to_string()).collect();
    let mut first_then_second = base.clone();
    model_move(&mut first_then_second, "b", 4);
    model_move(&mut first_then_second, "e", 0);
    let mut second_then_first = base;
    model_move(&mut second_then_first, "e", 0);
    model_move(&mut second_then_first, "b", 4);

    assert!(
        final_order == first_then_second || final_order == second_then_first,
        "final order {final_order:?} matches no sequential execution"
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_cross_queue_swaps_complete_without_deadlock() {
    let (store, coordinator) = engine().await;
    let actor = Uuid::new_v4();
    let (board, queues) = board_with_queues(&store, &["Left", "Right"]).await;
    let (left, right) = (queues[0].id, queues[1].id);

    let in_left = create(&coordinator, actor, board.id, left, "from-left").await;
    let in_right = create(&coordinator, actor, board.id, right, "from-right").await;

    // Opposite-direction moves take the same lock pair in opposite argument
    // order; many rounds would wedge without ordered acquisition.
    for _ in 0..50 {
        let (r1, r2) = tokio::join!(
            tokio::spawn({
                let coordinator = coordinator.clone();
                let m = move_item(board.id, in_left.id, right, 0);
                async move { coordinator.submit(actor, m).await }
            }),
            tokio::spawn({
                let coordinator = coordinator.clone();
                let m = move_item(board.id, in_right.id, left, 0);
                async move { coordinator.submit(actor, m).await }
            }),
        );
        r1.unwrap().unwrap();
        r2.unwrap().unwrap();

        let snapshot = store.snapshot(board.id).await.unwrap();
        assert_dense(&snapshot);
        let total: usize = snapshot.queues.iter().map(|q| q.items.len()).sum();
        assert_eq!(total, 2);

        // Put them back for the next round.
        coordinator
            .submit(actor, move_item(board.id, in_left.id, left, 0))
            .await
            .unwrap();
        coordinator
            .submit(actor, move_item(board.id, in_right.id, right, 0))
            .await
            .unwrap();
    }
}

// =============================================================================
// CROSS-QUEUE ATOMICITY
// =============================================================================

#[tokio::test]
async fn test_cross_queue_move_lands_exactly_once() {
    let (store, coordinator) = engine().await;
    let actor = Uuid::new_v4();
    let (board, queues) = board_with_queues(&store, &["Todo", "Done"]).await;

    let item = create(&coordinator, actor, board.id, queues[0].id, "x").await;
    create(&coordinator, actor, board.id, queues[0].id, "stays").await;
    create(&coordinator, actor, board.id, queues[1].id, "existing").await;

    coordinator
        .submit(actor, move_item(board.id, item.id, queues[1].id, 0))
        .await
        .unwrap();

    let snapshot = store.snapshot(board.id).await.unwrap();
    assert_dense(&snapshot);
    assert_eq!(titles(&snapshot, queues[0].id), vec!["stays"]);
    assert_eq!(titles(&snapshot, queues[1].id), vec!["x", "existing"]);
}

#[tokio::test]
async fn test_failed_cross_queue_move_changes_nothing() {
    let (store, coordinator) = engine().await;
    let actor = Uuid::new_v4();
    let (board, queues) = board_with_queues(&store, &["Todo"]).await;
    create(&coordinator, actor, board.id, queues[0].id, "a").await;
    let item = create(&coordinator, actor, board.id, queues[0].id, "b").await;

    let before = store.snapshot(board.id).await.unwrap();
    let err = coordinator
        .submit(actor, move_item(board.id, item.id, Uuid::new_v4(), 0))
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let after = store.snapshot(board.id).await.unwrap();
    assert_dense(&after);
    assert_eq!(titles(&after, queues[0].id), titles(&before, queues[0].id));
    // The rejected mutation produced no history either.
    assert_eq!(
        store.by_board(board.id, None, 10).await.unwrap().len(),
        2 // the two creates
    );
}

// =============================================================================
// BROADCAST
// =============================================================================

#[tokio::test]
async fn test_broadcast_never_crosses_board_boundaries() {
    let (store, coordinator) = engine().await;
    let actor = Uuid::new_v4();
    let (board_x, queues_x) = board_with_queues(&store, &["Todo"]).await;
    let (board_y, queues_y) = board_with_queues(&store, &["Todo"]).await;

    let (tx, mut rx) = BoardRouter::channel();
    coordinator
        .router()
        .subscribe(board_x.id, Uuid::new_v4(), tx)
        .await;

    create(&coordinator, actor, board_y.id, queues_y[0].id, "elsewhere").await;
    assert!(rx.try_recv().is_err(), "received an event for a foreign board");

    create(&coordinator, actor, board_x.id, queues_x[0].id, "here").await;
    let event = rx.recv().await.unwrap();
    assert_eq!(event.board_id, board_x.id);
}

#[tokio::test]
async fn test_broadcast_order_matches_commit_order() {
    let (store, coordinator) = engine().await;
    let actor = Uuid::new_v4();
    let (board, queues) = board_with_queues(&store, &["Todo"]).await;

    let (tx, mut rx) = BoardRouter::channel();
    coordinator
        .router()
        .subscribe(board.id, Uuid::new_v4(), tx)
        .await;

    let item = create(&coordinator, actor, board.id, queues[0].id, "a").await;
    create(&coordinator, actor, board.id, queues[0].id, "b").await;
    coordinator
        .submit(actor, move_item(board.id, item.id, queues[0].id, 1))
        .await
        .unwrap();

    let mut seqs = Vec::new();
    for _ in 0..3 {
        seqs.push(rx.recv().await.unwrap().seq);
    }
    assert_eq!(seqs, vec![1, 2, 3]);
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

#[tokio::test]
async fn test_actor_never_notifies_themselves() {
    let (store, coordinator) = engine().await;
    let actor = Uuid::new_v4();
    let other = Uuid::new_v4();
    let (board, queues) = board_with_queues(&store, &["Todo"]).await;

    let outcome = coordinator
        .submit(
            actor,
            Mutation::CreateItem {
                board_id: board.id,
                queue_id: queues[0].id,
                title: "shared".to_string(),
                body: String::new(),
                assignees: vec![actor, other],
                labels: vec![],
                due_at: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(outcome.notifications_created, 1);
    assert_eq!(store.unread_count(actor).await.unwrap(), 0);
    assert_eq!(store.unread_count(other).await.unwrap(), 1);
}

#[tokio::test]
async fn test_mark_read_is_recipient_scoped() {
    let (store, coordinator) = engine().await;
    let actor = Uuid::new_v4();
    let recipient = Uuid::new_v4();
    let intruder = Uuid::new_v4();
    let (board, queues) = board_with_queues(&store, &["Todo"]).await;

    coordinator
        .submit(
            actor,
            Mutation::CreateItem {
                board_id: board.id,
                queue_id: queues[0].id,
                title: "x".to_string(),
                body: String::new(),
                assignees: vec![recipient],
                labels: vec![],
                due_at: None,
            },
        )
        .await
        .unwrap();

    let notifications = store.list_for_recipient(recipient, true, 10).await.unwrap();
    assert_eq!(notifications.len(), 1);

    let err = store
        .mark_read(notifications[0].id, intruder)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(store.unread_count(recipient).await.unwrap(), 1);

    store.mark_read(notifications[0].id, recipient).await.unwrap();
    assert_eq!(store.unread_count(recipient).await.unwrap(), 0);
}

// =============================================================================
// NO-OPS
// =============================================================================

#[tokio::test]
async fn test_idempotent_facet_mutations_commit_nothing() {
    let (store, coordinator) = engine().await;
    let actor = Uuid::new_v4();
    let (board, queues) = board_with_queues(&store, &["Todo"]).await;
    let item = create(&coordinator, actor, board.id, queues[0].id, "x").await;

    let (tx, mut rx) = BoardRouter::channel();
    coordinator
        .router()
        .subscribe(board.id, Uuid::new_v4(), tx)
        .await;

    let label = Mutation::AddLabel {
        board_id: board.id,
        item_id: item.id,
        label: "urgent".to_string(),
    };
    let applied = coordinator.submit(actor, label.clone()).await.unwrap();
    assert!(!applied.is_noop());
    let repeated = coordinator.submit(actor, label).await.unwrap();
    assert!(repeated.is_noop());

    // Removing an absent assignee is equally silent.
    let absent = coordinator
        .submit(
            actor,
            Mutation::RemoveAssignee {
                board_id: board.id,
                item_id: item.id,
                user_id: Uuid::new_v4(),
            },
        )
        .await
        .unwrap();
    assert!(absent.is_noop());

    // One record and one broadcast total beyond the create.
    assert_eq!(store.by_board(board.id, None, 10).await.unwrap().len(), 2);
    assert_eq!(rx.recv().await.unwrap().seq, 2);
    assert!(rx.try_recv().is_err());
}

// =============================================================================
// SPEC SCENARIOS
// =============================================================================

#[tokio::test]
async fn test_reorder_then_cross_queue_move_scenario() {
    let (store, coordinator) = engine().await;
    let actor = Uuid::new_v4();
    let (board, queues) = board_with_queues(&store, &["Q1", "Q2"]).await;
    let (q1, q2) = (queues[0].id, queues[1].id);

    let a = create(&coordinator, actor, board.id, q1, "A").await;
    let b = create(&coordinator, actor, board.id, q1, "B").await;
    create(&coordinator, actor, board.id, q1, "C").await;
    create(&coordinator, actor, board.id, q2, "D").await;

    coordinator
        .submit(actor, move_item(board.id, b.id, q1, 0))
        .await
        .unwrap();
    let snapshot = store.snapshot(board.id).await.unwrap();
    assert_eq!(titles(&snapshot, q1), vec!["B", "A", "C"]);

    coordinator
        .submit(actor, move_item(board.id, a.id, q2, 0))
        .await
        .unwrap();
    let snapshot = store.snapshot(board.id).await.unwrap();
    assert_dense(&snapshot);
    assert_eq!(titles(&snapshot, q1), vec!["B", "C"]);
    assert_eq!(titles(&snapshot, q2), vec!["A", "D"]);
}

#[tokio::test]
async fn test_concurrent_creates_tie_break_on_arrival_order() {
    let (store, coordinator) = engine().await;
    let actor = Uuid::new_v4();
    let (board, queues) = board_with_queues(&store, &["Todo"]).await;
    let board_id = board.id;
    let queue = queues[0].id;

    // Current-thread runtime: spawn X, park it at the queue's domain, then
    // spawn Y, so arrival order is X before Y regardless of content.
    let mut handles = Vec::new();
    for title in ["X", "Y"] {
        let coordinator = coordinator.clone();
        let title = title.to_string();
        handles.push(tokio::spawn(async move {
            coordinator
                .submit(
                    actor,
                    Mutation::CreateItem {
                        board_id,
                        queue_id: queue,
                        title,
                        body: String::new(),
                        assignees: vec![],
                        labels: vec![],
                        due_at: None,
                    },
                )
                .await
        }));
        tokio::task::yield_now().await;
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let snapshot = store.snapshot(board.id).await.unwrap();
    assert_dense(&snapshot);
    assert_eq!(titles(&snapshot, queue), vec!["X", "Y"]);
}
