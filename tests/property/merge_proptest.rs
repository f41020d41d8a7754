//! Reconciliation properties over generated boards

use std::collections::{HashMap, HashSet};

use proptest::prelude::*;

use kanban_sync::shared::{normalize, reconcile, Board, Column, Task};

const COLUMN_IDS: [&str; 4] = ["c0", "c1", "c2", "c3"];
const TASK_SLOTS: usize = 8;

fn column_ref() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        Just(Some("unassigned".to_string())),
        (0..COLUMN_IDS.len()).prop_map(|i| Some(COLUMN_IDS[i].to_string())),
    ]
}

/// Where a generated task lives in the board
#[derive(Debug, Clone, Copy)]
enum Slot {
    Tasks,
    Legacy,
}

fn task_spec() -> impl Strategy<Value = Option<(Option<String>, bool, Slot, String)>> {
    proptest::option::of((
        column_ref(),
        any::<bool>(),
        prop_oneof![4 => Just(Slot::Tasks), 1 => Just(Slot::Legacy)],
        "[a-z]{1,6}",
    ))
}

prop_compose! {
    fn board()(
        columns in proptest::collection::vec(proptest::option::of(("[A-Z][a-z]{0,5}", any::<bool>())), COLUMN_IDS.len()),
        tasks in proptest::collection::vec(task_spec(), TASK_SLOTS),
        collapsed in any::<bool>(),
    ) -> Board {
        let mut board = Board { unassigned_collapsed: collapsed, ..Board::default() };
        for (i, column) in columns.into_iter().enumerate() {
            if let Some((title, deleted)) = column {
                let mut column = Column::new(COLUMN_IDS[i], title, i as i64);
                if deleted {
                    column.tombstone();
                }
                board.columns.push(column);
            }
        }
        // One id per slot keeps ids unique across tasks and the legacy list
        for (i, spec) in tasks.into_iter().enumerate() {
            if let Some((column_id, deleted, slot, title)) = spec {
                let mut task = Task::new(format!("t{}", i), title);
                task.column_id = column_id;
                if deleted {
                    task.tombstone();
                }
                match slot {
                    Slot::Tasks => board.tasks.push(task),
                    Slot::Legacy => board.unassigned_tasks.push(task),
                }
            }
        }
        board
    }
}

fn all_tasks(board: &Board) -> impl Iterator<Item = &Task> {
    board.tasks.iter().chain(board.unassigned_tasks.iter())
}

fn by_id(board: &Board) -> HashMap<&str, &Task> {
    board.tasks.iter().map(|t| (t.id.as_str(), t)).collect()
}

proptest! {
    #[test]
    fn merging_a_board_with_itself_normalizes_it(b in board()) {
        let normalized = normalize(&b);
        prop_assert_eq!(reconcile(&b, &b), normalized.clone());
        prop_assert_eq!(normalize(&normalized), normalized);
    }

    #[test]
    fn placeholder_column_ids_never_survive(server in board(), client in board()) {
        let merged = reconcile(&server, &client);
        prop_assert!(merged.unassigned_tasks.is_empty());
        for task in &merged.tasks {
            prop_assert!(
                !matches!(task.column_id.as_deref(), Some("") | Some("unassigned")),
                "task {} kept {:?}", task.id, task.column_id
            );
        }
    }

    #[test]
    fn every_task_appears_once(server in board(), client in board()) {
        let merged = reconcile(&server, &client);
        let merged_ids: Vec<&str> = merged.tasks.iter().map(|t| t.id.as_str()).collect();
        let unique: HashSet<&str> = merged_ids.iter().copied().collect();
        prop_assert_eq!(unique.len(), merged_ids.len());

        let expected: HashSet<&str> = all_tasks(&server)
            .chain(all_tasks(&client))
            .map(|t| t.id.as_str())
            .collect();
        prop_assert_eq!(unique, expected);
    }

    #[test]
    fn client_records_take_precedence(server in board(), client in board()) {
        let merged = reconcile(&server, &client);
        let merged_tasks = by_id(&merged);
        for task in &client.tasks {
            let kept = merged_tasks[task.id.as_str()];
            prop_assert_eq!(&kept.title, &task.title);
            prop_assert_eq!(kept.deleted, task.deleted);
        }
        for task in &client.unassigned_tasks {
            prop_assert_eq!(merged_tasks[task.id.as_str()].column_id.as_deref(), None);
        }
        prop_assert_eq!(merged.unassigned_collapsed, client.unassigned_collapsed);
    }

    #[test]
    fn server_only_tasks_are_recovered_unchanged(server in board(), client in board()) {
        let merged = reconcile(&server, &client);
        let merged_tasks = by_id(&merged);
        let client_ids: HashSet<&str> = all_tasks(&client).map(|t| t.id.as_str()).collect();
        for task in server.tasks.iter().filter(|t| !client_ids.contains(t.id.as_str())) {
            let kept = merged_tasks[task.id.as_str()];
            prop_assert_eq!(&kept.title, &task.title);
            prop_assert_eq!(kept.deleted, task.deleted);
            if let Some(column) = task.column_id.as_deref().filter(|c| !c.is_empty() && *c != "unassigned") {
                prop_assert_eq!(kept.column_id.as_deref(), Some(column));
            }
        }
    }

    #[test]
    fn tombstones_are_never_dropped(server in board(), client in board()) {
        let merged = reconcile(&server, &client);
        let merged_tasks = by_id(&merged);
        let client_ids: HashSet<&str> = all_tasks(&client).map(|t| t.id.as_str()).collect();
        let tombstoned = all_tasks(&client)
            .chain(all_tasks(&server).filter(|t| !client_ids.contains(t.id.as_str())))
            .filter(|t| t.deleted);
        for task in tombstoned {
            prop_assert!(merged_tasks[task.id.as_str()].deleted);
        }
    }

    #[test]
    fn columns_are_the_union_with_client_first(server in board(), client in board()) {
        let merged = reconcile(&server, &client);
        let ids: Vec<&str> = merged.columns.iter().map(|c| c.id.as_str()).collect();
        let expected: HashSet<&str> = server
            .columns
            .iter()
            .chain(client.columns.iter())
            .map(|c| c.id.as_str())
            .collect();
        let unique: HashSet<&str> = ids.iter().copied().collect();
        prop_assert_eq!(unique.len(), ids.len());
        prop_assert_eq!(unique, expected);
        prop_assert_eq!(&merged.columns[..client.columns.len()], &client.columns[..]);
    }
}
