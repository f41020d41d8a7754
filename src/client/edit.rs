//! Local board edits.
//!
//! Every user action is an [`Edit`] applied to the coordinator's board.
//! Deletions leave tombstones so the server merge cannot resurrect them.
//! Column edits that change the set or order of columns rewrite live
//! orders to 0..N-1.

use uuid::Uuid;

use crate::shared::{Board, Column, Task, TaskMove};

/// Fresh id for a new task or column
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    AddColumn { id: String, title: String },
    RenameColumn { id: String, title: String },
    /// Tombstones the column and moves its live tasks to unassigned
    DeleteColumn { id: String },
    /// Move a column to position `to` among the live columns
    MoveColumn { id: String, to: usize },
    AddTask(Task),
    /// Replace every field of an existing task
    UpdateTask(Task),
    /// `column_id: None` moves the task to unassigned
    MoveTask { task_id: String, column_id: Option<String> },
    DeleteTask { id: String },
    SetUnassignedCollapsed(bool),
}

impl Edit {
    /// Apply to `board`, returning false if nothing changed
    pub fn apply(&self, board: &mut Board) -> bool {
        match self {
            Edit::AddColumn { id, title } => {
                if board.column(id).is_some() {
                    return false;
                }
                let order = board.ordered_columns().len() as i64;
                board.columns.push(Column::new(id.clone(), title.clone(), order));
                board.renumber_columns();
                true
            }
            Edit::RenameColumn { id, title } => match board.column_mut(id) {
                Some(column) if column.title != *title => {
                    column.title = title.clone();
                    true
                }
                _ => false,
            },
            Edit::DeleteColumn { id } => {
                match board.column_mut(id) {
                    Some(column) if column.is_live() => column.tombstone(),
                    _ => return false,
                }
                for task in board.tasks.iter_mut() {
                    if task.is_live() && task.column_id.as_deref() == Some(id.as_str()) {
                        task.column_id = None;
                    }
                }
                board.renumber_columns();
                true
            }
            Edit::MoveColumn { id, to } => move_column(board, id, *to),
            Edit::AddTask(task) => {
                if board.task(&task.id).is_some() {
                    return false;
                }
                board.tasks.push(task.clone());
                true
            }
            Edit::UpdateTask(task) => match board.task_mut(&task.id) {
                Some(existing) if existing != task => {
                    *existing = task.clone();
                    true
                }
                _ => false,
            },
            Edit::MoveTask { task_id, column_id } => {
                let target = target_column(column_id);
                let current = board.task(task_id).map(|t| t.column_id.clone());
                match current {
                    Some(current) if current.as_deref() != target => {
                        board.move_task(task_id, target.map(str::to_string))
                    }
                    _ => false,
                }
            }
            Edit::DeleteTask { id } => match board.task_mut(id) {
                Some(task) if task.is_live() => {
                    task.tombstone();
                    true
                }
                _ => false,
            },
            Edit::SetUnassignedCollapsed(collapsed) => {
                if board.unassigned_collapsed == *collapsed {
                    return false;
                }
                board.unassigned_collapsed = *collapsed;
                true
            }
        }
    }

    /// The realtime delta announcing this edit, if it has one
    pub fn task_move(&self) -> Option<TaskMove> {
        match self {
            Edit::MoveTask { task_id, column_id } => Some(TaskMove {
                task_id: task_id.clone(),
                column_id: target_column(column_id).map(str::to_string),
            }),
            _ => None,
        }
    }
}

/// `Some("")` means unassigned, same as `None`
fn target_column(column_id: &Option<String>) -> Option<&str> {
    column_id.as_deref().filter(|c| !c.is_empty())
}

fn move_column(board: &mut Board, id: &str, to: usize) -> bool {
    let mut ids: Vec<String> = board
        .ordered_columns()
        .into_iter()
        .map(|c| c.id.clone())
        .collect();
    let Some(from) = ids.iter().position(|c| c == id) else {
        return false;
    };
    let moved = ids.remove(from);
    let to = to.min(ids.len());
    ids.insert(to, moved);

    let before: Vec<i64> = ids
        .iter()
        .filter_map(|c| board.column(c).map(|c| c.order))
        .collect();
    for (rank, column_id) in ids.iter().enumerate() {
        if let Some(column) = board.column_mut(column_id) {
            column.order = rank as i64;
        }
    }
    from != to || before.iter().enumerate().any(|(rank, order)| *order != rank as i64)
}
