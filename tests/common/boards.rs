//! Board builders shared by several tests

use kanban_sync::shared::{Board, Column, Task};

/// `columns` as (id, title) pairs, tasks as (id, column) pairs
pub fn board_with(columns: &[(&str, &str)], tasks: &[(&str, Option<&str>)]) -> Board {
    let mut board = Board::default();
    for (order, (id, title)) in columns.iter().enumerate() {
        board.columns.push(Column::new(*id, *title, order as i64));
    }
    for (id, column) in tasks {
        let mut task = Task::new(*id, format!("Task {}", id));
        task.column_id = column.map(str::to_string);
        board.tasks.push(task);
    }
    board
}

pub fn task_ids(board: &Board) -> Vec<&str> {
    board.tasks.iter().map(|t| t.id.as_str()).collect()
}
