/**
 * Snapshot Reconciliation
 *
 * Combines the last stored server board with a board pushed by a client.
 * Pure and deterministic: no I/O, no clocks, no shared state, so it may run
 * concurrently for different identities.
 *
 * # Rules
 *
 * Columns: every client column verbatim, then every server column whose id
 * the client does not carry. Client wins wholesale on id collision.
 *
 * Tasks, in order:
 * 1. client tasks, with `columnId: ""` rewritten to unassigned
 * 2. client legacy `unassignedTasks`, forced unassigned
 * 3. server tasks whose id the client does not carry (created elsewhere)
 * 4. server legacy `unassignedTasks` whose id the client does not carry
 * 5. a final pass rewriting `""` and `"unassigned"` column ids to unassigned
 *
 * `unassignedCollapsed` always comes from the client. The result never
 * carries a legacy unassigned list.
 *
 * # Consistency
 *
 * There are no per-field versions. Whichever push the server processes last
 * overwrites every record it carries, so clients converge on the last merged
 * snapshot rather than on a union of all edits.
 */

use std::collections::HashSet;

use crate::shared::board::{Board, Task};

/// Column id token older clients used for the unassigned lane
pub const UNASSIGNED_TOKEN: &str = "unassigned";

/// Merge a client push into the stored server board
pub fn reconcile(server: &Board, client: &Board) -> Board {
    let client_column_ids: HashSet<&str> = client.columns.iter().map(|c| c.id.as_str()).collect();

    let mut columns = client.columns.clone();
    columns.extend(
        server
            .columns
            .iter()
            .filter(|c| !client_column_ids.contains(c.id.as_str()))
            .cloned(),
    );

    let client_task_ids: HashSet<&str> = client
        .tasks
        .iter()
        .chain(client.unassigned_tasks.iter())
        .map(|t| t.id.as_str())
        .collect();

    let mut tasks = Vec::with_capacity(
        client.tasks.len() + client.unassigned_tasks.len() + server.tasks.len(),
    );

    // 1. client tasks
    tasks.extend(client.tasks.iter().cloned().map(clear_empty_column));

    // 2. client legacy unassigned list
    tasks.extend(client.unassigned_tasks.iter().cloned().map(force_unassigned));

    // 3. tasks only the server knows about
    let recovered_before = tasks.len();
    tasks.extend(
        server
            .tasks
            .iter()
            .filter(|t| !client_task_ids.contains(t.id.as_str()))
            .cloned()
            .map(clear_empty_column),
    );

    // 4. server legacy unassigned list
    tasks.extend(
        server
            .unassigned_tasks
            .iter()
            .filter(|t| !client_task_ids.contains(t.id.as_str()))
            .cloned()
            .map(force_unassigned),
    );

    let recovered = tasks.len() - recovered_before;
    if recovered > 0 {
        tracing::debug!("[Merge] recovered {} server-only tasks", recovered);
    }

    // 5. final normalization
    for task in tasks.iter_mut() {
        normalize_column_ref(task);
    }

    Board {
        columns,
        tasks,
        unassigned_tasks: Vec::new(),
        unassigned_collapsed: client.unassigned_collapsed,
    }
}

/// Canonicalize a single board the way `reconcile` canonicalizes its output.
///
/// Folds the legacy unassigned list into `tasks` and rewrites placeholder
/// column ids. `reconcile(b, b) == normalize(b)` for every board, and
/// `normalize` is idempotent.
pub fn normalize(board: &Board) -> Board {
    reconcile(&Board::default(), board)
}

/// True if `column_id` is one of the placeholder values meaning "no column"
pub fn is_unassigned_marker(column_id: &str) -> bool {
    column_id.is_empty() || column_id == UNASSIGNED_TOKEN
}

fn clear_empty_column(mut task: Task) -> Task {
    if task.column_id.as_deref() == Some("") {
        task.column_id = None;
    }
    task
}

fn force_unassigned(mut task: Task) -> Task {
    task.column_id = None;
    task
}

fn normalize_column_ref(task: &mut Task) {
    if task.column_id.as_deref().is_some_and(is_unassigned_marker) {
        tracing::trace!("[Merge] task {} had placeholder column id", task.id);
        task.column_id = None;
    }
}
