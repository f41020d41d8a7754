//! Board Snapshot Model
//!
//! The synchronized aggregate exchanged between clients and the server.
//! A `Board` owns an ordered list of columns and a flat list of tasks.
//! Tasks point at columns by id string only; nothing holds a direct
//! reference to another record, so every lookup goes by id.
//!
//! # Tombstones
//!
//! Records are never physically removed. Deleting a task or column sets
//! both `deleted` and `hidden`, which keeps the record alive through later
//! merges so a stale client cannot resurrect it by omission.
//!
//! # Wire Format
//!
//! All structs serialize in camelCase. Tolerated input quirks:
//! - `dueDate` may be `null`, `""`, `YYYY-MM-DD` or an RFC 3339 timestamp;
//!   anything else is logged and read as no due date
//! - `priority` may be `null` or any string; unknown values decode as `None`
//! - `columns`/`tasks` may be `null`
//! - the legacy `unassignedTasks` list is accepted and never emitted once empty

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> Option<&'static str> {
        match self {
            Priority::None => None,
            Priority::Low => Some("low"),
            Priority::Medium => Some("medium"),
            Priority::High => Some("high"),
        }
    }
}

impl From<Option<String>> for Priority {
    fn from(value: Option<String>) -> Self {
        match value.as_deref().map(str::to_ascii_lowercase).as_deref() {
            Some("low") => Priority::Low,
            Some("medium") => Priority::Medium,
            Some("high") => Priority::High,
            _ => Priority::None,
        }
    }
}

impl From<Priority> for Option<String> {
    fn from(value: Priority) -> Self {
        value.as_str().map(str::to_string)
    }
}

/// A card on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, with = "due_date")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    /// `None` means unassigned. May reference a column that no longer exists.
    #[serde(default)]
    pub column_id: Option<String>,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default)]
    pub hidden: bool,
}

impl Task {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            due_date: None,
            priority: Priority::None,
            column_id: None,
            deleted: false,
            hidden: false,
        }
    }

    pub fn in_column(mut self, column_id: impl Into<String>) -> Self {
        self.column_id = Some(column_id.into());
        self
    }

    pub fn is_live(&self) -> bool {
        !self.deleted
    }

    pub fn tombstone(&mut self) {
        self.deleted = true;
        self.hidden = true;
    }
}

/// A lane on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub order: i64,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
}

impl Column {
    pub fn new(id: impl Into<String>, title: impl Into<String>, order: i64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            order,
            deleted: false,
            hidden: false,
        }
    }

    pub fn is_live(&self) -> bool {
        !self.deleted
    }

    pub fn tombstone(&mut self) {
        self.deleted = true;
        self.hidden = true;
    }
}

/// One account's board
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub columns: Vec<Column>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub tasks: Vec<Task>,
    /// Legacy separate list of unassigned tasks. Read, folded in by merge, never written.
    #[serde(
        default,
        deserialize_with = "null_as_empty",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub unassigned_tasks: Vec<Task>,
    #[serde(default)]
    pub unassigned_collapsed: bool,
}

impl Board {
    /// The board handed out for an identity with nothing stored yet
    pub fn initial() -> Self {
        Self {
            unassigned_collapsed: true,
            ..Self::default()
        }
    }

    /// True when the board carries no columns and no tasks, tombstones included
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() && self.tasks.is_empty() && self.unassigned_tasks.is_empty()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn column(&self, id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == id)
    }

    pub fn column_mut(&mut self, id: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.id == id)
    }

    /// Live columns in display order.
    ///
    /// Sorted by `(order, position in list)` so duplicate or gapped order
    /// values still produce a stable layout.
    pub fn ordered_columns(&self) -> Vec<&Column> {
        let mut live: Vec<(usize, &Column)> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_live())
            .collect();
        live.sort_by_key(|(pos, c)| (c.order, *pos));
        live.into_iter().map(|(_, c)| c).collect()
    }

    /// The live column a task renders under, or `None` for the unassigned lane.
    ///
    /// Tasks pointing at a missing or deleted column fall back to unassigned.
    pub fn lane_of<'a>(&'a self, task: &'a Task) -> Option<&'a str> {
        let column_id = task.column_id.as_deref()?;
        self.column(column_id)
            .filter(|c| c.is_live())
            .map(|c| c.id.as_str())
    }

    /// Live tasks rendered in the given lane (`None` = unassigned)
    pub fn tasks_in_lane(&self, lane: Option<&str>) -> Vec<&Task> {
        self.tasks
            .iter()
            .filter(|t| t.is_live() && self.lane_of(t) == lane)
            .collect()
    }

    /// Point a task at a new column. Returns false if the task is unknown.
    pub fn move_task(&mut self, task_id: &str, column_id: Option<String>) -> bool {
        match self.task_mut(task_id) {
            Some(task) => {
                task.column_id = column_id.filter(|c| !c.is_empty());
                true
            }
            None => false,
        }
    }

    /// Rewrite live column orders to a dense 0..N-1 ranking, keeping display order
    pub fn renumber_columns(&mut self) {
        let ids: Vec<String> = self
            .ordered_columns()
            .into_iter()
            .map(|c| c.id.clone())
            .collect();
        for (rank, id) in ids.iter().enumerate() {
            if let Some(column) = self.column_mut(id) {
                column.order = rank as i64;
            }
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// `dueDate` codec: absent is written as `""`
mod due_date {
    use chrono::{DateTime, NaiveDate};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S>(value: &Option<NaiveDate>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(date) => serializer.serialize_str(&date.format(FORMAT).to_string()),
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        let raw = match raw.as_deref().map(str::trim) {
            None | Some("") => return Ok(None),
            Some(s) => s,
        };
        if let Ok(date) = NaiveDate::parse_from_str(raw, FORMAT) {
            return Ok(Some(date));
        }
        match DateTime::parse_from_rfc3339(raw) {
            Ok(dt) => Ok(Some(dt.date_naive())),
            Err(_) => {
                // One odd date must not make the whole board unreadable
                tracing::warn!("[Board] ignoring unreadable dueDate '{}'", raw);
                Ok(None)
            }
        }
    }
}
