use chrono::NaiveDate;
use hearth_core::types::{Priority, RecurrenceRule, UserRole};
use serde::{Deserialize, Serialize};

/// A persisted task row. Template tasks carry `recurrence_rule` and no
/// `parent_task_id`; spawned instances carry `parent_task_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    /// Date-only due date. For a template this is the recurrence anchor —
    /// the first date the rule is active from.
    pub due_date: NaiveDate,
    pub is_done: bool,
    pub priority: Priority,
    pub category_id: Option<i64>,
    pub assigned_to: Option<i64>,
    pub created_by: i64,
    pub completed_by: Option<i64>,
    /// RFC3339 completion timestamp, set together with `completed_by`.
    pub completed_at: Option<String>,
    /// `None` for plain tasks and for rows whose stored rule value is
    /// unrecognized (those degrade to "never recurs").
    pub recurrence_rule: Option<RecurrenceRule>,
    pub parent_task_id: Option<i64>,
    pub created_at: String,
}

impl Task {
    /// A template defines a recurring pattern: rule set, no parent.
    pub fn is_template(&self) -> bool {
        self.recurrence_rule.is_some() && self.parent_task_id.is_none()
    }
}

/// Insert payload for a user-created task.
#[derive(Debug, Clone, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub assigned_to: Option<i64>,
    pub created_by: i64,
    #[serde(default)]
    pub recurrence_rule: Option<RecurrenceRule>,
}

/// Which tasks a list query returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskFilter {
    #[default]
    Open,
    Done,
    All,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskCategory {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: UserRole,
    pub invited_by: Option<i64>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InviteCode {
    pub id: i64,
    pub code: String,
    pub created_by: i64,
    pub is_active: bool,
    pub used_by: Option<i64>,
    pub used_at: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShoppingItem {
    pub id: i64,
    pub name: String,
    pub category: String,
    pub is_checked: bool,
    pub added_by: i64,
    pub created_at: String,
}
