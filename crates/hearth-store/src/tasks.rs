use std::str::FromStr;
use std::sync::Mutex;

use chrono::NaiveDate;
use hearth_core::types::{Priority, RecurrenceRule};
use rusqlite::Connection;
use tracing::{debug, instrument};

use crate::error::{Result, StoreError};
use crate::types::{NewTask, Task, TaskCategory, TaskFilter};

/// Column list shared by every task SELECT in this crate so `row_to_task`
/// stays consistent.
const TASK_COLUMNS: &str = "id, title, description, due_date, is_done, priority,
     category_id, assigned_to, created_by, completed_by, completed_at,
     recurrence_rule, parent_task_id, created_at";

/// Map a SELECT row (column order from TASK_COLUMNS) to a Task.
pub(crate) fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    let due_date = parse_date(3, row.get::<_, String>(3)?)?;
    let priority = Priority::from_str(&row.get::<_, String>(5)?).unwrap_or_default();
    // Unrecognized rule text degrades to None — the row simply never recurs.
    let recurrence_rule = row
        .get::<_, Option<String>>(11)?
        .and_then(|s| RecurrenceRule::from_str(&s).ok());
    Ok(Task {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        due_date,
        is_done: row.get::<_, i64>(4)? != 0,
        priority,
        category_id: row.get(6)?,
        assigned_to: row.get(7)?,
        created_by: row.get(8)?,
        completed_by: row.get(9)?,
        completed_at: row.get(10)?,
        recurrence_rule,
        parent_task_id: row.get(12)?,
        created_at: row.get(13)?,
    })
}

fn parse_date(idx: usize, s: String) -> rusqlite::Result<NaiveDate> {
    s.parse::<NaiveDate>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

// ---------------------------------------------------------------------------
// Connection-level functions — composable inside a caller-owned transaction.
// The recurrence spawner uses these so its claim and inserts share one
// atomic commit.
// ---------------------------------------------------------------------------

/// All template tasks: recurrence rule set, no parent.
pub fn list_templates(conn: &Connection) -> Result<Vec<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks
         WHERE recurrence_rule IS NOT NULL AND parent_task_id IS NULL
         ORDER BY id"
    ))?;
    let rows = stmt.query_map([], row_to_task)?;
    Ok(rows.filter_map(|r| r.ok()).collect())
}

/// The task occupying (template, date), if any — either the template row
/// itself or one of its direct children. This is the duplicate-spawn guard.
pub fn find_instance(
    conn: &Connection,
    template_id: i64,
    date: NaiveDate,
) -> Result<Option<Task>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TASK_COLUMNS} FROM tasks
         WHERE (id = ?1 OR parent_task_id = ?1) AND due_date = ?2
         LIMIT 1"
    ))?;
    let mut rows = stmt.query_map(
        rusqlite::params![template_id, date.to_string()],
        row_to_task,
    )?;
    match rows.next() {
        Some(row) => Ok(Some(row?)),
        None => Ok(None),
    }
}

/// Insert a spawned instance of `template` due on `date`.
///
/// Copies title/description/category/assignee/creator/rule from the
/// template; priority intentionally defaults instead of inheriting.
pub fn insert_instance(conn: &Connection, template: &Task, date: NaiveDate) -> Result<i64> {
    let now = chrono::Utc::now().to_rfc3339();
    let rule = template.recurrence_rule.map(|r| r.to_string());
    conn.execute(
        "INSERT INTO tasks
         (title, description, due_date, category_id, assigned_to, created_by,
          recurrence_rule, parent_task_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            template.title,
            template.description,
            date.to_string(),
            template.category_id,
            template.assigned_to,
            template.created_by,
            rule,
            template.id,
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

// ---------------------------------------------------------------------------
// Manager for the HTTP routes.
// ---------------------------------------------------------------------------

/// Thread-safe task store for the CRUD surface.
///
/// Wraps a single SQLite connection in a `Mutex` — sufficient for a
/// single-node deployment; cross-process safety comes from SQLite itself.
pub struct TaskStore {
    db: Mutex<Connection>,
}

impl TaskStore {
    /// Wrap an already-open (and `init_db`-initialised) connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// List tasks ordered by due date, filtered by completion state.
    #[instrument(skip(self))]
    pub fn list(&self, filter: TaskFilter) -> Result<Vec<Task>> {
        let db = self.db.lock().unwrap();
        let where_clause = match filter {
            TaskFilter::Open => "WHERE is_done = 0",
            TaskFilter::Done => "WHERE is_done = 1",
            TaskFilter::All => "",
        };
        let mut stmt = db.prepare(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks {where_clause} ORDER BY due_date, id"
        ))?;
        let rows = stmt.query_map([], row_to_task)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Fetch one task, `None` when the id is unknown.
    pub fn get(&self, id: i64) -> Result<Option<Task>> {
        let db = self.db.lock().unwrap();
        get_by_id(&db, id)
    }

    /// Create a user-authored task (plain or template).
    #[instrument(skip(self, new), fields(title = %new.title))]
    pub fn create(&self, new: &NewTask) -> Result<Task> {
        if new.title.trim().is_empty() {
            return Err(StoreError::Invalid {
                field: "title",
                value: new.title.clone(),
            });
        }
        let db = self.db.lock().unwrap();
        let now = chrono::Utc::now().to_rfc3339();
        db.execute(
            "INSERT INTO tasks
             (title, description, due_date, priority, category_id, assigned_to,
              created_by, recurrence_rule, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            rusqlite::params![
                new.title.trim(),
                new.description,
                new.due_date.to_string(),
                new.priority.to_string(),
                new.category_id,
                new.assigned_to,
                new.created_by,
                new.recurrence_rule.map(|r| r.to_string()),
                now,
            ],
        )?;
        let id = db.last_insert_rowid();
        debug!(task_id = id, "task created");
        fetch_required(&db, id)
    }

    /// Overwrite the editable fields of an existing task.
    #[instrument(skip(self, new))]
    pub fn update(&self, id: i64, new: &NewTask) -> Result<Task> {
        if new.title.trim().is_empty() {
            return Err(StoreError::Invalid {
                field: "title",
                value: new.title.clone(),
            });
        }
        let db = self.db.lock().unwrap();
        let changed = db.execute(
            "UPDATE tasks SET title = ?1, description = ?2, due_date = ?3,
                 priority = ?4, category_id = ?5, assigned_to = ?6,
                 recurrence_rule = ?7
             WHERE id = ?8",
            rusqlite::params![
                new.title.trim(),
                new.description,
                new.due_date.to_string(),
                new.priority.to_string(),
                new.category_id,
                new.assigned_to,
                new.recurrence_rule.map(|r| r.to_string()),
                id,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound { what: "task", id });
        }
        fetch_required(&db, id)
    }

    /// Flip completion. Marking done records who completed it and when;
    /// reopening clears both.
    #[instrument(skip(self))]
    pub fn toggle(&self, id: i64, completed_by: Option<i64>) -> Result<Task> {
        let db = self.db.lock().unwrap();
        let task = get_by_id(&db, id)?.ok_or(StoreError::NotFound { what: "task", id })?;
        if task.is_done {
            db.execute(
                "UPDATE tasks SET is_done = 0, completed_by = NULL, completed_at = NULL
                 WHERE id = ?1",
                [id],
            )?;
        } else {
            let now = chrono::Utc::now().to_rfc3339();
            db.execute(
                "UPDATE tasks SET is_done = 1, completed_by = ?1, completed_at = ?2
                 WHERE id = ?3",
                rusqlite::params![completed_by, now, id],
            )?;
        }
        fetch_required(&db, id)
    }

    /// Delete one task. Deleting a template does NOT cascade — spawned
    /// instances persist as independent tasks going forward.
    #[instrument(skip(self))]
    pub fn delete(&self, id: i64) -> Result<()> {
        let db = self.db.lock().unwrap();
        let changed = db.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(StoreError::NotFound { what: "task", id });
        }
        Ok(())
    }

    pub fn list_categories(&self) -> Result<Vec<TaskCategory>> {
        let db = self.db.lock().unwrap();
        let mut stmt =
            db.prepare("SELECT id, name, created_at FROM task_categories ORDER BY name")?;
        let rows = stmt.query_map([], |row| {
            Ok(TaskCategory {
                id: row.get(0)?,
                name: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    #[instrument(skip(self))]
    pub fn create_category(&self, name: &str) -> Result<TaskCategory> {
        let name = name.trim();
        if name.is_empty() {
            return Err(StoreError::Invalid {
                field: "name",
                value: name.to_string(),
            });
        }
        let db = self.db.lock().unwrap();
        let now = chrono::Utc::now().to_rfc3339();
        db.execute(
            "INSERT INTO task_categories (name, created_at) VALUES (?1, ?2)",
            rusqlite::params![name, now],
        )
        .map_err(|e| match e {
            rusqlite::Error::SqliteFailure(err, _)
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                StoreError::Conflict(format!("category '{name}' already exists"))
            }
            other => StoreError::Database(other),
        })?;
        let id = db.last_insert_rowid();
        db.query_row(
            "SELECT id, name, created_at FROM task_categories WHERE id = ?1",
            [id],
            |row| {
                Ok(TaskCategory {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    created_at: row.get(2)?,
                })
            },
        )
        .map_err(StoreError::Database)
    }
}

fn get_by_id(conn: &Connection, id: i64) -> Result<Option<Task>> {
    match conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
        [id],
        row_to_task,
    ) {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(StoreError::Database(e)),
    }
}

fn fetch_required(conn: &Connection, id: i64) -> Result<Task> {
    get_by_id(conn, id)?.ok_or(StoreError::NotFound { what: "task", id })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use hearth_core::types::RecurrenceRule;

    fn store() -> TaskStore {
        let conn = Connection::open_in_memory().expect("open");
        conn.execute_batch("PRAGMA foreign_keys=ON;").expect("pragma");
        init_db(&conn).expect("init");
        seed_user(&conn);
        TaskStore::new(conn)
    }

    fn seed_user(conn: &Connection) {
        conn.execute(
            "INSERT INTO users (username, role, created_at) VALUES ('anna', 'member', '2026-01-01')",
            [],
        )
        .expect("seed user");
    }

    fn d(s: &str) -> NaiveDate {
        s.parse().expect("valid date")
    }

    fn new_task(title: &str, due: &str, rule: Option<RecurrenceRule>) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: None,
            due_date: d(due),
            priority: Default::default(),
            category_id: None,
            assigned_to: None,
            created_by: 1,
            recurrence_rule: rule,
        }
    }

    #[test]
    fn create_and_list_ordered_by_due_date() {
        let store = store();
        store
            .create(&new_task("later", "2026-04-10", None))
            .expect("create");
        store
            .create(&new_task("sooner", "2026-04-01", None))
            .expect("create");
        let tasks = store.list(TaskFilter::Open).expect("list");
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].title, "sooner");
    }

    #[test]
    fn empty_title_rejected() {
        let store = store();
        let err = store.create(&new_task("   ", "2026-04-01", None));
        assert!(matches!(err, Err(StoreError::Invalid { field: "title", .. })));
    }

    #[test]
    fn toggle_records_completer_and_clears_on_reopen() {
        let store = store();
        let task = store
            .create(&new_task("dishes", "2026-04-01", None))
            .expect("create");
        let done = store.toggle(task.id, Some(1)).expect("toggle");
        assert!(done.is_done);
        assert_eq!(done.completed_by, Some(1));
        assert!(done.completed_at.is_some());

        let reopened = store.toggle(task.id, None).expect("toggle back");
        assert!(!reopened.is_done);
        assert_eq!(reopened.completed_by, None);
        assert_eq!(reopened.completed_at, None);
    }

    #[test]
    fn list_templates_excludes_plain_and_child_tasks() {
        let store = store();
        let template = store
            .create(&new_task("laundry", "2026-04-01", Some(RecurrenceRule::Weekly)))
            .expect("create template");
        store
            .create(&new_task("one-off", "2026-04-02", None))
            .expect("create plain");

        let db = store.db.lock().unwrap();
        let tpl = get_by_id(&db, template.id).expect("get").expect("some");
        insert_instance(&db, &tpl, d("2026-04-08")).expect("insert instance");

        let templates = list_templates(&db).expect("list templates");
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].id, template.id);
        assert!(templates[0].is_template());
    }

    #[test]
    fn find_instance_sees_template_row_and_children() {
        let store = store();
        let template = store
            .create(&new_task("bins", "2026-04-01", Some(RecurrenceRule::Weekly)))
            .expect("create template");
        let db = store.db.lock().unwrap();
        let tpl = get_by_id(&db, template.id).expect("get").expect("some");

        // The template's own row occupies its anchor date.
        assert!(find_instance(&db, tpl.id, d("2026-04-01"))
            .expect("find")
            .is_some());
        assert!(find_instance(&db, tpl.id, d("2026-04-08"))
            .expect("find")
            .is_none());

        insert_instance(&db, &tpl, d("2026-04-08")).expect("insert");
        let hit = find_instance(&db, tpl.id, d("2026-04-08"))
            .expect("find")
            .expect("some");
        assert_eq!(hit.parent_task_id, Some(tpl.id));
        assert_eq!(hit.title, "bins");
    }

    #[test]
    fn unrecognized_rule_degrades_to_none() {
        let store = store();
        let db = store.db.lock().unwrap();
        db.execute(
            "INSERT INTO tasks (title, due_date, created_by, recurrence_rule, created_at)
             VALUES ('odd', '2026-04-01', 1, 'fortnightly', '2026-01-01')",
            [],
        )
        .expect("raw insert");
        let templates = list_templates(&db).expect("list");
        // Row is selected (rule column non-NULL) but parses to None.
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].recurrence_rule, None);
    }

    #[test]
    fn delete_template_keeps_instances() {
        let store = store();
        let template = store
            .create(&new_task("plants", "2026-04-01", Some(RecurrenceRule::Daily)))
            .expect("create");
        let instance_id = {
            let db = store.db.lock().unwrap();
            let tpl = get_by_id(&db, template.id).expect("get").expect("some");
            insert_instance(&db, &tpl, d("2026-04-02")).expect("insert")
        };
        store.delete(template.id).expect("delete template");
        // The instance survives, detached from the deleted template.
        let orphan = store.get(instance_id).expect("get").expect("still there");
        assert_eq!(orphan.parent_task_id, None);
        assert_eq!(orphan.title, "plants");
    }
}
