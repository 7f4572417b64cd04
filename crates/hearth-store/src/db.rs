use rusqlite::{Connection, Result};

/// Initialise all tables for the board. Safe to call on every startup —
/// CREATE IF NOT EXISTS means it's idempotent.
pub fn init_db(conn: &Connection) -> Result<()> {
    create_users_table(conn)?;
    create_invite_codes_table(conn)?;
    create_task_categories_table(conn)?;
    create_tasks_table(conn)?;
    create_shopping_table(conn)?;
    create_app_state_table(conn)?;
    Ok(())
}

/// True when the tables the recurrence spawner needs exist. A fresh worker
/// can come up against a database another process has not migrated yet; the
/// spawn run skips instead of erroring in that window.
pub fn spawn_schema_ready(conn: &Connection) -> Result<bool> {
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master
         WHERE type = 'table' AND name IN ('tasks', 'app_state')",
        [],
        |row| row.get(0),
    )?;
    Ok(n == 2)
}

fn create_users_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS users (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            username    TEXT NOT NULL UNIQUE,
            role        TEXT NOT NULL DEFAULT 'member',
            invited_by  INTEGER REFERENCES users(id),
            created_at  TEXT NOT NULL
        );",
    )
}

fn create_invite_codes_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS invite_codes (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            code        TEXT NOT NULL UNIQUE,
            created_by  INTEGER NOT NULL REFERENCES users(id),
            is_active   INTEGER NOT NULL DEFAULT 1,
            used_by     INTEGER REFERENCES users(id),
            used_at     TEXT,
            created_at  TEXT NOT NULL
        );",
    )
}

fn create_task_categories_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS task_categories (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL UNIQUE,
            created_at  TEXT NOT NULL
        );",
    )
}

/// The central table. A row is a *template* when `recurrence_rule` is set
/// and `parent_task_id` is NULL; rows created by the spawner carry
/// `parent_task_id` pointing at their template.
fn create_tasks_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS tasks (
            id              INTEGER PRIMARY KEY AUTOINCREMENT,
            title           TEXT NOT NULL,
            description     TEXT,
            due_date        TEXT NOT NULL,            -- ISO YYYY-MM-DD
            is_done         INTEGER NOT NULL DEFAULT 0,
            priority        TEXT NOT NULL DEFAULT 'medium',
            category_id     INTEGER REFERENCES task_categories(id),
            assigned_to     INTEGER REFERENCES users(id),
            created_by      INTEGER NOT NULL REFERENCES users(id),
            completed_by    INTEGER REFERENCES users(id),
            completed_at    TEXT,
            recurrence_rule TEXT,
            -- Instances outlive their template: deleting a template detaches
            -- its children instead of cascading.
            parent_task_id  INTEGER REFERENCES tasks(id) ON DELETE SET NULL,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_due ON tasks (due_date);
        -- Duplicate-spawn check: lookups by (parent, due_date).
        CREATE INDEX IF NOT EXISTS idx_tasks_parent ON tasks (parent_task_id, due_date);",
    )
}

fn create_shopping_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS shopping_list_items (
            id          INTEGER PRIMARY KEY AUTOINCREMENT,
            name        TEXT NOT NULL,
            category    TEXT NOT NULL DEFAULT 'sonstiges',
            is_checked  INTEGER NOT NULL DEFAULT 0,
            added_by    INTEGER NOT NULL REFERENCES users(id),
            created_at  TEXT NOT NULL
        );",
    )
}

/// Key-value store for internal app state, e.g. the recurrence watermark.
fn create_app_state_table(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS app_state (
            key    TEXT PRIMARY KEY NOT NULL,
            value  TEXT NOT NULL
        );",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        let conn = Connection::open_in_memory().expect("open");
        init_db(&conn).expect("first init");
        init_db(&conn).expect("second init");
        assert!(spawn_schema_ready(&conn).expect("check"));
    }

    #[test]
    fn schema_not_ready_on_fresh_db() {
        let conn = Connection::open_in_memory().expect("open");
        assert!(!spawn_schema_ready(&conn).expect("check"));
    }
}
