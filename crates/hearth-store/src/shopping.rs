use std::sync::Mutex;

use rusqlite::Connection;
use tracing::{debug, instrument};

use crate::error::{Result, StoreError};
use crate::types::ShoppingItem;

fn row_to_item(row: &rusqlite::Row<'_>) -> rusqlite::Result<ShoppingItem> {
    Ok(ShoppingItem {
        id: row.get(0)?,
        name: row.get(1)?,
        category: row.get(2)?,
        is_checked: row.get::<_, i64>(3)? != 0,
        added_by: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// The shared shopping list. Items are free-text with a loose category
/// label; checking an item keeps it on the list until a clear pass.
pub struct ShoppingStore {
    db: Mutex<Connection>,
}

impl ShoppingStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    /// Unchecked items first, oldest first within each group.
    pub fn list(&self) -> Result<Vec<ShoppingItem>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, name, category, is_checked, added_by, created_at
             FROM shopping_list_items ORDER BY is_checked, created_at",
        )?;
        let rows = stmt.query_map([], row_to_item)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    #[instrument(skip(self))]
    pub fn add(&self, name: &str, category: Option<&str>, added_by: i64) -> Result<ShoppingItem> {
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
            "INSERT INTO shopping_list_items (name, category, is_checked, added_by, created_at)
             VALUES (?1, ?2, 0, ?3, ?4)",
            rusqlite::params![name, category.unwrap_or("sonstiges"), added_by, now],
        )?;
        let id = db.last_insert_rowid();
        debug!(item_id = id, "shopping item added");
        fetch(&db, id)
    }

    #[instrument(skip(self))]
    pub fn toggle(&self, id: i64) -> Result<ShoppingItem> {
        let db = self.db.lock().unwrap();
        let changed = db.execute(
            "UPDATE shopping_list_items SET is_checked = 1 - is_checked WHERE id = ?1",
            [id],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                what: "shopping item",
                id,
            });
        }
        fetch(&db, id)
    }

    #[instrument(skip(self))]
    pub fn remove(&self, id: i64) -> Result<()> {
        let db = self.db.lock().unwrap();
        let changed = db.execute("DELETE FROM shopping_list_items WHERE id = ?1", [id])?;
        if changed == 0 {
            return Err(StoreError::NotFound {
                what: "shopping item",
                id,
            });
        }
        Ok(())
    }

    /// Remove every checked item; returns how many were cleared.
    #[instrument(skip(self))]
    pub fn clear_checked(&self) -> Result<usize> {
        let db = self.db.lock().unwrap();
        let cleared = db.execute("DELETE FROM shopping_list_items WHERE is_checked = 1", [])?;
        Ok(cleared)
    }
}

fn fetch(conn: &Connection, id: i64) -> Result<ShoppingItem> {
    conn.query_row(
        "SELECT id, name, category, is_checked, added_by, created_at
         FROM shopping_list_items WHERE id = ?1",
        [id],
        row_to_item,
    )
    .map_err(StoreError::Database)
}
