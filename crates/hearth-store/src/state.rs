//! Key-value app state — home of the recurrence watermark.
//!
//! The watermark row maps [`hearth_core::config::LAST_RECURRENCE_MONDAY`] to
//! an ISO `YYYY-MM-DD` Monday. ISO dates sort lexicographically in
//! chronological order, so the conditional UPDATE below compares inside SQL
//! and the row's atomicity is what makes the week claim race-safe across
//! processes. The Rust API speaks `NaiveDate` throughout.

use chrono::NaiveDate;
use rusqlite::Connection;
use tracing::warn;

use crate::error::Result;

/// Current value of a date-valued state key, `None` when absent.
///
/// A value that fails to parse is reported as absent (with a warning) —
/// only this crate ever writes the row, so that is corrupt data, not a
/// normal state.
pub fn read_date(conn: &Connection, key: &str) -> Result<Option<NaiveDate>> {
    let raw: Option<String> = match conn.query_row(
        "SELECT value FROM app_state WHERE key = ?1",
        [key],
        |row| row.get(0),
    ) {
        Ok(v) => Some(v),
        Err(rusqlite::Error::QueryReturnedNoRows) => None,
        Err(e) => return Err(e.into()),
    };
    Ok(raw.and_then(|s| match s.parse::<NaiveDate>() {
        Ok(d) => Some(d),
        Err(e) => {
            warn!(key, value = %s, "unparseable date in app_state: {e}");
            None
        }
    }))
}

/// Conditionally advance `key` to `value`: succeeds only when the stored
/// value is strictly older. Exactly one concurrent caller can win because
/// the predicate is evaluated inside the row update.
pub fn advance_if_newer(conn: &Connection, key: &str, value: NaiveDate) -> Result<bool> {
    let changed = conn.execute(
        "UPDATE app_state SET value = ?2 WHERE key = ?1 AND value < ?2",
        rusqlite::params![key, value.to_string()],
    )?;
    Ok(changed == 1)
}

/// First-ever write: insert the row only if no row exists yet. The loser of
/// a racing first insert observes 0 affected rows, not an error.
pub fn insert_if_absent(conn: &Connection, key: &str, value: NaiveDate) -> Result<bool> {
    let changed = conn.execute(
        "INSERT OR IGNORE INTO app_state (key, value) VALUES (?1, ?2)",
        rusqlite::params![key, value.to_string()],
    )?;
    Ok(changed == 1)
}

/// Claim `monday` for processing: true for exactly one caller system-wide.
///
/// Tries the conditional advance first; when no row was touched, either the
/// row does not exist yet (first run — insert-if-absent settles the race)
/// or its value is already >= `monday` (the week is spent).
pub fn claim_week(conn: &Connection, key: &str, monday: NaiveDate) -> Result<bool> {
    if advance_if_newer(conn, key, monday)? {
        return Ok(true);
    }
    if read_date(conn, key)?.is_none() {
        return insert_if_absent(conn, key, monday);
    }
    Ok(false)
}
