use std::str::FromStr;
use std::sync::Mutex;

use hearth_core::types::UserRole;
use rusqlite::Connection;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::error::{Result, StoreError};
use crate::types::{InviteCode, User};

/// Invite codes are 12 hex chars from a v4 UUID — short enough to type,
/// random enough to not be guessable within a household deployment.
const INVITE_CODE_LEN: usize = 12;

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    let role = UserRole::from_str(&row.get::<_, String>(2)?).unwrap_or_default();
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        role,
        invited_by: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn row_to_invite(row: &rusqlite::Row<'_>) -> rusqlite::Result<InviteCode> {
    Ok(InviteCode {
        id: row.get(0)?,
        code: row.get(1)?,
        created_by: row.get(2)?,
        is_active: row.get::<_, i64>(3)? != 0,
        used_by: row.get(4)?,
        used_at: row.get(5)?,
        created_at: row.get(6)?,
    })
}

/// Users and invite codes. Registration goes through [`UserStore::redeem_invite`];
/// there is no password or session machinery here.
pub struct UserStore {
    db: Mutex<Connection>,
}

impl UserStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            db: Mutex::new(conn),
        }
    }

    pub fn list(&self) -> Result<Vec<User>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, username, role, invited_by, created_at
             FROM users ORDER BY username",
        )?;
        let rows = stmt.query_map([], row_to_user)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    pub fn get(&self, id: i64) -> Result<Option<User>> {
        let db = self.db.lock().unwrap();
        match db.query_row(
            "SELECT id, username, role, invited_by, created_at FROM users WHERE id = ?1",
            [id],
            row_to_user,
        ) {
            Ok(u) => Ok(Some(u)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Create a user directly (bootstrap / admin path).
    #[instrument(skip(self))]
    pub fn create(&self, username: &str, role: UserRole, invited_by: Option<i64>) -> Result<User> {
        let db = self.db.lock().unwrap();
        insert_user(&db, username, role, invited_by)
    }

    /// Mint a fresh single-use invite code for `created_by`.
    #[instrument(skip(self))]
    pub fn mint_invite(&self, created_by: i64) -> Result<InviteCode> {
        let db = self.db.lock().unwrap();
        let code: String = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(INVITE_CODE_LEN)
            .collect();
        let now = chrono::Utc::now().to_rfc3339();
        db.execute(
            "INSERT INTO invite_codes (code, created_by, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![code, created_by, now],
        )?;
        let id = db.last_insert_rowid();
        info!(invite_id = id, created_by, "invite code minted");
        fetch_invite(&db, id)
    }

    pub fn list_invites(&self) -> Result<Vec<InviteCode>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT id, code, created_by, is_active, used_by, used_at, created_at
             FROM invite_codes ORDER BY created_at DESC",
        )?;
        let rows = stmt.query_map([], row_to_invite)?;
        Ok(rows.filter_map(|r| r.ok()).collect())
    }

    /// Register via invite: create the user and consume the code in one
    /// transaction, so a spent code can never admit two users.
    #[instrument(skip(self), fields(username))]
    pub fn redeem_invite(&self, code: &str, username: &str) -> Result<User> {
        let mut db = self.db.lock().unwrap();
        let tx = db.transaction()?;

        let invite = match tx.query_row(
            "SELECT id, code, created_by, is_active, used_by, used_at, created_at
             FROM invite_codes WHERE code = ?1",
            [code],
            row_to_invite,
        ) {
            Ok(i) => i,
            Err(rusqlite::Error::QueryReturnedNoRows) => {
                return Err(StoreError::Invalid {
                    field: "invite_code",
                    value: code.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };
        if !invite.is_active {
            return Err(StoreError::Conflict("invite code already used".to_string()));
        }

        let user = insert_user(&tx, username, UserRole::Member, Some(invite.created_by))?;

        let now = chrono::Utc::now().to_rfc3339();
        tx.execute(
            "UPDATE invite_codes SET is_active = 0, used_by = ?1, used_at = ?2 WHERE id = ?3",
            rusqlite::params![user.id, now, invite.id],
        )?;

        tx.commit()?;
        info!(user_id = user.id, invite_id = invite.id, "invite redeemed");
        Ok(user)
    }
}

fn insert_user(
    conn: &Connection,
    username: &str,
    role: UserRole,
    invited_by: Option<i64>,
) -> Result<User> {
    let username = username.trim();
    if username.len() < 3 {
        return Err(StoreError::Invalid {
            field: "username",
            value: username.to_string(),
        });
    }
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO users (username, role, invited_by, created_at) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![username, role.to_string(), invited_by, now],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            StoreError::Conflict(format!("username '{username}' is taken"))
        }
        other => StoreError::Database(other),
    })?;
    let id = conn.last_insert_rowid();
    conn.query_row(
        "SELECT id, username, role, invited_by, created_at FROM users WHERE id = ?1",
        [id],
        row_to_user,
    )
    .map_err(StoreError::Database)
}

fn fetch_invite(conn: &Connection, id: i64) -> Result<InviteCode> {
    conn.query_row(
        "SELECT id, code, created_by, is_active, used_by, used_at, created_at
         FROM invite_codes WHERE id = ?1",
        [id],
        row_to_invite,
    )
    .map_err(StoreError::Database)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;

    fn store() -> UserStore {
        let conn = Connection::open_in_memory().expect("open");
        init_db(&conn).expect("init");
        UserStore::new(conn)
    }

    #[test]
    fn create_and_list() {
        let store = store();
        store
            .create("martha", UserRole::Hausmeister, None)
            .expect("create");
        store.create("arno", UserRole::Member, None).expect("create");
        let users = store.list().expect("list");
        assert_eq!(users.len(), 2);
        // Ordered by username.
        assert_eq!(users[0].username, "arno");
    }

    #[test]
    fn duplicate_username_is_conflict() {
        let store = store();
        store.create("martha", UserRole::Member, None).expect("create");
        let err = store.create("martha", UserRole::Member, None);
        assert!(matches!(err, Err(StoreError::Conflict(_))));
    }

    #[test]
    fn short_username_rejected() {
        let store = store();
        let err = store.create("ab", UserRole::Member, None);
        assert!(matches!(
            err,
            Err(StoreError::Invalid { field: "username", .. })
        ));
    }

    #[test]
    fn redeem_consumes_code() {
        let store = store();
        let admin = store
            .create("martha", UserRole::Hausmeister, None)
            .expect("create admin");
        let invite = store.mint_invite(admin.id).expect("mint");
        assert!(invite.is_active);
        assert_eq!(invite.code.len(), INVITE_CODE_LEN);

        let user = store.redeem_invite(&invite.code, "newbie").expect("redeem");
        assert_eq!(user.invited_by, Some(admin.id));

        // Second redemption of the same code fails.
        let err = store.redeem_invite(&invite.code, "another");
        assert!(matches!(err, Err(StoreError::Conflict(_))));

        let invites = store.list_invites().expect("list");
        assert_eq!(invites[0].used_by, Some(user.id));
        assert!(!invites[0].is_active);
    }

    #[test]
    fn unknown_code_is_invalid() {
        let store = store();
        let err = store.redeem_invite("nope", "somebody");
        assert!(matches!(
            err,
            Err(StoreError::Invalid { field: "invite_code", .. })
        ));
    }

    #[test]
    fn failed_redeem_leaves_no_user_behind() {
        let store = store();
        let admin = store.create("martha", UserRole::Member, None).expect("create");
        let invite = store.mint_invite(admin.id).expect("mint");
        // Username too short — the transaction rolls back, the code stays live.
        assert!(store.redeem_invite(&invite.code, "ab").is_err());
        assert_eq!(store.list().expect("list").len(), 1);
        assert!(store.list_invites().expect("list")[0].is_active);
    }
}
