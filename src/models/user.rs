use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

/// Password hash value that can never match, for accounts created by the importer.
pub const UNUSABLE_PASSWORD: &str = "!";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_active: bool,
    pub date_joined: String,
}

impl User {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let active: i32 = row.get(4)?;
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            is_active: active != 0,
            date_joined: row.get(5)?,
        })
    }

    const SELECT_COLS: &'static str =
        "id, username, email, password_hash, is_active, date_joined";

    // ── Lookups ──

    pub fn get_by_id(pool: &DbPool, id: i64) -> Option<User> {
        let conn = pool.get().ok()?;
        conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", Self::SELECT_COLS),
            params![id],
            Self::from_row,
        )
        .ok()
    }

    pub fn get_by_username(pool: &DbPool, username: &str) -> Option<User> {
        let conn = pool.get().ok()?;
        conn.query_row(
            &format!("SELECT {} FROM users WHERE username = ?1", Self::SELECT_COLS),
            params![username],
            Self::from_row,
        )
        .ok()
    }

    pub fn first(pool: &DbPool) -> Option<User> {
        let conn = pool.get().ok()?;
        conn.query_row(
            &format!("SELECT {} FROM users ORDER BY id ASC LIMIT 1", Self::SELECT_COLS),
            [],
            Self::from_row,
        )
        .ok()
    }

    pub fn list_all(pool: &DbPool) -> Vec<User> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY id ASC",
            Self::SELECT_COLS
        )) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn count(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap_or(0)
    }

    // ── Create ──

    /// Insert a user with an unusable password. Fails on a duplicate username.
    pub fn create(pool: &DbPool, username: &str, email: &str) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        Self::create_in(&conn, username, email)
    }

    pub fn create_in(conn: &Connection, username: &str, email: &str) -> Result<i64, String> {
        conn.execute(
            "INSERT INTO users (username, email, password_hash, is_active)
             VALUES (?1, ?2, ?3, 1)",
            params![username, email, UNUSABLE_PASSWORD],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }
}
