use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub slug: String,
}

impl Tag {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Tag {
            id: row.get("id")?,
            name: row.get("name")?,
            slug: row.get("slug")?,
        })
    }

    pub fn find_by_name(pool: &DbPool, name: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        Self::find_by_name_in(&conn, name)
    }

    fn find_by_name_in(conn: &Connection, name: &str) -> Option<Self> {
        conn.query_row(
            "SELECT * FROM tags WHERE name = ?1",
            params![name],
            Self::from_row,
        )
        .optional()
        .ok()
        .flatten()
    }

    pub fn count(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row("SELECT COUNT(*) FROM tags", [], |row| row.get(0))
            .unwrap_or(0)
    }

    pub fn for_entry(pool: &DbPool, entry_id: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn.prepare(
            "SELECT t.* FROM tags t
             JOIN entry_tags et ON et.tag_id = t.id
             WHERE et.entry_id = ?1
             ORDER BY t.name",
        ) {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![entry_id], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn attach_in(conn: &Connection, entry_id: i64, tag_id: i64) -> Result<(), String> {
        conn.execute(
            "INSERT OR IGNORE INTO entry_tags (entry_id, tag_id) VALUES (?1, ?2)",
            params![entry_id, tag_id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }

    pub fn find_or_create(pool: &DbPool, name: &str) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        Self::find_or_create_in(&conn, name)
    }

    /// Tags are keyed by exact name; the slug is derived and not unique.
    pub fn find_or_create_in(conn: &Connection, name: &str) -> Result<i64, String> {
        if let Some(existing) = Self::find_by_name_in(conn, name) {
            return Ok(existing.id);
        }
        conn.execute(
            "INSERT INTO tags (name, slug) VALUES (?1, ?2)",
            params![name, slug::slugify(name)],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }
}
