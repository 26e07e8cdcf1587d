use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PageRevision {
    pub id: i64,
    pub page_id: i64,
    pub content_json: String,
    pub created_at: String,
    pub published_at: Option<String>,
}

impl PageRevision {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(PageRevision {
            id: row.get("id")?,
            page_id: row.get("page_id")?,
            content_json: row.get("content_json")?,
            created_at: row.get("created_at")?,
            published_at: row.get("published_at")?,
        })
    }

    pub fn for_page(pool: &DbPool, page_id: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt = match conn
            .prepare("SELECT * FROM page_revisions WHERE page_id = ?1 ORDER BY id ASC")
        {
            Ok(s) => s,
            Err(_) => return vec![],
        };
        stmt.query_map(params![page_id], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn save_in(conn: &Connection, page_id: i64, content_json: &str) -> Result<i64, String> {
        conn.execute(
            "INSERT INTO page_revisions (page_id, content_json) VALUES (?1, ?2)",
            params![page_id, content_json],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }

    /// Make revision `id` the page's current version. `live` decides whether
    /// the page becomes publicly visible; the first publish date is only set once.
    pub fn publish_in(conn: &Connection, id: i64, live: bool) -> Result<(), String> {
        let page_id: i64 = conn
            .query_row(
                "SELECT page_id FROM page_revisions WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .map_err(|e| format!("Revision {} not found: {}", id, e))?;

        conn.execute(
            "UPDATE page_revisions SET published_at = CURRENT_TIMESTAMP WHERE id = ?1",
            params![id],
        )
        .map_err(|e| e.to_string())?;

        conn.execute(
            "UPDATE pages SET latest_revision_id = ?1, live = ?2,
                 last_published_at = CASE WHEN ?2 = 1 THEN CURRENT_TIMESTAMP ELSE last_published_at END,
                 first_published_at = CASE WHEN ?2 = 1 THEN COALESCE(first_published_at, CURRENT_TIMESTAMP)
                                           ELSE first_published_at END
             WHERE id = ?3",
            params![id, live as i32, page_id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }
}
