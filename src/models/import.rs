use chrono::NaiveDateTime;
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Import {
    pub id: i64,
    pub source: String,
    pub blog_id: Option<String>,
    pub entries_count: i64,
    pub skipped_count: i64,
    pub images_count: i64,
    pub authors_count: i64,
    pub log: Option<String>,
    pub imported_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct ImportForm {
    pub source: String,
    pub blog_id: Option<String>,
    pub entries_count: i64,
    pub skipped_count: i64,
    pub images_count: i64,
    pub authors_count: i64,
    pub log: Option<String>,
}

impl Import {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Import {
            id: row.get("id")?,
            source: row.get("source")?,
            blog_id: row.get("blog_id")?,
            entries_count: row.get("entries_count")?,
            skipped_count: row.get("skipped_count")?,
            images_count: row.get("images_count")?,
            authors_count: row.get("authors_count")?,
            log: row.get("log")?,
            imported_at: row.get("imported_at")?,
        })
    }

    pub fn list(pool: &DbPool) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt =
            match conn.prepare("SELECT * FROM imports ORDER BY imported_at DESC, id DESC LIMIT 50") {
                Ok(s) => s,
                Err(_) => return vec![],
            };
        stmt.query_map([], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn create(pool: &DbPool, form: &ImportForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO imports (source, blog_id, entries_count, skipped_count, images_count, authors_count, log)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                form.source,
                form.blog_id,
                form.entries_count,
                form.skipped_count,
                form.images_count,
                form.authors_count,
                form.log
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }
}
