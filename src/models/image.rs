use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Image {
    pub id: i64,
    pub title: String,
    pub file: String, // relative to the media root
    pub width: i64,
    pub height: i64,
    pub file_size: i64,
    pub file_hash: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct ImageForm {
    pub title: String,
    pub file: String,
    pub width: i64,
    pub height: i64,
    pub file_size: i64,
    pub file_hash: String,
}

impl Image {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Image {
            id: row.get("id")?,
            title: row.get("title")?,
            file: row.get("file")?,
            width: row.get("width")?,
            height: row.get("height")?,
            file_size: row.get("file_size")?,
            file_hash: row.get("file_hash")?,
            created_at: row.get("created_at")?,
        })
    }

    /// Servable location of the original file.
    pub fn url(&self, media_url: &str) -> String {
        format!("{}/{}", media_url.trim_end_matches('/'), self.file)
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row("SELECT * FROM images WHERE id = ?1", params![id], Self::from_row)
            .ok()
    }

    pub fn count(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row("SELECT COUNT(*) FROM images", [], |row| row.get(0))
            .unwrap_or(0)
    }

    pub fn create(pool: &DbPool, form: &ImageForm) -> Result<i64, String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "INSERT INTO images (title, file, width, height, file_size, file_hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                form.title,
                form.file,
                form.width,
                form.height,
                form.file_size,
                form.file_hash
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }
}
