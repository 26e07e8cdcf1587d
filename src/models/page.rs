use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

pub const PAGE_ROOT: &str = "root";
pub const PAGE_BLOG: &str = "blog";
pub const PAGE_ENTRY: &str = "entry";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Page {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub depth: i64,
    pub page_type: String, // root, blog, entry
    pub title: String,
    pub slug: String,
    pub owner_id: Option<i64>,
    pub live: bool,
    pub seo_title: String,
    pub search_description: String,
    pub go_live_at: Option<String>,
    pub first_published_at: Option<String>,
    pub last_published_at: Option<String>,
    pub latest_revision_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct PageForm {
    pub page_type: String,
    pub title: String,
    pub slug: String,
    pub owner_id: Option<i64>,
    pub live: bool,
    pub seo_title: String,
    pub search_description: String,
    pub go_live_at: Option<String>,
    pub first_published_at: Option<String>,
}

impl Page {
    pub(crate) fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let live: i32 = row.get("live")?;
        Ok(Page {
            id: row.get("id")?,
            parent_id: row.get("parent_id")?,
            depth: row.get("depth")?,
            page_type: row.get("page_type")?,
            title: row.get("title")?,
            slug: row.get("slug")?,
            owner_id: row.get("owner_id")?,
            live: live != 0,
            seo_title: row.get("seo_title")?,
            search_description: row.get("search_description")?,
            go_live_at: row.get("go_live_at")?,
            first_published_at: row.get("first_published_at")?,
            last_published_at: row.get("last_published_at")?,
            latest_revision_id: row.get("latest_revision_id")?,
        })
    }

    pub fn find_by_id(pool: &DbPool, id: i64) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row("SELECT * FROM pages WHERE id = ?1", params![id], Self::from_row)
            .ok()
    }

    pub fn find_by_slug(pool: &DbPool, page_type: &str, slug: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        Self::find_by_slug_in(&conn, page_type, slug)
    }

    pub fn find_by_slug_in(conn: &Connection, page_type: &str, slug: &str) -> Option<Self> {
        conn.query_row(
            "SELECT * FROM pages WHERE page_type = ?1 AND slug = ?2",
            params![page_type, slug],
            Self::from_row,
        )
        .optional()
        .ok()
        .flatten()
    }

    /// First page of the tree (the seeded root).
    pub fn root(pool: &DbPool) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM pages WHERE parent_id IS NULL ORDER BY id ASC LIMIT 1",
            [],
            Self::from_row,
        )
        .ok()
    }

    pub fn children(pool: &DbPool, parent_id: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt =
            match conn.prepare("SELECT * FROM pages WHERE parent_id = ?1 ORDER BY id ASC") {
                Ok(s) => s,
                Err(_) => return vec![],
            };
        stmt.query_map(params![parent_id], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    /// Insert `form` as the last child of `parent_id`, one level deeper.
    pub fn add_child_in(conn: &Connection, parent_id: i64, form: &PageForm) -> Result<i64, String> {
        let parent_depth: i64 = conn
            .query_row(
                "SELECT depth FROM pages WHERE id = ?1",
                params![parent_id],
                |row| row.get(0),
            )
            .map_err(|e| format!("Parent page {} not found: {}", parent_id, e))?;

        conn.execute(
            "INSERT INTO pages (parent_id, depth, page_type, title, slug, owner_id, live,
                                seo_title, search_description, go_live_at, first_published_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                parent_id,
                parent_depth + 1,
                form.page_type,
                form.title,
                form.slug,
                form.owner_id,
                form.live as i32,
                form.seo_title,
                form.search_description,
                form.go_live_at,
                form.first_published_at,
            ],
        )
        .map_err(|e| e.to_string())?;
        Ok(conn.last_insert_rowid())
    }
}
