use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;
use crate::models::page::{Page, PageForm, PAGE_ENTRY};

/// A blog entry: its page row joined with the entry fields.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Entry {
    pub page: Page,
    pub body: String,
    pub excerpt: String,
    pub date: Option<String>,
}

#[derive(Debug, Clone)]
pub struct EntryForm {
    pub title: String,
    pub slug: String,
    pub body: String,
    pub excerpt: String,
    pub owner_id: Option<i64>,
    pub published_at: Option<String>,
}

impl EntryForm {
    /// An entry is live exactly when its source post was published.
    pub fn live(&self) -> bool {
        self.published_at.is_some()
    }

    pub fn page_form(&self) -> PageForm {
        PageForm {
            page_type: PAGE_ENTRY.to_string(),
            title: self.title.clone(),
            slug: self.slug.clone(),
            owner_id: self.owner_id,
            live: self.live(),
            seo_title: self.title.clone(),
            search_description: self.excerpt.clone(),
            go_live_at: self.published_at.clone(),
            first_published_at: self.published_at.clone(),
        }
    }

    /// Snapshot stored with the entry's revision.
    pub fn revision_json(&self, page_id: i64) -> String {
        serde_json::json!({
            "pk": page_id,
            "title": self.title,
            "slug": self.slug,
            "body": self.body,
            "excerpt": self.excerpt,
            "owner": self.owner_id,
            "date": self.published_at,
            "go_live_at": self.published_at,
            "live": self.live(),
        })
        .to_string()
    }
}

const SELECT_JOINED: &str = "SELECT p.*, e.body, e.excerpt, e.date
     FROM pages p JOIN entries e ON e.page_id = p.id";

impl Entry {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Entry {
            page: Page::from_row(row)?,
            body: row.get("body")?,
            excerpt: row.get("excerpt")?,
            date: row.get("date")?,
        })
    }

    pub fn find_by_slug(pool: &DbPool, slug: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            &format!("{} WHERE p.slug = ?1", SELECT_JOINED),
            params![slug],
            Self::from_row,
        )
        .optional()
        .ok()
        .flatten()
    }

    pub fn list_for_blog(pool: &DbPool, blog_id: i64) -> Vec<Self> {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return vec![],
        };
        let mut stmt =
            match conn.prepare(&format!("{} WHERE p.parent_id = ?1 ORDER BY p.id ASC", SELECT_JOINED)) {
                Ok(s) => s,
                Err(_) => return vec![],
            };
        stmt.query_map(params![blog_id], Self::from_row)
            .map(|rows| rows.filter_map(|r| r.ok()).collect())
            .unwrap_or_default()
    }

    pub fn count(pool: &DbPool) -> i64 {
        let conn = match pool.get() {
            Ok(c) => c,
            Err(_) => return 0,
        };
        conn.query_row("SELECT COUNT(*) FROM entries", [], |row| row.get(0))
            .unwrap_or(0)
    }

    /// Insert the entry page under `blog_id` plus its entry row. Returns the page id.
    pub fn create_in(conn: &Connection, blog_id: i64, form: &EntryForm) -> Result<i64, String> {
        let page_id = Page::add_child_in(conn, blog_id, &form.page_form())?;
        conn.execute(
            "INSERT INTO entries (page_id, body, excerpt, date) VALUES (?1, ?2, ?3, ?4)",
            params![page_id, form.body, form.excerpt, form.published_at],
        )
        .map_err(|e| e.to_string())?;
        Ok(page_id)
    }
}
