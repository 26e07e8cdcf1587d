use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use crate::db::DbPool;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Site {
    pub id: i64,
    pub hostname: String,
    pub port: i64,
    pub root_page_id: i64,
    pub is_default: bool,
}

impl Site {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let default: i32 = row.get("is_default")?;
        Ok(Site {
            id: row.get("id")?,
            hostname: row.get("hostname")?,
            port: row.get("port")?,
            root_page_id: row.get("root_page_id")?,
            is_default: default != 0,
        })
    }

    pub fn find_by_hostname(pool: &DbPool, hostname: &str) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM sites WHERE hostname = ?1 ORDER BY port ASC LIMIT 1",
            params![hostname],
            Self::from_row,
        )
        .ok()
    }

    /// The default site, or the first one when none is flagged.
    pub fn default_site(pool: &DbPool) -> Option<Self> {
        let conn = pool.get().ok()?;
        conn.query_row(
            "SELECT * FROM sites ORDER BY is_default DESC, id ASC LIMIT 1",
            [],
            Self::from_row,
        )
        .ok()
    }

    pub fn set_root_page(pool: &DbPool, id: i64, root_page_id: i64) -> Result<(), String> {
        let conn = pool.get().map_err(|e| e.to_string())?;
        conn.execute(
            "UPDATE sites SET root_page_id = ?1 WHERE id = ?2",
            params![root_page_id, id],
        )
        .map_err(|e| e.to_string())?;
        Ok(())
    }
}
