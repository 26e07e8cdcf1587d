use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub type DbPool = Pool<SqliteConnectionManager>;

pub fn init_pool_at(path: &str) -> Result<DbPool, String> {
    let manager = SqliteConnectionManager::file(path);
    let pool = Pool::builder()
        .max_size(4)
        .build(manager)
        .map_err(|e| e.to_string())?;

    let conn = pool.get().map_err(|e| e.to_string())?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .map_err(|e| e.to_string())?;

    Ok(pool)
}

pub fn run_migrations(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    conn.execute_batch(
        "
        -- Local user accounts (entry owners)
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY,
            username TEXT UNIQUE NOT NULL,
            email TEXT NOT NULL DEFAULT '',
            password_hash TEXT NOT NULL DEFAULT '!',
            is_active INTEGER NOT NULL DEFAULT 1,
            date_joined DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Page tree: root, blog containers, entries
        CREATE TABLE IF NOT EXISTS pages (
            id INTEGER PRIMARY KEY,
            parent_id INTEGER,
            depth INTEGER NOT NULL DEFAULT 1,
            page_type TEXT NOT NULL,
            title TEXT NOT NULL,
            slug TEXT NOT NULL,
            owner_id INTEGER,
            live INTEGER NOT NULL DEFAULT 0,
            seo_title TEXT NOT NULL DEFAULT '',
            search_description TEXT NOT NULL DEFAULT '',
            go_live_at TEXT,
            first_published_at TEXT,
            last_published_at TEXT,
            latest_revision_id INTEGER,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (parent_id) REFERENCES pages(id),
            FOREIGN KEY (owner_id) REFERENCES users(id),
            UNIQUE(page_type, slug)
        );

        -- Entry fields (one row per entry page)
        CREATE TABLE IF NOT EXISTS entries (
            page_id INTEGER PRIMARY KEY,
            body TEXT NOT NULL DEFAULT '',
            excerpt TEXT NOT NULL DEFAULT '',
            date TEXT,
            FOREIGN KEY (page_id) REFERENCES pages(id)
        );

        -- Saved page snapshots
        CREATE TABLE IF NOT EXISTS page_revisions (
            id INTEGER PRIMARY KEY,
            page_id INTEGER NOT NULL,
            content_json TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
            published_at DATETIME,
            FOREIGN KEY (page_id) REFERENCES pages(id)
        );

        -- Tags
        CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY,
            name TEXT UNIQUE NOT NULL,
            slug TEXT NOT NULL
        );

        -- Many-to-many: entries <-> tags
        CREATE TABLE IF NOT EXISTS entry_tags (
            entry_id INTEGER NOT NULL,
            tag_id INTEGER NOT NULL,
            UNIQUE(entry_id, tag_id),
            FOREIGN KEY (entry_id) REFERENCES pages(id),
            FOREIGN KEY (tag_id) REFERENCES tags(id)
        );

        -- Re-hosted images
        CREATE TABLE IF NOT EXISTS images (
            id INTEGER PRIMARY KEY,
            title TEXT NOT NULL,
            file TEXT NOT NULL,
            width INTEGER NOT NULL,
            height INTEGER NOT NULL,
            file_size INTEGER NOT NULL,
            file_hash TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        -- Sites
        CREATE TABLE IF NOT EXISTS sites (
            id INTEGER PRIMARY KEY,
            hostname TEXT NOT NULL,
            port INTEGER NOT NULL DEFAULT 80,
            root_page_id INTEGER NOT NULL,
            is_default INTEGER NOT NULL DEFAULT 0,
            UNIQUE(hostname, port),
            FOREIGN KEY (root_page_id) REFERENCES pages(id)
        );

        -- Import history
        CREATE TABLE IF NOT EXISTS imports (
            id INTEGER PRIMARY KEY,
            source TEXT NOT NULL,
            blog_id TEXT,
            entries_count INTEGER DEFAULT 0,
            skipped_count INTEGER DEFAULT 0,
            images_count INTEGER DEFAULT 0,
            authors_count INTEGER DEFAULT 0,
            log TEXT,
            imported_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX IF NOT EXISTS idx_pages_parent ON pages(parent_id);
        CREATE INDEX IF NOT EXISTS idx_entry_tags_tag ON entry_tags(tag_id);
        ",
    )?;

    Ok(())
}

pub fn seed_defaults(pool: &DbPool) -> Result<(), Box<dyn std::error::Error>> {
    let conn = pool.get()?;

    // Seed the tree root if none exists
    let root_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM pages WHERE page_type = 'root'",
        [],
        |row| row.get(0),
    )?;

    if root_count == 0 {
        conn.execute(
            "INSERT INTO pages (parent_id, depth, page_type, title, slug, live)
             VALUES (NULL, 1, 'root', ?1, ?2, 1)",
            params!["Root", "root"],
        )?;
    }

    // Seed the default site, pointing at the root
    let site_count: i64 = conn.query_row("SELECT COUNT(*) FROM sites", [], |row| row.get(0))?;

    if site_count == 0 {
        let root_id: i64 = conn.query_row(
            "SELECT id FROM pages WHERE page_type = 'root' ORDER BY id LIMIT 1",
            [],
            |row| row.get(0),
        )?;
        conn.execute(
            "INSERT INTO sites (hostname, port, root_page_id, is_default) VALUES (?1, 80, ?2, 1)",
            params!["localhost", root_id],
        )?;
    }

    Ok(())
}
