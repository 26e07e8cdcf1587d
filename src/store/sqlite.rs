use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;

use crate::models::entry::{Entry, EntryForm};
use crate::models::image::{Image, ImageForm};
use crate::models::import::{Import, ImportForm};
use crate::models::page::{Page, PageForm, PAGE_BLOG};
use crate::models::revision::PageRevision;
use crate::models::site::Site;
use crate::models::tag::Tag;
use crate::models::user::User;

use super::Store;

pub type DbPool = Pool<SqliteConnectionManager>;

/// SQLite-backed implementation of the Store trait.
/// Wraps the r2d2 connection pool and delegates to model methods.
pub struct SqliteStore {
    pub pool: DbPool,
}

impl SqliteStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn new_at(path: &str) -> Result<Self, String> {
        let pool = crate::db::init_pool_at(path)?;
        Ok(Self { pool })
    }
}

impl Store for SqliteStore {
    // ── Lifecycle ───────────────────────────────────────────────────

    fn run_migrations(&self) -> Result<(), String> {
        crate::db::run_migrations(&self.pool).map_err(|e| e.to_string())
    }

    fn seed_defaults(&self) -> Result<(), String> {
        crate::db::seed_defaults(&self.pool).map_err(|e| e.to_string())
    }

    // ── Users ───────────────────────────────────────────────────────

    fn user_get_by_id(&self, id: i64) -> Option<User> {
        User::get_by_id(&self.pool, id)
    }

    fn user_get_by_username(&self, username: &str) -> Option<User> {
        User::get_by_username(&self.pool, username)
    }

    fn user_first(&self) -> Option<User> {
        User::first(&self.pool)
    }

    fn user_list_all(&self) -> Vec<User> {
        User::list_all(&self.pool)
    }

    fn user_count(&self) -> i64 {
        User::count(&self.pool)
    }

    fn user_create(&self, username: &str, email: &str) -> Result<i64, String> {
        User::create(&self.pool, username, email)
    }

    // ── Sites ───────────────────────────────────────────────────────

    fn site_find_by_hostname(&self, hostname: &str) -> Option<Site> {
        Site::find_by_hostname(&self.pool, hostname)
    }

    fn site_default(&self) -> Option<Site> {
        Site::default_site(&self.pool)
    }

    fn site_set_root_page(&self, site_id: i64, root_page_id: i64) -> Result<(), String> {
        Site::set_root_page(&self.pool, site_id, root_page_id)
    }

    // ── Pages ───────────────────────────────────────────────────────

    fn page_find_by_id(&self, id: i64) -> Option<Page> {
        Page::find_by_id(&self.pool, id)
    }

    fn page_find_by_slug(&self, page_type: &str, slug: &str) -> Option<Page> {
        Page::find_by_slug(&self.pool, page_type, slug)
    }

    fn page_root(&self) -> Option<Page> {
        Page::root(&self.pool)
    }

    fn page_children(&self, parent_id: i64) -> Vec<Page> {
        Page::children(&self.pool, parent_id)
    }

    fn page_revisions(&self, page_id: i64) -> Vec<PageRevision> {
        PageRevision::for_page(&self.pool, page_id)
    }

    // ── Blog containers ─────────────────────────────────────────────

    fn blog_find_by_slug(&self, slug: &str) -> Option<Page> {
        Page::find_by_slug(&self.pool, PAGE_BLOG, slug)
    }

    fn blog_create(&self, parent_id: i64, title: &str, slug: &str) -> Result<i64, String> {
        let mut conn = self.pool.get().map_err(|e| e.to_string())?;
        let tx = conn.transaction().map_err(|e| e.to_string())?;

        let form = PageForm {
            page_type: PAGE_BLOG.to_string(),
            title: title.to_string(),
            slug: slug.to_string(),
            owner_id: None,
            live: true,
            seo_title: String::new(),
            search_description: String::new(),
            go_live_at: None,
            first_published_at: None,
        };
        let page_id = Page::add_child_in(&tx, parent_id, &form)?;
        let snapshot = serde_json::json!({ "pk": page_id, "title": title, "slug": slug }).to_string();
        let revision_id = PageRevision::save_in(&tx, page_id, &snapshot)?;
        PageRevision::publish_in(&tx, revision_id, true)?;

        tx.commit().map_err(|e| e.to_string())?;
        Ok(page_id)
    }

    // ── Entries ─────────────────────────────────────────────────────

    fn entry_find_by_slug(&self, slug: &str) -> Option<Entry> {
        Entry::find_by_slug(&self.pool, slug)
    }

    fn entry_list_for_blog(&self, blog_id: i64) -> Vec<Entry> {
        Entry::list_for_blog(&self.pool, blog_id)
    }

    fn entry_count(&self) -> i64 {
        Entry::count(&self.pool)
    }

    fn entry_create_published(
        &self,
        blog_id: i64,
        form: &EntryForm,
        tags: &[String],
    ) -> Result<i64, String> {
        let mut conn = self.pool.get().map_err(|e| e.to_string())?;
        // Dropping the transaction without commit rolls every step back
        let tx = conn.transaction().map_err(|e| e.to_string())?;

        let mut tag_ids = Vec::with_capacity(tags.len());
        for name in tags {
            tag_ids.push(Tag::find_or_create_in(&tx, name)?);
        }

        let page_id = Entry::create_in(&tx, blog_id, form)?;
        let revision_id = PageRevision::save_in(&tx, page_id, &form.revision_json(page_id))?;
        PageRevision::publish_in(&tx, revision_id, form.live())?;

        for tag_id in tag_ids {
            Tag::attach_in(&tx, page_id, tag_id)?;
        }

        tx.commit().map_err(|e| e.to_string())?;
        Ok(page_id)
    }

    // ── Tags ────────────────────────────────────────────────────────

    fn tag_find_by_name(&self, name: &str) -> Option<Tag> {
        Tag::find_by_name(&self.pool, name)
    }

    fn tag_count(&self) -> i64 {
        Tag::count(&self.pool)
    }

    fn tag_for_entry(&self, entry_id: i64) -> Vec<Tag> {
        Tag::for_entry(&self.pool, entry_id)
    }

    fn tag_find_or_create(&self, name: &str) -> Result<i64, String> {
        Tag::find_or_create(&self.pool, name)
    }

    // ── Images ──────────────────────────────────────────────────────

    fn image_find_by_id(&self, id: i64) -> Option<Image> {
        Image::find_by_id(&self.pool, id)
    }

    fn image_count(&self) -> i64 {
        Image::count(&self.pool)
    }

    fn image_create(&self, form: &ImageForm) -> Result<i64, String> {
        Image::create(&self.pool, form)
    }

    // ── Import history ──────────────────────────────────────────────

    fn import_list(&self) -> Vec<Import> {
        Import::list(&self.pool)
    }

    fn import_create(&self, form: &ImportForm) -> Result<i64, String> {
        Import::create(&self.pool, form)
    }
}
