use crate::models::entry::{Entry, EntryForm};
use crate::models::image::{Image, ImageForm};
use crate::models::import::{Import, ImportForm};
use crate::models::page::Page;
use crate::models::revision::PageRevision;
use crate::models::site::Site;
use crate::models::tag::Tag;
use crate::models::user::User;

pub mod sqlite;

/// Unified data-access trait. Every destination write of an import goes through here.
/// Implementation: `SqliteStore` (wraps rusqlite/r2d2).
pub trait Store: Send + Sync {
    // ── Lifecycle ───────────────────────────────────────────────────
    fn run_migrations(&self) -> Result<(), String>;
    fn seed_defaults(&self) -> Result<(), String>;

    // ── Users ───────────────────────────────────────────────────────
    fn user_get_by_id(&self, id: i64) -> Option<User>;
    fn user_get_by_username(&self, username: &str) -> Option<User>;
    fn user_first(&self) -> Option<User>;
    fn user_list_all(&self) -> Vec<User>;
    fn user_count(&self) -> i64;
    fn user_create(&self, username: &str, email: &str) -> Result<i64, String>;

    // ── Sites ───────────────────────────────────────────────────────
    fn site_find_by_hostname(&self, hostname: &str) -> Option<Site>;
    fn site_default(&self) -> Option<Site>;
    fn site_set_root_page(&self, site_id: i64, root_page_id: i64) -> Result<(), String>;

    // ── Pages ───────────────────────────────────────────────────────
    fn page_find_by_id(&self, id: i64) -> Option<Page>;
    fn page_find_by_slug(&self, page_type: &str, slug: &str) -> Option<Page>;
    fn page_root(&self) -> Option<Page>;
    fn page_children(&self, parent_id: i64) -> Vec<Page>;
    fn page_revisions(&self, page_id: i64) -> Vec<PageRevision>;

    // ── Blog containers ─────────────────────────────────────────────
    fn blog_find_by_slug(&self, slug: &str) -> Option<Page>;
    /// Add a live blog page under `parent_id` and publish its first revision.
    fn blog_create(&self, parent_id: i64, title: &str, slug: &str) -> Result<i64, String>;

    // ── Entries ─────────────────────────────────────────────────────
    fn entry_find_by_slug(&self, slug: &str) -> Option<Entry>;
    fn entry_list_for_blog(&self, blog_id: i64) -> Vec<Entry>;
    fn entry_count(&self) -> i64;
    /// Create the entry under `blog_id`, save and publish a revision, and attach
    /// `tags` (created when absent). All or nothing.
    fn entry_create_published(
        &self,
        blog_id: i64,
        form: &EntryForm,
        tags: &[String],
    ) -> Result<i64, String>;

    // ── Tags ────────────────────────────────────────────────────────
    fn tag_find_by_name(&self, name: &str) -> Option<Tag>;
    fn tag_count(&self) -> i64;
    fn tag_for_entry(&self, entry_id: i64) -> Vec<Tag>;
    fn tag_find_or_create(&self, name: &str) -> Result<i64, String>;

    // ── Images ──────────────────────────────────────────────────────
    fn image_find_by_id(&self, id: i64) -> Option<Image>;
    fn image_count(&self) -> i64;
    fn image_create(&self, form: &ImageForm) -> Result<i64, String>;

    // ── Import history ──────────────────────────────────────────────
    fn import_list(&self) -> Vec<Import>;
    fn import_create(&self, form: &ImportForm) -> Result<i64, String>;
}
