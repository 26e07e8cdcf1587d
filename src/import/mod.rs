pub mod authors;
pub mod blogger;
pub mod content;
pub mod entries;

use log::info;

use crate::config::ImportConfig;
use crate::images::ImageStorage;
use crate::models::import::ImportForm;
use crate::models::page::{Page, PAGE_ROOT};
use crate::store::Store;
use authors::Prompter;
use blogger::{AccessError, BloggerConfig, Post};
use content::{ContentRewriter, Downloader};
use entries::{EntryImporter, ImportReport};

pub const SOURCE_BLOGGER: &str = "blogger";

/// Fetch the blog's posts, then open the store and import them. A failed
/// fetch returns before the store is opened.
pub fn run<S, F, O>(
    config: &ImportConfig,
    fetch: F,
    open_store: O,
    prompter: &mut dyn Prompter,
    downloader: &dyn Downloader,
) -> Result<ImportReport, String>
where
    S: Store,
    F: FnOnce(&BloggerConfig) -> Result<Vec<Post>, AccessError>,
    O: FnOnce() -> Result<S, String>,
{
    let posts = fetch(&config.blogger).map_err(|e| e.to_string())?;
    let store = open_store()?;
    import_posts(config, &store, prompter, downloader, &posts)
}

/// Blog page, then authors, then entries, then the import history row.
pub fn import_posts(
    config: &ImportConfig,
    store: &dyn Store,
    prompter: &mut dyn Prompter,
    downloader: &dyn Downloader,
    posts: &[Post],
) -> Result<ImportReport, String> {
    info!("Starting migration from Blogger to Puput");
    let blog = get_or_create_blog(store, config)?;
    let author_map = authors::import_authors(store, prompter, posts)?;

    let storage = ImageStorage::new(&config.media_root, &config.media_url);
    let rewriter = ContentRewriter {
        store,
        storage: &storage,
        downloader,
        hosts: &config.image_hosts,
        embed_format: &config.embed_format,
    };
    let importer = EntryImporter {
        store,
        rewriter: &rewriter,
        blog_id: blog.id,
        authors: &author_map,
        auto_excerpt: config.auto_excerpt,
    };
    let report = importer.import_entries(posts)?;

    store.import_create(&ImportForm {
        source: SOURCE_BLOGGER.to_string(),
        blog_id: Some(config.blogger.blog_id.clone()),
        entries_count: report.imported.len() as i64,
        skipped_count: report.skipped.len() as i64,
        images_count: report.images,
        authors_count: author_map.len() as i64,
        log: serde_json::to_string(&report.log).ok(),
    })?;

    info!(
        "Migration finished: {} imported, {} skipped, {} images",
        report.imported.len(),
        report.skipped.len(),
        report.images
    );
    Ok(report)
}

/// Reuse the blog page with the configured slug, or create it under the root
/// page after pointing the destination site at that root.
pub fn get_or_create_blog(store: &dyn Store, config: &ImportConfig) -> Result<Page, String> {
    let slug = config.blog_slug();
    if let Some(blog) = store.blog_find_by_slug(&slug) {
        info!("> Using existing blog page '{}'", slug);
        return Ok(blog);
    }

    let root = match &config.root_page {
        Some(root_slug) => store
            .page_find_by_slug(PAGE_ROOT, root_slug)
            .ok_or_else(|| format!("Root page '{}' not found", root_slug))?,
        None => store.page_root().ok_or("No root page in the database")?,
    };
    let site = match &config.site {
        Some(hostname) => store
            .site_find_by_hostname(hostname)
            .ok_or_else(|| format!("Site '{}' not found", hostname))?,
        None => store.site_default().ok_or("No default site in the database")?,
    };
    store.site_set_root_page(site.id, root.id)?;

    let id = store.blog_create(root.id, &config.blog_title, &slug)?;
    info!("> Created blog page '{}'", slug);
    store
        .page_find_by_id(id)
        .ok_or_else(|| format!("Blog page {} vanished after creation", id))
}
