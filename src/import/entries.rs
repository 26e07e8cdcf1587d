use log::info;

use crate::import::authors::AuthorMap;
use crate::import::blogger::Post;
use crate::import::content::ContentRewriter;
use crate::models::entry::EntryForm;
use crate::store::Store;
use crate::text;

/// Word budget for generated excerpts
pub const EXCERPT_WORDS: usize = 50;

/// Result of an entries import
#[derive(Debug, Default, Clone)]
pub struct ImportReport {
    pub imported: Vec<String>,
    pub skipped: Vec<String>,
    pub images: i64,
    pub log: Vec<String>,
}

pub struct EntryImporter<'a> {
    pub store: &'a dyn Store,
    pub rewriter: &'a ContentRewriter<'a>,
    pub blog_id: i64,
    pub authors: &'a AuthorMap,
    pub auto_excerpt: bool,
}

/// Slug for a post: slugified title, or `post-{id}` when the title has
/// nothing to slugify.
pub fn entry_slug(post: &Post) -> String {
    let slug = slug::slugify(&post.title);
    if slug.is_empty() {
        format!("post-{}", slug::slugify(&post.id))
    } else {
        slug
    }
}

impl EntryImporter<'_> {
    /// Create one published entry per post whose slug is not taken yet.
    /// A store failure aborts the run; the failing entry is rolled back.
    pub fn import_entries(&self, posts: &[Post]) -> Result<ImportReport, String> {
        info!("- Importing entries");
        let mut report = ImportReport::default();

        for post in posts {
            let slug = entry_slug(post);
            if self.store.entry_find_by_slug(&slug).is_some() {
                info!("> Entry '{}' already migrated, skipped", slug);
                report.log.push(format!("Skipped entry '{}': already migrated", slug));
                report.skipped.push(slug);
                continue;
            }

            let rewritten = self.rewriter.rewrite(post.content.as_deref().unwrap_or(""));
            let form = self.entry_form(post, slug, rewritten.html);
            let tags: Vec<String> = post
                .labels
                .iter()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect();

            self.store
                .entry_create_published(self.blog_id, &form, &tags)
                .map_err(|e| format!("Failed to import entry '{}': {}", form.slug, e))?;

            info!(
                "> Imported entry '{}' ({} images, {} tags)",
                form.slug,
                rewritten.images.len(),
                tags.len()
            );
            report.images += rewritten.images.len() as i64;
            report.log.push(format!("Imported entry: {}", form.title));
            report.imported.push(form.slug);
        }

        Ok(report)
    }

    fn entry_form(&self, post: &Post, slug: String, body: String) -> EntryForm {
        let excerpt = if self.auto_excerpt {
            text::excerpt(&body, EXCERPT_WORDS)
        } else {
            String::new()
        };
        let owner_id = self
            .authors
            .get(&post.author_name())
            .copied()
            .or_else(|| self.store.user_first().map(|u| u.id));

        EntryForm {
            title: post.title.clone(),
            slug,
            body,
            excerpt,
            owner_id,
            published_at: post.published.clone(),
        }
    }
}
