use std::time::Duration;

use ego_tree::NodeId;
use log::{info, warn};
use scraper::node::Text;
use scraper::{ElementRef, Html, Node};
use url::Url;

use crate::images::{ImageStorage, StoredImage};
use crate::store::Store;

/// Hosts whose images get re-hosted locally (subdomains included)
pub const DEFAULT_IMAGE_HOSTS: &[&str] = &["bp.blogspot.com", "blogger.googleusercontent.com"];

pub const DEFAULT_EMBED_FORMAT: &str = "fullwidth";

// ── Downloading ──────────────────────────────────────

pub trait Downloader {
    fn download(&self, url: &str) -> Result<Vec<u8>, String>;
}

pub struct HttpDownloader {
    client: reqwest::blocking::Client,
}

impl HttpDownloader {
    pub fn new(timeout_secs: u64) -> Result<Self, String> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| format!("HTTP client error: {}", e))?;
        Ok(Self { client })
    }
}

impl Downloader for HttpDownloader {
    fn download(&self, url: &str) -> Result<Vec<u8>, String> {
        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| format!("Download failed: {}", e))?;

        if !resp.status().is_success() {
            return Err(format!("Download returned {}", resp.status()));
        }

        let bytes = resp.bytes().map_err(|e| format!("Read failed: {}", e))?;
        Ok(bytes.to_vec())
    }
}

// ── Rewriting ────────────────────────────────────────

/// What happened to one `<img>`.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageOutcome {
    Rehosted(StoredImage),
    Skipped,
}

#[derive(Debug, Clone)]
pub struct Rewritten {
    pub html: String,
    pub images: Vec<StoredImage>,
}

pub struct ContentRewriter<'a> {
    pub store: &'a dyn Store,
    pub storage: &'a ImageStorage,
    pub downloader: &'a dyn Downloader,
    pub hosts: &'a [String],
    pub embed_format: &'a str,
}

impl ContentRewriter<'_> {
    /// Replace every Blogger-hosted `<img>` in `html` with an embed marker for
    /// its re-hosted copy. A link wrapping nothing but the image is replaced as
    /// a whole. Input without rewritable images comes back unchanged.
    pub fn rewrite(&self, html: &str) -> Rewritten {
        let unchanged = || Rewritten {
            html: html.to_string(),
            images: Vec::new(),
        };
        if html.trim().is_empty() {
            return unchanged();
        }

        let mut fragment = Html::parse_fragment(html);
        let mut replacements: Vec<(NodeId, String)> = Vec::new();
        let mut images = Vec::new();

        for img in fragment
            .root_element()
            .descendants()
            .filter_map(ElementRef::wrap)
            .filter(|e| e.value().name() == "img")
        {
            let Some(src) = img.value().attr("src") else {
                continue;
            };
            let Some(url) = hosted_url(src, self.hosts) else {
                continue;
            };
            let stored = match self.rehost(&url) {
                ImageOutcome::Rehosted(stored) => stored,
                ImageOutcome::Skipped => continue,
            };

            let alt = img
                .value()
                .attr("alt")
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .unwrap_or(stored.title.as_str());
            let marker = embed_marker(stored.id, alt, self.embed_format);

            let target = match img.parent().and_then(ElementRef::wrap) {
                Some(link) if link.value().name() == "a" && wraps_only(link, img.id()) => link.id(),
                _ => img.id(),
            };
            replacements.push((target, marker));
            images.push(stored);
        }

        if replacements.is_empty() {
            return unchanged();
        }

        // Each replaced node becomes a placeholder text node, swapped for its
        // marker once the tree is serialized.
        let run_id = uuid::Uuid::new_v4().simple().to_string();
        let mut markers = Vec::with_capacity(replacements.len());
        for (i, (target, marker)) in replacements.into_iter().enumerate() {
            let placeholder = format!("[embed:{}:{}]", run_id, i);
            if let Some(mut node) = fragment.tree.get_mut(target) {
                node.insert_before(Node::Text(Text {
                    text: placeholder.as_str().into(),
                }));
                node.detach();
            }
            markers.push((placeholder, marker));
        }

        let mut out = fragment.root_element().inner_html();
        for (placeholder, marker) in &markers {
            out = out.replace(placeholder.as_str(), marker);
        }
        Rewritten { html: out, images }
    }

    fn rehost(&self, url: &str) -> ImageOutcome {
        let bytes = match self.downloader.download(url) {
            Ok(b) => b,
            Err(e) => {
                warn!("\tSkipped image {}: {}", url, e);
                return ImageOutcome::Skipped;
            }
        };
        let title = image_title(url);
        match self.storage.rehost(self.store, &bytes, &title) {
            Ok(stored) => {
                info!("\t\t{} -> {}", url, stored.url);
                ImageOutcome::Rehosted(stored)
            }
            Err(e) => {
                warn!("\tSkipped image {}: {}", url, e);
                ImageOutcome::Skipped
            }
        }
    }
}

/// Absolute URL of `src` when it points at one of `hosts`.
pub fn hosted_url(src: &str, hosts: &[String]) -> Option<String> {
    let src = src.trim();
    let absolute = if src.starts_with("//") {
        format!("https:{}", src)
    } else {
        src.to_string()
    };
    let parsed = Url::parse(&absolute).ok()?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return None;
    }
    let host = parsed.host_str()?.to_ascii_lowercase();
    let matches = hosts.iter().any(|h| {
        let h = h.to_ascii_lowercase();
        host == h || host.ends_with(&format!(".{}", h))
    });
    if matches {
        Some(absolute)
    } else {
        None
    }
}

/// Last path segment of the URL, query dropped.
pub fn image_title(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "image".to_string())
}

pub fn embed_marker(image_id: i64, alt: &str, format: &str) -> String {
    format!(
        "<embed alt=\"{}\" embedtype=\"image\" format=\"{}\" id=\"{}\"/>",
        escape_attr(alt),
        escape_attr(format),
        image_id
    )
}

/// True when `link`'s only content is the node `img` (whitespace text ignored).
fn wraps_only(link: ElementRef, img: NodeId) -> bool {
    link.children().all(|child| match child.value() {
        Node::Text(text) => child.id() == img || text.trim().is_empty(),
        Node::Comment(_) => true,
        _ => child.id() == img,
    })
}

/// Attribute escaping for the marker, as html5ever serializes attribute values.
fn escape_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('\u{a0}', "&nbsp;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::sqlite::SqliteStore;
    use std::cell::RefCell;
    use std::io::Cursor;

    struct FakeDownloader {
        fail_on: Option<&'static str>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeDownloader {
        fn ok() -> Self {
            Self {
                fail_on: None,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl Downloader for FakeDownloader {
        fn download(&self, url: &str) -> Result<Vec<u8>, String> {
            self.calls.borrow_mut().push(url.to_string());
            if self.fail_on.map(|f| url.contains(f)).unwrap_or(false) {
                return Err("Download returned 404 Not Found".to_string());
            }
            let img = image::RgbImage::new(2, 2);
            let mut out = Cursor::new(Vec::new());
            img.write_to(&mut out, image::ImageFormat::Png)
                .map_err(|e| e.to_string())?;
            Ok(out.into_inner())
        }
    }

    fn test_store() -> SqliteStore {
        let manager = r2d2_sqlite::SqliteConnectionManager::memory();
        let pool = r2d2::Pool::builder().max_size(1).build(manager).unwrap();
        let store = SqliteStore::new(pool);
        store.run_migrations().unwrap();
        store.seed_defaults().unwrap();
        store
    }

    fn hosts() -> Vec<String> {
        DEFAULT_IMAGE_HOSTS.iter().map(|h| h.to_string()).collect()
    }

    fn rewrite_with(html: &str, downloader: &FakeDownloader) -> (Rewritten, SqliteStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = test_store();
        let storage = ImageStorage::new(dir.path(), "/media/");
        let hosts = hosts();
        let rewriter = ContentRewriter {
            store: &store,
            storage: &storage,
            downloader,
            hosts: &hosts,
            embed_format: DEFAULT_EMBED_FORMAT,
        };
        let out = rewriter.rewrite(html);
        (out, store)
    }

    #[test]
    fn empty_fragment_is_unchanged() {
        let d = FakeDownloader::ok();
        assert_eq!(rewrite_with("", &d).0.html, "");
        assert_eq!(rewrite_with("   ", &d).0.html, "   ");
        assert!(d.calls.borrow().is_empty());
    }

    #[test]
    fn fragment_without_images_is_unchanged() {
        let d = FakeDownloader::ok();
        let html = "<p>Hello <b>world</b></p>\n<br>";
        let (out, _) = rewrite_with(html, &d);
        assert_eq!(out.html, html);
        assert!(out.images.is_empty());
    }

    #[test]
    fn foreign_images_are_left_alone() {
        let d = FakeDownloader::ok();
        let html = "<p><img src=\"https://example.com/a.jpg\"></p>";
        let (out, _) = rewrite_with(html, &d);
        assert_eq!(out.html, html);
        assert!(d.calls.borrow().is_empty());
    }

    #[test]
    fn linked_image_replaces_the_link() {
        let d = FakeDownloader::ok();
        let html = "<div><a href=\"https://1.bp.blogspot.com/big/photo.jpg\"><img src=\"https://1.bp.blogspot.com/s320/photo.jpg\"></a><span>after</span></div>";
        let (out, store) = rewrite_with(html, &d);

        assert_eq!(out.images.len(), 1);
        let id = out.images[0].id;
        assert_eq!(
            out.html,
            format!(
                "<div><embed alt=\"photo.jpg\" embedtype=\"image\" format=\"fullwidth\" id=\"{}\"/><span>after</span></div>",
                id
            )
        );
        assert!(!out.html.contains("<a "));
        assert_eq!(store.image_find_by_id(id).unwrap().title, "photo.jpg");
    }

    #[test]
    fn bare_image_is_replaced_in_place() {
        let d = FakeDownloader::ok();
        let html = "<p>before <img src=\"http://2.bp.blogspot.com/x/cat.png\" alt=\"A cat\"> after</p>";
        let (out, _) = rewrite_with(html, &d);
        let id = out.images[0].id;
        assert_eq!(
            out.html,
            format!(
                "<p>before <embed alt=\"A cat\" embedtype=\"image\" format=\"fullwidth\" id=\"{}\"/> after</p>",
                id
            )
        );
    }

    #[test]
    fn link_with_other_content_is_kept() {
        let d = FakeDownloader::ok();
        let html = "<a href=\"/x\">caption <img src=\"https://1.bp.blogspot.com/p.jpg\"></a>";
        let (out, _) = rewrite_with(html, &d);
        let id = out.images[0].id;
        assert_eq!(
            out.html,
            format!(
                "<a href=\"/x\">caption <embed alt=\"p.jpg\" embedtype=\"image\" format=\"fullwidth\" id=\"{}\"/></a>",
                id
            )
        );
    }

    #[test]
    fn failed_download_leaves_only_that_image() {
        let d = FakeDownloader {
            fail_on: Some("broken"),
            calls: RefCell::new(Vec::new()),
        };
        let html = "<p><img src=\"https://1.bp.blogspot.com/broken.jpg\"><img src=\"https://1.bp.blogspot.com/ok.jpg\"></p>";
        let (out, store) = rewrite_with(html, &d);

        assert_eq!(d.calls.borrow().len(), 2);
        assert_eq!(out.images.len(), 1);
        assert!(out.html.contains("<img src=\"https://1.bp.blogspot.com/broken.jpg\">"));
        assert!(!out.html.contains("ok.jpg\">"));
        assert_eq!(store.image_count(), 1);
    }

    #[test]
    fn images_are_processed_in_document_order() {
        let d = FakeDownloader::ok();
        let html = "<p><img src=\"//1.bp.blogspot.com/one.jpg\"></p><p><img src=\"https://blogger.googleusercontent.com/img/two.jpg\"></p>";
        let (out, _) = rewrite_with(html, &d);
        assert_eq!(
            *d.calls.borrow(),
            vec![
                "https://1.bp.blogspot.com/one.jpg".to_string(),
                "https://blogger.googleusercontent.com/img/two.jpg".to_string()
            ]
        );
        assert_eq!(out.images[0].title, "one.jpg");
        assert_eq!(out.images[1].title, "two.jpg");
        assert!(out.images[0].id < out.images[1].id);
    }

    #[test]
    fn hosted_url_matches_subdomains_only() {
        let h = hosts();
        assert!(hosted_url("https://3.bp.blogspot.com/a.jpg", &h).is_some());
        assert!(hosted_url("https://bp.blogspot.com/a.jpg", &h).is_some());
        assert!(hosted_url("https://notbp.blogspot.com/a.jpg", &h).is_none());
        assert!(hosted_url("data:image/png;base64,AAAA", &h).is_none());
        assert_eq!(
            hosted_url("//1.bp.blogspot.com/a.jpg", &h).as_deref(),
            Some("https://1.bp.blogspot.com/a.jpg")
        );
    }

    #[test]
    fn title_is_last_path_segment() {
        assert_eq!(image_title("https://1.bp.blogspot.com/a/b/s1600/IMG_01.JPG?x=1"), "IMG_01.JPG");
        assert_eq!(image_title("https://1.bp.blogspot.com/a/"), "image");
    }

    #[test]
    fn text_and_attributes_are_escaped() {
        let d = FakeDownloader::ok();
        let html = "<p title=\"a &quot;q&quot;\">1 &lt; 2 &amp; 3</p><img src=\"https://1.bp.blogspot.com/z.jpg\" alt='say \"hi\"'>";
        let (out, _) = rewrite_with(html, &d);
        assert!(out.html.starts_with("<p title=\"a &quot;q&quot;\">1 &lt; 2 &amp; 3</p>"));
        assert!(out.html.contains("alt=\"say &quot;hi&quot;\""));
    }

    #[test]
    fn untouched_siblings_serialize_as_parsed() {
        let d = FakeDownloader::ok();
        let html = "<p><img src=\"https://1.bp.blogspot.com/a.jpg\"><noscript><img src=\"x.jpg\"></noscript></p><svg><use xlink:href=\"#i\"></use></svg>";
        let (out, _) = rewrite_with(html, &d);
        let id = out.images[0].id;
        assert!(out.html.starts_with(&format!(
            "<p><embed alt=\"a.jpg\" embedtype=\"image\" format=\"fullwidth\" id=\"{}\"/><noscript><img src=\"x.jpg\"></noscript></p>",
            id
        )));
        assert!(out.html.contains("xlink:href=\"#i\""));
        assert!(!out.html.contains("[embed:"));
    }

    #[test]
    fn many_images_keep_their_own_markers() {
        let d = FakeDownloader::ok();
        let html: String = (0..12)
            .map(|i| format!("<img src=\"https://1.bp.blogspot.com/{}.jpg\">", i))
            .collect();
        let (out, _) = rewrite_with(&html, &d);
        assert_eq!(out.images.len(), 12);
        for image in &out.images {
            assert!(out.html.contains(&format!("alt=\"{}\" embedtype=\"image\" format=\"fullwidth\" id=\"{}\"/>", image.title, image.id)));
        }
        assert_eq!(out.html.matches("<embed ").count(), 12);
    }
}
