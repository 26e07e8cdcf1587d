use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cli::Cli;
use crate::import::authors::Prompter;
use crate::import::blogger::{BloggerConfig, DEFAULT_API_BASE, MAX_RESULTS_LIMIT};
use crate::import::content::{DEFAULT_EMBED_FORMAT, DEFAULT_IMAGE_HOSTS};

pub const DEFAULT_DATABASE: &str = "blogger2puput.db";
pub const DEFAULT_MEDIA_ROOT: &str = "media";
pub const DEFAULT_MEDIA_URL: &str = "/media/";
pub const DEFAULT_BLOG_TITLE: &str = "Blog";
pub const API_TIMEOUT_SECS: u64 = 60;
pub const IMAGE_TIMEOUT_SECS: u64 = 120;

// ── File layout ──────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FileConfig {
    blogger: BloggerSection,
    database: DatabaseSection,
    media: MediaSection,
    site: SiteSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct BloggerSection {
    blog_id: Option<String>,
    api_key: Option<String>,
    api_base: Option<String>,
    title: Option<String>,
    slug: Option<String>,
    auto_excerpt: Option<bool>,
    max_results: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DatabaseSection {
    path: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MediaSection {
    root: Option<PathBuf>,
    url: Option<String>,
    timeout_secs: Option<u64>,
    hosts: Option<Vec<String>>,
    embed_format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SiteSection {
    hostname: Option<String>,
    root_page: Option<String>,
}

// ── Resolved config ──────────────────────────────────

/// Everything one import run needs, resolved from defaults, the config file
/// and the command line (in that order of precedence, lowest first).
#[derive(Debug, Clone)]
pub struct ImportConfig {
    pub blogger: BloggerConfig,
    pub blog_title: String,
    pub blog_slug: Option<String>,
    pub auto_excerpt: bool,
    pub database: PathBuf,
    pub media_root: PathBuf,
    pub media_url: String,
    pub image_timeout_secs: u64,
    pub image_hosts: Vec<String>,
    pub embed_format: String,
    pub site: Option<String>,
    pub root_page: Option<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            blogger: BloggerConfig {
                blog_id: String::new(),
                api_key: String::new(),
                api_base: DEFAULT_API_BASE.to_string(),
                max_results: MAX_RESULTS_LIMIT,
                timeout_secs: API_TIMEOUT_SECS,
            },
            blog_title: DEFAULT_BLOG_TITLE.to_string(),
            blog_slug: None,
            auto_excerpt: true,
            database: PathBuf::from(DEFAULT_DATABASE),
            media_root: PathBuf::from(DEFAULT_MEDIA_ROOT),
            media_url: DEFAULT_MEDIA_URL.to_string(),
            image_timeout_secs: IMAGE_TIMEOUT_SECS,
            image_hosts: DEFAULT_IMAGE_HOSTS.iter().map(|h| h.to_string()).collect(),
            embed_format: DEFAULT_EMBED_FORMAT.to_string(),
            site: None,
            root_page: None,
        }
    }
}

impl ImportConfig {
    /// Defaults, then the `--config` file when given, then the flags.
    pub fn load(cli: &Cli) -> Result<Self, String> {
        let mut config = match &cli.config {
            Some(path) => Self::from_toml(&read_file(path)?)
                .map_err(|e| format!("{}: {}", path.display(), e))?,
            None => Self::default(),
        };
        config.apply_cli(cli);
        Ok(config)
    }

    pub fn from_toml(s: &str) -> Result<Self, String> {
        let mut config = Self::default();
        config.apply_file(&parse_file(s)?);
        Ok(config)
    }

    /// Slug of the destination blog page.
    pub fn blog_slug(&self) -> String {
        self.blog_slug
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| slug::slugify(&self.blog_title))
    }

    /// Ask for a missing blog id or API key. An empty answer is fatal.
    pub fn ensure_credentials(&mut self, prompter: &mut dyn Prompter) -> Result<(), String> {
        if self.blogger.blog_id.trim().is_empty() {
            self.blogger.blog_id = ask_required(prompter, "Blogger blog id: ", "blog id")?;
        }
        if self.blogger.api_key.trim().is_empty() {
            self.blogger.api_key = ask_required(prompter, "Blogger API key: ", "API key")?;
        }
        Ok(())
    }

    fn apply_file(&mut self, file: &FileConfig) {
        let b = &file.blogger;
        set(&mut self.blogger.blog_id, &b.blog_id);
        set(&mut self.blogger.api_key, &b.api_key);
        set(&mut self.blogger.api_base, &b.api_base);
        set(&mut self.blogger.max_results, &b.max_results);
        set(&mut self.blogger.timeout_secs, &b.timeout_secs);
        set(&mut self.blog_title, &b.title);
        set_opt(&mut self.blog_slug, &b.slug);
        set(&mut self.auto_excerpt, &b.auto_excerpt);
        set(&mut self.database, &file.database.path);
        set(&mut self.media_root, &file.media.root);
        set(&mut self.media_url, &file.media.url);
        set(&mut self.image_timeout_secs, &file.media.timeout_secs);
        set(&mut self.image_hosts, &file.media.hosts);
        set(&mut self.embed_format, &file.media.embed_format);
        set_opt(&mut self.site, &file.site.hostname);
        set_opt(&mut self.root_page, &file.site.root_page);
    }

    fn apply_cli(&mut self, cli: &Cli) {
        set(&mut self.blogger.blog_id, &cli.blogger_blog_id);
        set(&mut self.blogger.api_key, &cli.blogger_api_key);
        set(&mut self.blogger.max_results, &cli.max_results);
        set(&mut self.blog_title, &cli.blogger_title);
        set_opt(&mut self.blog_slug, &cli.blogger_slug);
        if cli.no_auto_excerpt {
            self.auto_excerpt = false;
        }
        set(&mut self.database, &cli.database);
        set(&mut self.media_root, &cli.media_root);
        set(&mut self.media_url, &cli.media_url);
        set_opt(&mut self.site, &cli.site);
        set_opt(&mut self.root_page, &cli.root_page);
    }
}

fn set<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}

fn set_opt<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        *target = value.clone();
    }
}

fn read_file(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read config file {}: {}", path.display(), e))
}

fn parse_file(s: &str) -> Result<FileConfig, String> {
    toml::from_str(s).map_err(|e| format!("Invalid config: {}", e))
}

fn ask_required(prompter: &mut dyn Prompter, prompt: &str, what: &str) -> Result<String, String> {
    let answer = prompter.ask(prompt)?;
    let answer = answer.trim();
    if answer.is_empty() {
        return Err(format!("Please provide a Blogger {}", what));
    }
    Ok(answer.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::authors::ScriptedPrompter;
    use clap::Parser;

    #[test]
    fn defaults() {
        let config = ImportConfig::default();
        assert_eq!(config.blogger.max_results, 500);
        assert_eq!(config.database, PathBuf::from("blogger2puput.db"));
        assert!(config.auto_excerpt);
        assert_eq!(config.blog_slug(), "blog");
    }

    #[test]
    fn file_values_apply() {
        let config = ImportConfig::from_toml(
            r#"
            [blogger]
            blog_id = "42"
            title = "My Travels"
            auto_excerpt = false

            [media]
            root = "/srv/media"
            hosts = ["example.org"]

            [site]
            hostname = "blog.example.org"
            "#,
        )
        .unwrap();
        assert_eq!(config.blogger.blog_id, "42");
        assert_eq!(config.blog_slug(), "my-travels");
        assert!(!config.auto_excerpt);
        assert_eq!(config.media_root, PathBuf::from("/srv/media"));
        assert_eq!(config.image_hosts, vec!["example.org"]);
        assert_eq!(config.site.as_deref(), Some("blog.example.org"));
        assert_eq!(config.media_url, "/media/");
    }

    #[test]
    fn invalid_file_is_an_error() {
        assert!(ImportConfig::from_toml("[blogger\nblog_id=").is_err());
    }

    #[test]
    fn flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("import.toml");
        std::fs::write(&path, "[blogger]\nblog_id = \"file\"\nslug = \"from-file\"\n").unwrap();

        let cli = Cli::parse_from([
            "blogger2puput",
            "--config",
            path.to_str().unwrap(),
            "--blogger-blog-id",
            "cli",
            "--no-auto-excerpt",
        ]);
        let config = ImportConfig::load(&cli).unwrap();
        assert_eq!(config.blogger.blog_id, "cli");
        assert_eq!(config.blog_slug(), "from-file");
        assert!(!config.auto_excerpt);
    }

    #[test]
    fn invalid_config_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[media]\nroot = 3\n").unwrap();
        let cli = Cli::parse_from(["blogger2puput", "--config", path.to_str().unwrap()]);
        let err = ImportConfig::load(&cli).unwrap_err();
        assert!(err.contains("broken.toml"));
        assert!(err.contains("Invalid config"));
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let cli = Cli::parse_from(["blogger2puput", "--config", "/nonexistent/import.toml"]);
        assert!(ImportConfig::load(&cli).is_err());
    }

    #[test]
    fn credentials_are_prompted_when_missing() {
        let mut config = ImportConfig::default();
        config.blogger.api_key = "k".to_string();
        let mut prompter = ScriptedPrompter::new(&[" 42 "]);
        config.ensure_credentials(&mut prompter).unwrap();
        assert_eq!(config.blogger.blog_id, "42");
        assert_eq!(prompter.prompts, vec!["Blogger blog id: "]);
    }

    #[test]
    fn empty_credential_answer_is_fatal() {
        let mut config = ImportConfig::default();
        let mut prompter = ScriptedPrompter::new(&["42", ""]);
        let err = config.ensure_credentials(&mut prompter).unwrap_err();
        assert!(err.contains("API key"));
    }
}
