use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser, Default)]
#[command(name = "blogger2puput")]
#[command(about = "Import a Blogger blog into a Puput blog", long_about = None)]
pub struct Cli {
    /// Blogger blog id
    #[arg(long, alias = "blogger_blog_id")]
    pub blogger_blog_id: Option<String>,

    /// Blogger API key
    #[arg(long, alias = "blogger_api_key")]
    pub blogger_api_key: Option<String>,

    /// Title of the destination blog page
    #[arg(long, alias = "blogger_title")]
    pub blogger_title: Option<String>,

    /// Slug of the destination blog page
    #[arg(long, alias = "blogger_slug")]
    pub blogger_slug: Option<String>,

    /// Do not generate entry excerpts
    #[arg(long, alias = "noautoexcerpt")]
    pub no_auto_excerpt: bool,

    /// TOML config file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// SQLite database path
    #[arg(long, value_name = "PATH")]
    pub database: Option<PathBuf>,

    /// Directory re-hosted images are written to
    #[arg(long, value_name = "DIR")]
    pub media_root: Option<PathBuf>,

    /// URL prefix re-hosted images are served from
    #[arg(long, value_name = "URL")]
    pub media_url: Option<String>,

    /// Posts requested from Blogger (1-500)
    #[arg(long, value_name = "N")]
    pub max_results: Option<u32>,

    /// Hostname of the destination site
    #[arg(long, value_name = "HOSTNAME")]
    pub site: Option<String>,

    /// Slug of the root page the blog is created under
    #[arg(long, value_name = "SLUG")]
    pub root_page: Option<String>,
}
