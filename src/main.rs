mod boot;
mod cli;
mod config;
mod db;
mod images;
mod import;
mod models;
mod store;
mod text;


use clap::Parser;
use log::error;
use std::process;

use config::ImportConfig;
use import::authors::ConsolePrompter;
use import::content::HttpDownloader;
use store::sqlite::SqliteStore;
use store::Store;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = cli::Cli::parse();
    if let Err(e) = migrate(&cli) {
        error!("{}", e);
        process::exit(1);
    }
}

fn migrate(cli: &cli::Cli) -> Result<(), String> {
    let mut config = ImportConfig::load(cli)?;
    let mut prompter = ConsolePrompter;
    config.ensure_credentials(&mut prompter)?;

    boot::run(&config);

    let downloader = HttpDownloader::new(config.image_timeout_secs)?;
    import::run(
        &config,
        import::blogger::fetch_posts,
        || open_store(&config),
        &mut prompter,
        &downloader,
    )?;
    Ok(())
}

fn open_store(config: &ImportConfig) -> Result<SqliteStore, String> {
    let db_path = config
        .database
        .to_str()
        .ok_or("Database path is not valid UTF-8")?;
    let store = SqliteStore::new_at(db_path)?;
    store.run_migrations()?;
    store.seed_defaults()?;
    Ok(store)
}
