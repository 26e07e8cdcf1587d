use log::{error, info, warn};
use std::fs;
use std::path::Path;
use std::process;

use crate::config::ImportConfig;
use crate::images::ORIGINALS_DIR;

#[derive(Debug, Default, PartialEq)]
pub struct BootCheck {
    pub warnings: u32,
    pub errors: u32,
}

/// Run all boot checks. Call this before opening the store.
/// Exits the process when anything critical fails.
pub fn run(config: &ImportConfig) {
    let check = check(config);

    if check.errors > 0 {
        error!(
            "Boot check FAILED: {} error(s), {} warning(s). Aborting.",
            check.errors, check.warnings
        );
        process::exit(1);
    }

    if check.warnings > 0 {
        warn!(
            "Boot check passed with {} warning(s). Some images may not be re-hosted.",
            check.warnings
        );
    } else {
        info!("Boot check passed.");
    }
}

/// Create missing directories and check that they are writable.
pub fn check(config: &ImportConfig) -> BootCheck {
    info!("blogger2puput boot check starting...");
    let mut result = BootCheck::default();

    // ── 1. Media directories ───────────────────────────
    let originals = config.media_root.join(ORIGINALS_DIR);
    for dir in [config.media_root.as_path(), originals.as_path()] {
        ensure_dir(dir, &mut result);
    }

    // ── 2. Originals directory writable ────────────────
    if originals.exists() {
        if let Err(e) = write_test(&originals) {
            error!("  Media directory not writable: {}", e);
            result.errors += 1;
        }
    }

    // ── 3. Database directory ──────────────────────────
    let db_dir = config
        .database
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    ensure_dir(db_dir, &mut result);
    if db_dir.exists() {
        if let Err(e) = write_test(db_dir) {
            error!("  Database directory not writable: {}", e);
            result.errors += 1;
        }
    }

    // ── 4. Media URL ───────────────────────────────────
    if !config.media_url.ends_with('/') {
        warn!("  Media URL '{}' has no trailing slash", config.media_url);
        result.warnings += 1;
    }

    result
}

fn ensure_dir(path: &Path, result: &mut BootCheck) {
    if path.exists() {
        return;
    }
    match fs::create_dir_all(path) {
        Ok(_) => info!("  Created directory: {}", path.display()),
        Err(e) => {
            error!("  FAILED to create directory {}: {}", path.display(), e);
            result.errors += 1;
        }
    }
}

fn write_test(dir: &Path) -> std::io::Result<()> {
    let test_file = dir.join(".write_test");
    fs::write(&test_file, "test")?;
    fs::remove_file(&test_file)
}
