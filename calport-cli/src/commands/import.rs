use std::path::PathBuf;

use anyhow::Result;
use calport_core::{Importer, LocalStore, MigratorConfig};
use owo_colors::OwoColorize;

use crate::render::{ConsoleReport, pluralize};

/// Import every file, then fail if any of them failed.
pub fn run(store: &LocalStore, config: &MigratorConfig, user: &str, files: &[PathBuf]) -> Result<()> {
    let report = ConsoleReport;
    let importer = Importer::new(store, config).with_report(&report);

    let mut failed = 0;
    for path in files {
        if let Err(e) = importer.import_path(user, path) {
            eprintln!("{} {}", path.display(), e.to_string().red());
            failed += 1;
        }
    }

    if failed > 0 {
        anyhow::bail!(
            "{} of {} {} could not be imported",
            failed,
            files.len(),
            pluralize("file", files.len())
        );
    }

    Ok(())
}
