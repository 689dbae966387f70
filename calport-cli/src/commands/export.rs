use std::path::Path;

use anyhow::Result;
use calport_core::{CalendarStore, Exporter, LocalStore, MigratorConfig};
use chrono::Local;
use owo_colors::OwoColorize;

use crate::render::{ConsoleReport, pluralize};

pub fn run(
    store: &LocalStore,
    config: &MigratorConfig,
    user: &str,
    out: &Path,
    calendar: Option<&str>,
) -> Result<()> {
    let report = ConsoleReport;
    let exporter = Exporter::new(store, config).with_report(&report);
    let today = Local::now().date_naive();

    let artifacts = match calendar {
        Some(uri) => {
            let calendars = store.list_calendars(user)?;
            let Some(descriptor) = calendars.iter().find(|c| c.uri == uri) else {
                let available: Vec<_> = calendars.iter().map(|c| c.uri.as_str()).collect();
                anyhow::bail!(
                    "Calendar '{}' not found. Available: {}",
                    uri,
                    available.join(", ")
                );
            };
            vec![exporter.export_calendar(descriptor, today)?]
        }
        None => exporter.export_user(user, today)?,
    };

    for artifact in &artifacts {
        let path = artifact.write_to(out)?;
        println!("   {}", path.display().dimmed());
    }

    println!(
        "\nExported {} {}",
        artifacts.len(),
        pluralize("calendar", artifacts.len())
    );

    Ok(())
}
