//! Terminal output for calport-core types.

use calport_core::calendar::{CalendarDescriptor, CalendarMetadata};
use calport_core::{ExportArtifact, ImportSummary, Report};
use owo_colors::OwoColorize;

/// Extension trait for colored terminal rendering.
pub trait Render {
    fn render(&self) -> String;
}

impl Render for CalendarDescriptor {
    fn render(&self) -> String {
        format!("{} {}", self.uri.bold(), self.metadata.display_name.dimmed())
    }
}

impl Render for CalendarMetadata {
    fn render(&self) -> String {
        let mut parts = vec![self.display_name.clone()];
        if let Some(color) = &self.color {
            parts.push(color.dimmed().to_string());
        }
        if !self.components.is_empty() {
            parts.push(format!("[{}]", self.components).dimmed().to_string());
        }
        parts.join(" ")
    }
}

/// Prints export and import progress as it happens.
pub struct ConsoleReport;

impl Report for ConsoleReport {
    fn calendar_exported(&self, calendar: &CalendarDescriptor, artifact: &ExportArtifact) {
        println!("{} {} → {}", "✓".green(), calendar.render(), artifact.name);
    }

    fn calendar_skipped(&self, uri: &str) {
        println!("{} {} {}", "-".yellow(), uri, "(not a calendar, skipped)".dimmed());
    }

    fn calendar_imported(&self, summary: &ImportSummary) {
        println!(
            "{} {} → {} ({} {})",
            "✓".green(),
            summary.file,
            summary.uri.bold(),
            summary.objects,
            pluralize("object", summary.objects)
        );
    }

    fn import_rolled_back(&self, file: &str, uri: &str) {
        eprintln!(
            "{} {} {}",
            "↺".red(),
            file,
            format!("(calendar '{}' rolled back)", uri).red()
        );
    }
}

pub fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{}s", word)
    }
}
