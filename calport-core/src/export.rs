//! Export a user's calendars as ICS artifacts.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::artifact::{ExportArtifact, file_name, sanitize_name};
use crate::calendar::{CalendarDescriptor, CalendarMetadata};
use crate::config::MigratorConfig;
use crate::error::{MigrationError, MigrationResult, StoreError};
use crate::ics;
use crate::naming;
use crate::report::{Report, Silent};
use crate::store::CalendarStore;

pub struct Exporter<'a> {
    store: &'a dyn CalendarStore,
    config: &'a MigratorConfig,
    report: &'a dyn Report,
}

impl<'a> Exporter<'a> {
    pub fn new(store: &'a dyn CalendarStore, config: &'a MigratorConfig) -> Self {
        Exporter {
            store,
            config,
            report: &Silent,
        }
    }

    pub fn with_report(mut self, report: &'a dyn Report) -> Self {
        self.report = report;
        self
    }

    /// Export every calendar of `principal`, one artifact per calendar.
    ///
    /// Calendars that turn out to be gone or not calendars at all are left
    /// out. Any other failure aborts the export, and so does having nothing
    /// left to export.
    pub fn export_user(&self, principal: &str, date: NaiveDate) -> MigrationResult<Vec<ExportArtifact>> {
        let calendars = self
            .store
            .list_calendars(principal)
            .map_err(|source| MigrationError::Migrator {
                context: format!("Could not list calendars of '{}'", principal),
                source,
            })?;

        let mut stems = HashSet::new();
        let mut artifacts = Vec::new();

        for calendar in &calendars {
            match self.export_with_stems(calendar, date, &mut stems) {
                Ok(artifact) => artifacts.push(artifact),
                Err(MigrationError::InvalidCalendar { uri }) => {
                    warn!(principal, uri = %uri, "Not a calendar, skipping");
                    self.report.calendar_skipped(&uri);
                }
                Err(e) => return Err(e),
            }
        }

        if artifacts.is_empty() {
            return Err(MigrationError::NothingToExport {
                principal: principal.to_string(),
            });
        }

        Ok(artifacts)
    }

    /// Export a single calendar.
    pub fn export_calendar(
        &self,
        calendar: &CalendarDescriptor,
        date: NaiveDate,
    ) -> MigrationResult<ExportArtifact> {
        self.export_with_stems(calendar, date, &mut HashSet::new())
    }

    fn export_with_stems(
        &self,
        calendar: &CalendarDescriptor,
        date: NaiveDate,
        stems: &mut HashSet<String>,
    ) -> MigrationResult<ExportArtifact> {
        let metadata = self.resolve_metadata(calendar)?;
        let blobs = self
            .store
            .list_objects(&calendar.id)
            .map_err(|e| calendar_error(calendar, e))?;
        debug!(calendar = %calendar, objects = blobs.len(), "Merging calendar objects");

        let document = ics::merge(&metadata, &blobs, &self.config.product_id);

        let stem = naming::resolve(&sanitize_name(&metadata.display_name, &calendar.uri), stems);
        stems.insert(stem.clone());

        let artifact = ExportArtifact::new(file_name(&stem, date), document.to_ics());
        info!(calendar = %calendar, file = %artifact.name, "Exported calendar");
        self.report.calendar_exported(calendar, &artifact);

        Ok(artifact)
    }

    fn resolve_metadata(&self, calendar: &CalendarDescriptor) -> MigrationResult<CalendarMetadata> {
        self.store
            .calendar_metadata(&calendar.id)
            .map_err(|e| calendar_error(calendar, e))
    }
}

/// Gone or non-calendar resources are skippable, everything else is fatal
/// and names the calendar.
fn calendar_error(calendar: &CalendarDescriptor, error: StoreError) -> MigrationError {
    match error {
        StoreError::CalendarNotFound(_) | StoreError::NotACalendar(_) => {
            MigrationError::InvalidCalendar {
                uri: calendar.uri.clone(),
            }
        }
        source => MigrationError::CalendarExport {
            uri: calendar.uri.clone(),
            source,
        },
    }
}
