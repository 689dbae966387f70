//! Import ICS artifacts as new calendars.

use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, error, info};
use uuid::Uuid;

use crate::artifact::desired_uri_from_filename;
use crate::calendar::{CalendarId, CalendarMetadata};
use crate::config::MigratorConfig;
use crate::error::{MigrationError, MigrationResult, StoreError};
use crate::ics::{self, Document, ICS_EXTENSION, ParseMode, SplitCalendar};
use crate::naming;
use crate::report::{Report, Silent};
use crate::store::CalendarStore;

/// The outcome of a successful import.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSummary {
    pub file: String,
    pub uri: String,
    pub calendar_id: CalendarId,
    pub display_name: String,
    /// Number of calendar objects created
    pub objects: usize,
}

pub struct Importer<'a> {
    store: &'a dyn CalendarStore,
    config: &'a MigratorConfig,
    report: &'a dyn Report,
}

impl<'a> Importer<'a> {
    pub fn new(store: &'a dyn CalendarStore, config: &'a MigratorConfig) -> Self {
        Importer {
            store,
            config,
            report: &Silent,
        }
    }

    pub fn with_report(mut self, report: &'a dyn Report) -> Self {
        self.report = report;
        self
    }

    /// Read `path` and import it.
    pub fn import_path(&self, principal: &str, path: &Path) -> MigrationResult<ImportSummary> {
        let bytes = std::fs::read(path).map_err(|e| MigrationError::Parse {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        self.import_bytes(principal, &filename, &bytes)
    }

    /// Import one artifact into a new calendar of `principal`.
    ///
    /// Nothing is created unless the document validates. The calendar uri
    /// comes from `filename` and never replaces an existing calendar. If the
    /// store rejects one of the objects, the new calendar is deleted again.
    pub fn import_bytes(
        &self,
        principal: &str,
        filename: &str,
        bytes: &[u8],
    ) -> MigrationResult<ImportSummary> {
        let parse_error = |reason: String| MigrationError::Parse {
            file: filename.to_string(),
            reason,
        };

        let text = std::str::from_utf8(bytes).map_err(|e| parse_error(format!("not UTF-8: {e}")))?;
        let document =
            Document::parse(text, ParseMode::Forgiving).map_err(|e| parse_error(e.to_string()))?;

        let problems = document.validate();
        if !problems.is_empty() {
            return Err(MigrationError::InvalidData {
                file: filename.to_string(),
                problems,
            });
        }

        let desired = desired_uri_from_filename(filename).ok_or_else(|| {
            MigrationError::NoCalendarUri {
                file: filename.to_string(),
            }
        })?;

        let split = ics::split(&document, &self.config.product_id);
        let metadata = self.metadata_for(&split, filename);

        let (uri, id) = self.create_calendar(principal, &desired, &metadata)?;
        info!(principal, uri = %uri, objects = split.objects.len(), "Created calendar");

        self.create_objects(filename, &uri, &id, &split)?;

        let summary = ImportSummary {
            file: filename.to_string(),
            uri,
            calendar_id: id,
            display_name: metadata.display_name,
            objects: split.objects.len(),
        };
        self.report.calendar_imported(&summary);

        Ok(summary)
    }

    fn metadata_for(&self, split: &SplitCalendar, filename: &str) -> CalendarMetadata {
        let display_name = if split.display_name.trim().is_empty() {
            self.config.fallback_display_name(filename)
        } else {
            split.display_name.clone()
        };
        let color = if split.color.is_empty() {
            self.config.default_color.clone()
        } else {
            split.color.clone()
        };

        CalendarMetadata {
            display_name,
            color: Some(color),
            components: split.component_types.clone(),
        }
    }

    /// Create the calendar under a free uri. The listed uris are only a
    /// snapshot, so a creation-time AlreadyExists picks the next candidate.
    fn create_calendar(
        &self,
        principal: &str,
        desired: &str,
        metadata: &CalendarMetadata,
    ) -> MigrationResult<(String, CalendarId)> {
        let mut existing: HashSet<String> = self
            .store
            .list_calendars(principal)
            .map_err(|source| MigrationError::Migrator {
                context: format!("Could not list calendars of '{}'", principal),
                source,
            })?
            .into_iter()
            .map(|c| c.uri)
            .collect();

        let attempts = self.config.name_attempts.saturating_add(1);
        for _ in 0..attempts {
            let uri = naming::resolve(desired, &existing);

            match self.store.create_calendar(principal, &uri, metadata) {
                Ok(id) => return Ok((uri, id)),
                Err(StoreError::AlreadyExists { .. }) => {
                    debug!(principal, uri = %uri, "Calendar uri was taken, trying the next one");
                    existing.insert(uri);
                }
                Err(source) => {
                    return Err(MigrationError::Migrator {
                        context: format!("Could not create calendar '{}'", uri),
                        source,
                    });
                }
            }
        }

        Err(MigrationError::NamingExhausted {
            uri: desired.to_string(),
            attempts,
        })
    }

    fn create_objects(
        &self,
        filename: &str,
        uri: &str,
        id: &CalendarId,
        split: &SplitCalendar,
    ) -> MigrationResult<()> {
        for object in &split.objects {
            let name = format!("{}{}", Uuid::new_v4(), ICS_EXTENSION);

            match self.store.create_object(id, &name, &object.data) {
                Ok(()) => debug!(uri, object = %name, uid = ?object.uid, "Created calendar object"),
                Err(StoreError::InvalidObject { reason, .. }) => {
                    error!(uri, object = %name, reason = %reason, "Calendar object rejected, rolling back");
                    self.store
                        .delete_calendar(id, true)
                        .map_err(|source| MigrationError::Rollback {
                            uri: uri.to_string(),
                            source,
                        })?;
                    self.report.import_rolled_back(filename, uri);

                    return Err(MigrationError::InvalidObject {
                        file: filename.to_string(),
                        object: object.uid.clone().unwrap_or(name),
                        reason,
                    });
                }
                Err(source) => {
                    return Err(MigrationError::Migrator {
                        context: format!("Could not create object {} in '{}'", name, uri),
                        source,
                    });
                }
            }
        }

        Ok(())
    }
}
