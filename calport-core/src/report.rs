//! Progress reporting for export and import runs.

use crate::artifact::ExportArtifact;
use crate::calendar::CalendarDescriptor;
use crate::import::ImportSummary;

/// Receives user-facing progress. Every method defaults to doing nothing.
pub trait Report {
    fn calendar_exported(&self, _calendar: &CalendarDescriptor, _artifact: &ExportArtifact) {}

    /// A listed calendar turned out not to be a calendar and was left out
    fn calendar_skipped(&self, _uri: &str) {}

    fn calendar_imported(&self, _summary: &ImportSummary) {}

    /// A partially imported calendar was deleted again
    fn import_rolled_back(&self, _file: &str, _uri: &str) {}
}

/// Discards all progress.
pub struct Silent;

impl Report for Silent {}
