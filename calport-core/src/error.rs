//! Error types for calport.

use thiserror::Error;

use crate::ics::Problem;

/// Errors reported by a calendar store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Calendar not found: {0}")]
    CalendarNotFound(String),

    #[error("Not a calendar: {0}")]
    NotACalendar(String),

    #[error("Calendar '{uri}' already exists for '{principal}'")]
    AlreadyExists { principal: String, uri: String },

    #[error("Invalid calendar object '{name}': {reason}")]
    InvalidObject { name: String, reason: String },

    #[error("Calendar object already exists: {0}")]
    ObjectExists(String),

    #[error("Invalid name: '{0}'")]
    InvalidName(String),

    #[error("Calendar is not empty: {0}")]
    NotEmpty(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised while reading iCalendar text.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum IcsError {
    #[error("ICS parse error: {0}")]
    Parse(String),

    #[error("Malformed ICS: {0}")]
    Malformed(String),
}

/// Errors raised by the export and import orchestrators.
#[derive(Error, Debug)]
pub enum MigrationError {
    /// The calendar was deleted or is not a calendar resource.
    /// The exporter skips these, they never abort a batch.
    #[error("Not a valid calendar: {uri}")]
    InvalidCalendar { uri: String },

    #[error("{context}: {source}")]
    Migrator {
        context: String,
        #[source]
        source: StoreError,
    },

    #[error("Failed to export calendar '{uri}': {source}")]
    CalendarExport {
        uri: String,
        #[source]
        source: StoreError,
    },

    #[error("No calendars to export for '{principal}'")]
    NothingToExport { principal: String },

    #[error("Could not write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not derive a calendar URI from '{file}'")]
    NoCalendarUri { file: String },

    #[error("Gave up finding a free calendar URI for '{uri}' after {attempts} attempts")]
    NamingExhausted { uri: String, attempts: u32 },

    #[error("Rolling back calendar '{uri}' failed: {source}")]
    Rollback {
        uri: String,
        #[source]
        source: StoreError,
    },

    #[error("Invalid calendar data in {file}: {}", format_problems(.problems))]
    InvalidData { file: String, problems: Vec<Problem> },

    #[error("Invalid calendar object {object} in {file}: {reason}")]
    InvalidObject {
        file: String,
        object: String,
        reason: String,
    },

    #[error("Could not parse {file}: {reason}")]
    Parse { file: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl MigrationError {
    /// Whether the error aborts the whole operation.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, MigrationError::InvalidCalendar { .. })
    }
}

fn format_problems(problems: &[Problem]) -> String {
    problems
        .iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for migration operations.
pub type MigrationResult<T> = Result<T, MigrationError>;
