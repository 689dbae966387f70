//! Calendar migration engine.
//!
//! Exports a user's calendars to portable ICS documents and imports such
//! documents back as new calendars:
//! - [`ics`] merges stored calendar objects into one document and splits it again
//! - [`naming`] picks collision-free calendar uris
//! - [`export::Exporter`] and [`import::Importer`] drive a [`store::CalendarStore`]

pub mod artifact;
pub mod calendar;
pub mod config;
pub mod error;
pub mod export;
pub mod ics;
pub mod import;
pub mod naming;
pub mod report;
pub mod store;

pub use artifact::ExportArtifact;
pub use calendar::{CalendarDescriptor, CalendarId, CalendarMetadata, CalendarObjectBlob, ComponentTypes};
pub use crate::config::MigratorConfig;
pub use error::{MigrationError, MigrationResult, StoreError, StoreResult};
pub use export::Exporter;
pub use import::{ImportSummary, Importer};
pub use report::Report;
pub use store::{CalendarStore, LocalStore, MemoryStore};
