//! Calendar storage.
//!
//! The orchestrators only talk to a [`CalendarStore`]. [`LocalStore`] keeps
//! calendars as directories of .ics files, [`MemoryStore`] keeps them in
//! memory and can be told to fail on purpose.

mod local;
mod memory;

pub use local::LocalStore;
pub use memory::{FailurePlan, MemoryStore};

use crate::calendar::{CalendarDescriptor, CalendarId, CalendarMetadata, CalendarObjectBlob};
use crate::error::{StoreError, StoreResult};
use crate::ics::{Document, ParseMode};

pub trait CalendarStore: Send + Sync {
    /// Calendars owned by `principal`, as currently listed. Entries may
    /// still turn out not to be calendars when their metadata is resolved.
    fn list_calendars(&self, principal: &str) -> StoreResult<Vec<CalendarDescriptor>>;

    fn calendar_metadata(&self, id: &CalendarId) -> StoreResult<CalendarMetadata>;

    /// Objects of a calendar in a stable order
    fn list_objects(&self, id: &CalendarId) -> StoreResult<Vec<CalendarObjectBlob>>;

    /// Fails with [`StoreError::AlreadyExists`] if `principal` already owns `uri`.
    fn create_calendar(
        &self,
        principal: &str,
        uri: &str,
        metadata: &CalendarMetadata,
    ) -> StoreResult<CalendarId>;

    /// Fails with [`StoreError::InvalidObject`] if `text` is not a single
    /// well-formed calendar object.
    fn create_object(&self, id: &CalendarId, name: &str, text: &str) -> StoreResult<()>;

    /// Deleting a calendar that still holds objects requires `cascade`.
    fn delete_calendar(&self, id: &CalendarId, cascade: bool) -> StoreResult<()>;
}

/// Accept only text that parses strictly into a VCALENDAR holding at least
/// one component and without validation problems.
pub(crate) fn check_object(name: &str, text: &str) -> StoreResult<()> {
    let invalid = |reason: String| StoreError::InvalidObject {
        name: name.to_string(),
        reason,
    };

    let document = Document::parse(text, ParseMode::Strict).map_err(|e| invalid(e.to_string()))?;

    if let Some(problem) = document.validate().into_iter().next() {
        return Err(invalid(problem.to_string()));
    }

    if document.components().is_empty() {
        return Err(invalid("no calendar components".to_string()));
    }

    Ok(())
}

/// Names become path segments in [`LocalStore`], so the same rules apply to
/// every store.
pub(crate) fn check_name(name: &str) -> StoreResult<()> {
    let bad = name.trim().is_empty()
        || name.starts_with('.')
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control);

    if bad {
        Err(StoreError::InvalidName(name.to_string()))
    } else {
        Ok(())
    }
}
