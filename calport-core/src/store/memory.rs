//! In-memory calendar store.

use std::collections::HashSet;

use parking_lot::Mutex;

use super::{CalendarStore, check_name, check_object};
use crate::calendar::{CalendarDescriptor, CalendarId, CalendarMetadata, CalendarObjectBlob};
use crate::error::{StoreError, StoreResult};

/// Failures a [`MemoryStore`] injects into otherwise valid operations.
#[derive(Debug, Clone, Default)]
pub struct FailurePlan {
    /// 1-based index of the create_object call that fails with a data error
    fail_object_at: Option<usize>,
    not_a_calendar: HashSet<String>,
    broken_metadata: HashSet<String>,
    /// Calendar creations answered with AlreadyExists before any succeeds
    reject_creations: usize,
}

impl FailurePlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_object_creation(mut self, nth: usize) -> Self {
        self.fail_object_at = Some(nth);
        self
    }

    /// Metadata lookups for `uri` report "not a calendar"
    pub fn not_a_calendar(mut self, uri: impl Into<String>) -> Self {
        self.not_a_calendar.insert(uri.into());
        self
    }

    /// Metadata lookups for `uri` fail with a backend error
    pub fn broken_metadata(mut self, uri: impl Into<String>) -> Self {
        self.broken_metadata.insert(uri.into());
        self
    }

    /// Pretend someone else grabbed the uri for the next `count` creations
    pub fn reject_calendar_creations(mut self, count: usize) -> Self {
        self.reject_creations = count;
        self
    }
}

#[derive(Debug)]
struct StoredCalendar {
    id: CalendarId,
    principal: String,
    uri: String,
    metadata: CalendarMetadata,
    objects: Vec<CalendarObjectBlob>,
}

impl StoredCalendar {
    fn descriptor(&self) -> CalendarDescriptor {
        CalendarDescriptor {
            id: self.id.clone(),
            principal: self.principal.clone(),
            uri: self.uri.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

#[derive(Debug, Default)]
struct State {
    calendars: Vec<StoredCalendar>,
    next_id: u64,
    object_creations: usize,
    rejected_creations: usize,
    plan: FailurePlan,
}

impl State {
    fn calendar(&self, id: &CalendarId) -> StoreResult<&StoredCalendar> {
        self.calendars
            .iter()
            .find(|c| &c.id == id)
            .ok_or_else(|| StoreError::CalendarNotFound(id.to_string()))
    }

    fn calendar_mut(&mut self, id: &CalendarId) -> StoreResult<&mut StoredCalendar> {
        self.calendars
            .iter_mut()
            .find(|c| &c.id == id)
            .ok_or_else(|| StoreError::CalendarNotFound(id.to_string()))
    }

    fn insert(&mut self, principal: &str, uri: &str, metadata: &CalendarMetadata) -> CalendarId {
        self.next_id += 1;
        let id = CalendarId::new(format!("mem-{}", self.next_id));

        self.calendars.push(StoredCalendar {
            id: id.clone(),
            principal: principal.to_string(),
            uri: uri.to_string(),
            metadata: metadata.clone(),
            objects: Vec::new(),
        });

        id
    }
}

/// Calendars held in memory, listed in creation order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_failures(plan: FailurePlan) -> Self {
        let store = Self::default();
        store.state.lock().plan = plan;
        store
    }

    /// Seed a calendar, bypassing the failure plan
    pub fn add_calendar(&self, principal: &str, uri: &str, metadata: CalendarMetadata) -> CalendarId {
        self.state.lock().insert(principal, uri, &metadata)
    }

    /// Seed an object without validating it
    pub fn add_object(&self, id: &CalendarId, blob: CalendarObjectBlob) -> StoreResult<()> {
        self.state.lock().calendar_mut(id)?.objects.push(blob);
        Ok(())
    }

    /// Objects of a calendar, empty if it does not exist
    pub fn objects(&self, id: &CalendarId) -> Vec<CalendarObjectBlob> {
        self.state
            .lock()
            .calendar(id)
            .map(|c| c.objects.clone())
            .unwrap_or_default()
    }

    pub fn calendar_count(&self, principal: &str) -> usize {
        self.state
            .lock()
            .calendars
            .iter()
            .filter(|c| c.principal == principal)
            .count()
    }

    /// Objects across all calendars
    pub fn object_count(&self) -> usize {
        self.state.lock().calendars.iter().map(|c| c.objects.len()).sum()
    }
}

impl CalendarStore for MemoryStore {
    fn list_calendars(&self, principal: &str) -> StoreResult<Vec<CalendarDescriptor>> {
        Ok(self
            .state
            .lock()
            .calendars
            .iter()
            .filter(|c| c.principal == principal)
            .map(StoredCalendar::descriptor)
            .collect())
    }

    fn calendar_metadata(&self, id: &CalendarId) -> StoreResult<CalendarMetadata> {
        let state = self.state.lock();
        let calendar = state.calendar(id)?;

        if state.plan.not_a_calendar.contains(&calendar.uri) {
            return Err(StoreError::NotACalendar(id.to_string()));
        }
        if state.plan.broken_metadata.contains(&calendar.uri) {
            return Err(StoreError::Backend(format!(
                "metadata lookup failed for {}",
                calendar.uri
            )));
        }

        Ok(calendar.metadata.clone())
    }

    fn list_objects(&self, id: &CalendarId) -> StoreResult<Vec<CalendarObjectBlob>> {
        Ok(self.state.lock().calendar(id)?.objects.clone())
    }

    fn create_calendar(
        &self,
        principal: &str,
        uri: &str,
        metadata: &CalendarMetadata,
    ) -> StoreResult<CalendarId> {
        check_name(principal)?;
        check_name(uri)?;

        let mut state = self.state.lock();
        let taken = state
            .calendars
            .iter()
            .any(|c| c.principal == principal && c.uri == uri);

        if taken || state.rejected_creations < state.plan.reject_creations {
            if !taken {
                state.rejected_creations += 1;
            }
            return Err(StoreError::AlreadyExists {
                principal: principal.to_string(),
                uri: uri.to_string(),
            });
        }

        Ok(state.insert(principal, uri, metadata))
    }

    fn create_object(&self, id: &CalendarId, name: &str, text: &str) -> StoreResult<()> {
        check_name(name)?;

        let mut state = self.state.lock();
        state.calendar(id)?;

        state.object_creations += 1;
        if state.plan.fail_object_at == Some(state.object_creations) {
            return Err(StoreError::InvalidObject {
                name: name.to_string(),
                reason: "rejected by failure plan".to_string(),
            });
        }

        check_object(name, text)?;

        let calendar = state.calendar_mut(id)?;
        if calendar.objects.iter().any(|o| o.href == name) {
            return Err(StoreError::ObjectExists(name.to_string()));
        }
        calendar.objects.push(CalendarObjectBlob::new(name, text));

        Ok(())
    }

    fn delete_calendar(&self, id: &CalendarId, cascade: bool) -> StoreResult<()> {
        let mut state = self.state.lock();
        let position = state
            .calendars
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| StoreError::CalendarNotFound(id.to_string()))?;

        if !cascade && !state.calendars[position].objects.is_empty() {
            return Err(StoreError::NotEmpty(id.to_string()));
        }

        state.calendars.remove(position);
        Ok(())
    }
}
