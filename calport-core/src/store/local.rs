//! Directory-backed calendar store.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::{CalendarStore, check_name, check_object};
use crate::calendar::{CalendarDescriptor, CalendarId, CalendarMetadata, CalendarObjectBlob};
use crate::error::{StoreError, StoreResult};
use crate::ics::ICS_EXTENSION;

const METADATA_DIR: &str = ".calport";
const METADATA_FILE: &str = "calendar.toml";

/// Calendars live in `<root>/<principal>/<uri>/`, one `.ics` file per
/// object. A directory is only a calendar if it has a
/// `.calport/calendar.toml` metadata file.
#[derive(Debug, Clone)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalStore { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn id_for(principal: &str, uri: &str) -> CalendarId {
        CalendarId::new(format!("{}/{}", principal, uri))
    }

    fn calendar_dir(&self, id: &CalendarId) -> StoreResult<PathBuf> {
        let (principal, uri) = id
            .as_str()
            .split_once('/')
            .ok_or_else(|| StoreError::CalendarNotFound(id.to_string()))?;
        check_name(principal)?;
        check_name(uri)?;

        Ok(self.root.join(principal).join(uri))
    }

    /// Calendar directory of an existing calendar
    fn existing_dir(&self, id: &CalendarId) -> StoreResult<PathBuf> {
        let dir = self.calendar_dir(id)?;
        if !dir.is_dir() {
            return Err(StoreError::CalendarNotFound(id.to_string()));
        }
        Ok(dir)
    }

    fn metadata_path(dir: &Path) -> PathBuf {
        dir.join(METADATA_DIR).join(METADATA_FILE)
    }

    fn load_metadata(id: &CalendarId, dir: &Path) -> StoreResult<CalendarMetadata> {
        let path = Self::metadata_path(dir);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotACalendar(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        toml::from_str(&content)
            .map_err(|e| StoreError::Metadata(format!("{}: {}", path.display(), e)))
    }

    fn save_metadata(dir: &Path, metadata: &CalendarMetadata) -> StoreResult<()> {
        let meta_dir = dir.join(METADATA_DIR);
        std::fs::create_dir_all(&meta_dir)?;

        let content =
            toml::to_string_pretty(metadata).map_err(|e| StoreError::Metadata(e.to_string()))?;
        std::fs::write(meta_dir.join(METADATA_FILE), content)?;

        Ok(())
    }

    /// Write `text` to the file just created at `path`. A failed write
    /// removes the file so no truncated object is left behind.
    fn fill_new_file(path: &Path, mut file: impl Write, text: &str) -> StoreResult<()> {
        let Err(e) = file.write_all(text.as_bytes()).and_then(|()| file.flush()) else {
            return Ok(());
        };

        drop(file);
        if let Err(cleanup) = std::fs::remove_file(path) {
            warn!(path = %path.display(), error = %cleanup, "Could not remove partially written object");
        }
        Err(e.into())
    }

    fn object_paths(dir: &Path) -> StoreResult<Vec<PathBuf>> {
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && path.extension().is_some_and(|e| e == "ics"))
            .collect();

        paths.sort();
        Ok(paths)
    }
}

impl CalendarStore for LocalStore {
    fn list_calendars(&self, principal: &str) -> StoreResult<Vec<CalendarDescriptor>> {
        check_name(principal)?;

        let entries = match std::fs::read_dir(self.root.join(principal)) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut calendars: Vec<CalendarDescriptor> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .filter_map(|path| {
                let uri = path.file_name()?.to_str()?.to_string();
                if uri.starts_with('.') {
                    return None;
                }

                let id = Self::id_for(principal, &uri);
                // Listing is best effort, calendar_metadata reports why an entry is unusable
                let metadata = Self::load_metadata(&id, &path).unwrap_or_default();

                Some(CalendarDescriptor {
                    id,
                    principal: principal.to_string(),
                    uri,
                    metadata,
                })
            })
            .collect();

        calendars.sort_by(|a, b| a.uri.cmp(&b.uri));
        Ok(calendars)
    }

    fn calendar_metadata(&self, id: &CalendarId) -> StoreResult<CalendarMetadata> {
        let dir = self.existing_dir(id)?;
        Self::load_metadata(id, &dir)
    }

    fn list_objects(&self, id: &CalendarId) -> StoreResult<Vec<CalendarObjectBlob>> {
        let dir = self.existing_dir(id)?;

        Self::object_paths(&dir)?
            .into_iter()
            .map(|path| {
                let href = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();

                let data = match std::fs::read(&path) {
                    Ok(bytes) => String::from_utf8(bytes).ok(),
                    Err(e) if e.kind() == ErrorKind::NotFound => None,
                    Err(e) => return Err(e.into()),
                };
                if data.is_none() {
                    debug!(path = %path.display(), "Object has no readable text");
                }

                Ok(CalendarObjectBlob { href, data })
            })
            .collect()
    }

    fn create_calendar(
        &self,
        principal: &str,
        uri: &str,
        metadata: &CalendarMetadata,
    ) -> StoreResult<CalendarId> {
        check_name(principal)?;
        check_name(uri)?;

        let principal_dir = self.root.join(principal);
        std::fs::create_dir_all(&principal_dir)?;

        let dir = principal_dir.join(uri);
        match std::fs::create_dir(&dir) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::AlreadyExists {
                    principal: principal.to_string(),
                    uri: uri.to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        if let Err(e) = Self::save_metadata(&dir, metadata) {
            if let Err(cleanup) = std::fs::remove_dir_all(&dir) {
                warn!(path = %dir.display(), error = %cleanup, "Could not remove half-created calendar");
            }
            return Err(e);
        }

        debug!(principal, uri, "Created calendar directory");
        Ok(Self::id_for(principal, uri))
    }

    fn create_object(&self, id: &CalendarId, name: &str, text: &str) -> StoreResult<()> {
        let dir = self.existing_dir(id)?;
        Self::load_metadata(id, &dir)?;
        check_name(name)?;
        if !name.ends_with(ICS_EXTENSION) {
            return Err(StoreError::InvalidName(name.to_string()));
        }
        check_object(name, text)?;

        let path = dir.join(name);
        let file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(StoreError::ObjectExists(name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        Self::fill_new_file(&path, file, text)
    }

    fn delete_calendar(&self, id: &CalendarId, cascade: bool) -> StoreResult<()> {
        let dir = self.existing_dir(id)?;

        if !cascade && !Self::object_paths(&dir)?.is_empty() {
            return Err(StoreError::NotEmpty(id.to_string()));
        }

        std::fs::remove_dir_all(&dir)?;
        debug!(calendar = %id, "Deleted calendar directory");
        Ok(())
    }
}
