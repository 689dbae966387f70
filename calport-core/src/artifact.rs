//! Export artifacts and the filenames they travel under.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::error::{MigrationError, MigrationResult};
use crate::ics::ICS_EXTENSION;

const DATE_FORMAT: &str = "%Y-%m-%d";
/// Length of a `-YYYY-MM-DD` suffix
const DATE_SUFFIX_LEN: usize = 11;

/// One exported calendar: a filename and the serialized document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub name: String,
    pub data: Vec<u8>,
}

impl ExportArtifact {
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        ExportArtifact {
            name: name.into(),
            data: data.into(),
        }
    }

    /// Write the artifact as `dir/<name>`, returning the written path.
    pub fn write_to(&self, dir: &Path) -> MigrationResult<PathBuf> {
        let path = dir.join(&self.name);

        std::fs::create_dir_all(dir)
            .and_then(|_| std::fs::write(&path, &self.data))
            .map_err(|source| MigrationError::Write {
                path: path.display().to_string(),
                source,
            })?;

        Ok(path)
    }
}

/// Strip a display name down to alphanumerics, spaces, hyphens and
/// underscores, trimmed. Falls back to the sanitized uri, then to `calendar`.
pub fn sanitize_name(display_name: &str, uri: &str) -> String {
    [display_name, uri]
        .iter()
        .map(|s| keep_safe_chars(s).trim().to_string())
        .find(|s| !s.is_empty())
        .unwrap_or_else(|| "calendar".to_string())
}

fn keep_safe_chars(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ' || *c == '-' || *c == '_')
        .collect()
}

/// `<stem>-<YYYY-MM-DD>.ics`
pub fn file_name(stem: &str, date: NaiveDate) -> String {
    format!("{}-{}{}", stem, date.format(DATE_FORMAT), ICS_EXTENSION)
}

/// Recover the calendar name an artifact was exported from.
///
/// `work-stuff-2024-05-01.ics` gives `work-stuff`. Names without a date
/// suffix are cut at their first hyphen. Returns None when nothing is left.
pub fn desired_uri_from_filename(filename: &str) -> Option<String> {
    let stem = filename.strip_suffix(ICS_EXTENSION).unwrap_or(filename);

    let seed = match strip_date_suffix(stem) {
        Some(name) => name,
        None => stem.split('-').next().unwrap_or(stem),
    };

    let seed = seed.trim();
    if seed.is_empty() {
        None
    } else {
        Some(seed.to_string())
    }
}

fn strip_date_suffix(stem: &str) -> Option<&str> {
    let split_at = stem.len().checked_sub(DATE_SUFFIX_LEN)?;
    if !stem.is_char_boundary(split_at) {
        return None;
    }

    let (name, suffix) = stem.split_at(split_at);
    let date = suffix.strip_prefix('-')?;
    NaiveDate::parse_from_str(date, DATE_FORMAT).ok()?;

    Some(name)
}
