//! Calendar descriptors and the values exchanged with a calendar store.

use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Opaque storage key of a calendar container.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CalendarId(String);

impl CalendarId {
    pub fn new(id: impl Into<String>) -> Self {
        CalendarId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CalendarId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Component kinds a calendar supports (VEVENT, VTODO...), in first-seen
/// order and without duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentTypes(IndexSet<String>);

impl ComponentTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a kind, returns false if it was already present
    pub fn insert(&mut self, kind: &str) -> bool {
        self.0.insert(kind.to_ascii_uppercase())
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.0.contains(&kind.to_ascii_uppercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for ComponentTypes {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut types = ComponentTypes::new();
        for kind in iter {
            types.insert(kind.as_ref());
        }
        types
    }
}

impl fmt::Display for ComponentTypes {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.iter().collect::<Vec<_>>().join(","))
    }
}

/// Calendar-level properties shared by every object of a calendar.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarMetadata {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default)]
    pub components: ComponentTypes,
}

impl CalendarMetadata {
    pub fn new(display_name: impl Into<String>) -> Self {
        CalendarMetadata {
            display_name: display_name.into(),
            color: None,
            components: ComponentTypes::new(),
        }
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    pub fn with_components<S: AsRef<str>>(mut self, kinds: impl IntoIterator<Item = S>) -> Self {
        self.components = kinds.into_iter().collect();
        self
    }
}

/// A calendar as listed by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDescriptor {
    pub id: CalendarId,
    pub principal: String,
    /// Unique per principal
    pub uri: String,
    pub metadata: CalendarMetadata,
}

impl fmt::Display for CalendarDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.principal, self.uri)
    }
}

/// One stored calendar object resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarObjectBlob {
    pub href: String,
    /// Raw calendar text, None when the store has no data for the resource
    pub data: Option<String>,
}

impl CalendarObjectBlob {
    pub fn new(href: impl Into<String>, data: impl Into<String>) -> Self {
        CalendarObjectBlob {
            href: href.into(),
            data: Some(data.into()),
        }
    }
}
