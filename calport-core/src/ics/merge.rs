//! Merge stored calendar objects into one calendar document.

use tracing::{debug, warn};

use super::document::{
    Component, Document, ParseMode, Property, VCALENDAR, VTIMEZONE, text_property,
};
use super::{COLOR_PROPERTY, NAME_PROPERTY};
use crate::calendar::{CalendarMetadata, CalendarObjectBlob};

/// Build one VCALENDAR holding the calendar metadata and the inner
/// components of every blob, in the order the blobs are given.
///
/// The per-object envelopes are dropped. Timezones are de-duplicated by TZID
/// and placed before the other components. Blobs without data or that fail
/// to parse are skipped.
pub fn merge(metadata: &CalendarMetadata, blobs: &[CalendarObjectBlob], product_id: &str) -> Document {
    let mut calendar = Component::new(VCALENDAR);
    calendar.push_property(Property::new("VERSION", "2.0"));
    calendar.push_property(Property::new("PRODID", product_id));
    calendar.push_property(text_property(NAME_PROPERTY, &metadata.display_name));
    if let Some(color) = metadata.color.as_deref().filter(|c| !c.is_empty()) {
        calendar.push_property(Property::new(COLOR_PROPERTY, color));
    }

    let mut timezones: Vec<Component> = Vec::new();
    let mut objects: Vec<Component> = Vec::new();

    for blob in blobs {
        let Some(ref data) = blob.data else {
            debug!(href = %blob.href, "No calendar data, skipping");
            continue;
        };

        let document = match Document::parse(data, ParseMode::Strict) {
            Ok(document) => document,
            Err(e) => {
                warn!(href = %blob.href, error = %e, "Skipping malformed calendar object");
                continue;
            }
        };

        for component in document.calendar.components {
            if component.name != VTIMEZONE {
                objects.push(component);
                continue;
            }

            let known = component.prop_value("TZID").is_some_and(|tzid| {
                timezones
                    .iter()
                    .any(|tz| tz.prop_value("TZID") == Some(tzid))
            });
            if !known {
                timezones.push(component);
            }
        }
    }

    calendar.components = timezones;
    calendar.components.extend(objects);

    Document::new(calendar)
}
