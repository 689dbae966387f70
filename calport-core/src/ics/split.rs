//! Split a calendar document back into storable calendar objects.

use super::document::{Component, Document, Property, VTIMEZONE};
use super::{COLOR_PROPERTY, NAME_PROPERTY};
use crate::calendar::ComponentTypes;

/// One calendar object resource reconstructed from a document.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarObject {
    pub uid: Option<String>,
    /// The base component followed by its recurrence overrides, if any
    pub components: Vec<Component>,
    /// Standalone VCALENDAR text, ready to be stored
    pub data: String,
}

/// The calendar-level metadata and the objects of a split document.
#[derive(Debug, Clone, PartialEq)]
pub struct SplitCalendar {
    pub display_name: String,
    pub color: String,
    pub component_types: ComponentTypes,
    pub objects: Vec<CalendarObject>,
}

impl SplitCalendar {
    /// Every non-timezone component of the document, in document order
    pub fn base_components(&self) -> impl Iterator<Item = &Component> {
        self.objects.iter().flat_map(|o| o.components.iter())
    }
}

/// Decompose a document into its metadata and calendar objects.
///
/// Components sharing a UID (a recurring event and its overrides) end up in
/// the same object. Every object is wrapped in its own envelope carrying the
/// timezones it references. `product_id` is used when the document has none.
pub fn split(document: &Document, product_id: &str) -> SplitCalendar {
    let calendar = &document.calendar;

    let display_name = calendar
        .prop_value(NAME_PROPERTY)
        .map(str::to_string)
        .unwrap_or_default();
    let color = calendar
        .prop_value(COLOR_PROPERTY)
        .map(|c| c.trim().to_string())
        .unwrap_or_default();
    let version = calendar.prop_value("VERSION").unwrap_or("2.0");
    let product_id = calendar.prop_value("PRODID").unwrap_or(product_id);

    let timezones: Vec<&Component> = calendar
        .components
        .iter()
        .filter(|c| c.name == VTIMEZONE)
        .collect();

    let mut component_types = ComponentTypes::new();
    let mut groups: Vec<(Option<String>, Vec<Component>)> = Vec::new();

    for component in calendar.components.iter().filter(|c| c.name != VTIMEZONE) {
        component_types.insert(&component.name);

        let uid = component.uid().map(str::to_string);
        let position = uid
            .as_deref()
            .and_then(|uid| groups.iter().position(|(u, _)| u.as_deref() == Some(uid)));

        match position {
            Some(i) => groups[i].1.push(component.clone()),
            None => groups.push((uid, vec![component.clone()])),
        }
    }

    let objects = groups
        .into_iter()
        .map(|(uid, components)| {
            let mut envelope = Component::new(calendar.name.clone());
            envelope.push_property(Property::new("VERSION", version));
            envelope.push_property(Property::new("PRODID", product_id));

            let mut tzids: Vec<String> = Vec::new();
            for tzid in components.iter().flat_map(Component::referenced_tzids) {
                if !tzids.contains(&tzid) {
                    tzids.push(tzid);
                }
            }
            for timezone in &timezones {
                let referenced = timezone
                    .prop_value("TZID")
                    .is_some_and(|id| tzids.iter().any(|t| t == id));
                if referenced {
                    envelope.push((*timezone).clone());
                }
            }

            envelope.components.extend(components.iter().cloned());

            CalendarObject {
                uid,
                data: envelope.to_ics(),
                components,
            }
        })
        .collect();

    SplitCalendar {
        display_name,
        color,
        component_types,
        objects,
    }
}
