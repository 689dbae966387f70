//! iCalendar documents and the merge/split codec.
//!
//! A calendar store keeps one calendar object resource per event, todo...
//! each wrapped in its own VCALENDAR. [`merge`] combines those into one
//! portable document carrying the calendar-level metadata, [`split`] does
//! the reverse on import.

mod document;
mod merge;
mod split;
mod validate;

pub use document::{Component, Document, ParseMode, Property, VCALENDAR, VTIMEZONE, text_property};
pub use merge::merge;
pub use split::{CalendarObject, SplitCalendar, split};
pub use validate::Problem;

/// Extension of every exported artifact and stored object.
pub const ICS_EXTENSION: &str = ".ics";

/// Vendor property carrying the calendar display name.
pub const NAME_PROPERTY: &str = "X-WR-CALNAME";

/// Vendor property carrying the calendar color.
pub const COLOR_PROPERTY: &str = "X-APPLE-CALENDAR-COLOR";
