//! Generic iCalendar validation.

use std::fmt;

use super::document::{Document, VCALENDAR, VTIMEZONE};

/// Something wrong with a document. Any problem makes a document unfit for import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    MalformedLine { line: usize, content: String },
    PropertyOutsideComponent { line: usize, property: String },
    UnexpectedEnd { line: usize, component: String },
    Unclosed { component: String },
    TrailingContent { line: usize },
    NestedCalendar { line: usize },
    NotACalendar { component: String },
    MissingProperty { component: String, property: String },
    DuplicateProperty { component: String, property: String },
    UnsupportedVersion(String),
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Problem::MalformedLine { line, content } => {
                write!(f, "line {}: malformed content line '{}'", line, content)
            }
            Problem::PropertyOutsideComponent { line, property } => {
                write!(f, "line {}: property {} outside of any component", line, property)
            }
            Problem::UnexpectedEnd { line, component } => {
                write!(f, "line {}: END:{} without matching BEGIN", line, component)
            }
            Problem::Unclosed { component } => write!(f, "missing END:{}", component),
            Problem::TrailingContent { line } => {
                write!(f, "line {}: content after the end of the calendar", line)
            }
            Problem::NestedCalendar { line } => write!(f, "line {}: nested VCALENDAR", line),
            Problem::NotACalendar { component } => {
                write!(f, "top-level component is {}, expected VCALENDAR", component)
            }
            Problem::MissingProperty {
                component,
                property,
            } => write!(f, "{} is missing {}", component, property),
            Problem::DuplicateProperty {
                component,
                property,
            } => write!(f, "{} has more than one {}", component, property),
            Problem::UnsupportedVersion(version) => {
                write!(f, "unsupported iCalendar version '{}'", version)
            }
        }
    }
}

impl Document {
    /// Check the document for structural and semantic problems.
    ///
    /// Structural problems are the ones the reader worked around while
    /// parsing. On top of those, the calendar must declare VERSION 2.0 and a
    /// PRODID, every VTIMEZONE must carry a TZID and every other top-level
    /// component exactly one UID.
    pub fn validate(&self) -> Vec<Problem> {
        let mut problems = self.problems.clone();
        let calendar = &self.calendar;

        if calendar.name != VCALENDAR {
            return problems;
        }

        match calendar.prop_value("VERSION").map(str::trim) {
            None => problems.push(missing(VCALENDAR, "VERSION")),
            Some("2.0") => {}
            Some(other) => problems.push(Problem::UnsupportedVersion(other.to_string())),
        }

        if calendar.find_prop("PRODID").is_none() {
            problems.push(missing(VCALENDAR, "PRODID"));
        }

        for component in &calendar.components {
            if component.name == VTIMEZONE {
                if component.find_prop("TZID").is_none() {
                    problems.push(missing(VTIMEZONE, "TZID"));
                }
                continue;
            }

            let uid_count = component
                .properties
                .iter()
                .filter(|p| p.key().eq_ignore_ascii_case("UID"))
                .count();
            match uid_count {
                0 => problems.push(missing(&component.name, "UID")),
                1 => {}
                _ => problems.push(Problem::DuplicateProperty {
                    component: component.name.clone(),
                    property: "UID".to_string(),
                }),
            }
        }

        problems
    }
}

fn missing(component: &str, property: &str) -> Problem {
    Problem::MissingProperty {
        component: component.to_string(),
        property: property.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ics::ParseMode;

    fn problems_of(ics: &str) -> Vec<Problem> {
        Document::parse(ics, ParseMode::Forgiving)
            .expect("Should parse")
            .validate()
    }

    #[test]
    fn test_valid_calendar_has_no_problems() {
        let ics = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Example//Test//EN\r\n\
BEGIN:VTIMEZONE\r\n\
TZID:Europe/Berlin\r\n\
END:VTIMEZONE\r\n\
BEGIN:VEVENT\r\n\
UID:1\r\n\
END:VEVENT\r\n\
BEGIN:VTODO\r\n\
UID:2\r\n\
END:VTODO\r\n\
END:VCALENDAR\r\n";
        assert_eq!(problems_of(ics), vec![]);
    }

    #[test]
    fn test_missing_end_vcalendar_is_reported() {
        let ics = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:x\r\nBEGIN:VEVENT\r\nUID:1\r\nEND:VEVENT\r\n";
        assert_eq!(
            problems_of(ics),
            vec![Problem::Unclosed {
                component: "VCALENDAR".to_string()
            }]
        );
    }

    #[test]
    fn test_missing_header_properties_and_uid() {
        let ics = "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nSUMMARY:No uid\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        let problems = problems_of(ics);
        assert!(problems.contains(&missing(VCALENDAR, "VERSION")));
        assert!(problems.contains(&missing(VCALENDAR, "PRODID")));
        assert!(problems.contains(&missing("VEVENT", "UID")));
    }

    #[test]
    fn test_wrong_version_and_duplicate_uid() {
        let ics = "BEGIN:VCALENDAR\r\nVERSION:1.0\r\nPRODID:x\r\nBEGIN:VEVENT\r\nUID:1\r\nUID:2\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n";
        let problems = problems_of(ics);
        assert!(problems.contains(&Problem::UnsupportedVersion("1.0".to_string())));
        assert!(problems.contains(&Problem::DuplicateProperty {
            component: "VEVENT".to_string(),
            property: "UID".to_string(),
        }));
    }

    #[test]
    fn test_malformed_lines_and_trailing_content() {
        let ics = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:x\r\nthis is not a content line\r\nEND:VCALENDAR\r\nBEGIN:VCALENDAR\r\n";
        let problems = problems_of(ics);
        assert!(
            problems
                .iter()
                .any(|p| matches!(p, Problem::MalformedLine { line: 4, .. })),
            "Got: {:?}",
            problems
        );
        assert!(problems.contains(&Problem::TrailingContent { line: 6 }));
    }

    #[test]
    fn test_non_calendar_root() {
        let ics = "BEGIN:VEVENT\r\nUID:1\r\nEND:VEVENT\r\n";
        assert_eq!(
            problems_of(ics),
            vec![Problem::NotACalendar {
                component: "VEVENT".to_string()
            }]
        );
    }
}
