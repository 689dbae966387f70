//! Owned iCalendar document model on top of the `icalendar` parser.
//!
//! Parsing and serialization go through `icalendar`. The reader adds a line
//! scan in front of it that records structural problems and, when forgiving,
//! repairs them so the parser still gets a well-formed component tree.

use std::fmt;

use icalendar::parser::{self, read_components, unfold};

use super::validate::Problem;
use crate::error::IcsError;

pub use icalendar::Property;

pub const VCALENDAR: &str = "VCALENDAR";
pub const VTIMEZONE: &str = "VTIMEZONE";

/// How much non-conformance the reader tolerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Skip blank lines and a leading byte order mark, keep structural
    /// problems for [`Document::validate`] instead of failing.
    Forgiving,
    /// Fail on any structural problem and require the text to be accepted
    /// by the `icalendar` parser.
    Strict,
}

/// A TEXT property with line breaks normalized to LF.
///
/// `icalendar` escapes LF as `\n` but writes CR verbatim, which would put a
/// bare CR inside a content line. CRLF and lone CR become LF here, so a value
/// containing `"a\r\nb"` reads back as `"a\nb"`.
pub fn text_property(name: &str, value: &str) -> Property {
    Property::new(name, value.replace("\r\n", "\n").replace('\r', "\n"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    pub properties: Vec<Property>,
    pub components: Vec<Component>,
}

impl Component {
    pub fn new(name: impl Into<String>) -> Self {
        Component {
            name: name.into(),
            properties: Vec::new(),
            components: Vec::new(),
        }
    }

    /// First property with the given name (names are case-insensitive)
    pub fn find_prop(&self, name: &str) -> Option<&Property> {
        self.properties
            .iter()
            .find(|p| p.key().eq_ignore_ascii_case(name))
    }

    /// Value of the named property, unescaped if it is TEXT
    pub fn prop_value(&self, name: &str) -> Option<&str> {
        self.find_prop(name).map(Property::value)
    }

    pub fn uid(&self) -> Option<&str> {
        self.prop_value("UID")
    }

    pub fn push_property(&mut self, property: Property) {
        self.properties.push(property);
    }

    pub fn push(&mut self, component: Component) {
        self.components.push(component);
    }

    /// TZIDs referenced by parameters anywhere in this component, in first-seen order.
    pub fn referenced_tzids(&self) -> Vec<String> {
        let mut tzids = Vec::new();
        self.collect_tzids(&mut tzids);
        tzids
    }

    fn collect_tzids(&self, tzids: &mut Vec<String>) {
        for property in &self.properties {
            let tzid = property
                .params()
                .values()
                .find(|p| p.key().eq_ignore_ascii_case("TZID"))
                .map(|p| p.value());
            if let Some(tzid) = tzid {
                if !tzids.iter().any(|t| t == tzid) {
                    tzids.push(tzid.to_string());
                }
            }
        }
        for child in &self.components {
            child.collect_tzids(tzids);
        }
    }

    pub fn to_ics(&self) -> String {
        self.to_string()
    }
}

impl From<parser::Component<'_>> for Component {
    fn from(parsed: parser::Component<'_>) -> Self {
        Component {
            name: parsed.name.as_str().to_ascii_uppercase(),
            properties: parsed.properties.into_iter().map(Property::from).collect(),
            components: parsed.components.into_iter().map(Component::from).collect(),
        }
    }
}

/// Serializes with CRLF line endings, folded at 75 octets. Property lines
/// come from `icalendar`, which escapes TEXT values and quotes parameter
/// values containing `:` or `;`.
impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BEGIN:{}\r\n", self.name)?;
        for property in &self.properties {
            let line: String = property.clone().try_into()?;
            f.write_str(&line)?;
        }
        for child in &self.components {
            write!(f, "{}", child)?;
        }
        write!(f, "END:{}\r\n", self.name)
    }
}

/// A parsed iCalendar document: one top-level component plus whatever
/// structural problems the reader had to work around.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub calendar: Component,
    pub(super) problems: Vec<Problem>,
}

impl Document {
    pub fn new(calendar: Component) -> Self {
        Document {
            calendar,
            problems: Vec::new(),
        }
    }

    pub fn parse(text: &str, mode: ParseMode) -> Result<Self, IcsError> {
        let body = match text.strip_prefix('\u{feff}') {
            Some(_) if mode == ParseMode::Strict => {
                return Err(IcsError::Malformed("unexpected byte order mark".to_string()));
            }
            Some(stripped) => stripped,
            None => text,
        };

        let Scan { text, problems } = scan(body)?;
        if mode == ParseMode::Strict {
            if let Some(problem) = problems.first() {
                return Err(IcsError::Malformed(problem.to_string()));
            }
        }

        let unfolded = unfold(&text);
        let calendar = read_components(&unfolded)
            .map_err(IcsError::Parse)?
            .into_iter()
            .next()
            .map(Component::from)
            .ok_or_else(|| IcsError::Parse("no BEGIN line found".to_string()))?;

        Ok(Document { calendar, problems })
    }

    /// Direct children of the top-level component
    pub fn components(&self) -> &[Component] {
        &self.calendar.components
    }

    pub fn to_ics(&self) -> String {
        self.calendar.to_ics()
    }
}

/// Structurally balanced CRLF text and the problems found on the way.
struct Scan {
    text: String,
    problems: Vec<Problem>,
}

/// Check BEGIN/END balance line by line.
///
/// Malformed lines, stray properties and ENDs, and anything after the root
/// component are dropped. Missing END lines are added. Line numbers are
/// 1-based physical lines.
fn scan(body: &str) -> Result<Scan, IcsError> {
    let mut problems = Vec::new();
    let mut out = String::with_capacity(body.len());
    let mut stack: Vec<String> = Vec::new();
    let mut root: Option<String> = None;

    for (number, physical) in content_lines(body) {
        let line = unfold(&physical.join("\r\n"));

        let Some(name) = content_line_name(&line) else {
            problems.push(Problem::MalformedLine { line: number, content: line });
            continue;
        };

        if root.is_some() && stack.is_empty() {
            problems.push(Problem::TrailingContent { line: number });
            break;
        }

        let value = line[name.len() + 1..].trim().to_ascii_uppercase();
        if name.eq_ignore_ascii_case("BEGIN") {
            if value == VCALENDAR && !stack.is_empty() {
                problems.push(Problem::NestedCalendar { line: number });
            }
            root.get_or_insert_with(|| value.clone());
            out.push_str(&format!("BEGIN:{}\r\n", value));
            stack.push(value);
        } else if name.eq_ignore_ascii_case("END") {
            let Some(position) = stack.iter().rposition(|c| *c == value) else {
                problems.push(Problem::UnexpectedEnd { line: number, component: value });
                continue;
            };
            while stack.len() > position {
                if let Some(closed) = stack.pop() {
                    if stack.len() > position {
                        problems.push(Problem::Unclosed { component: closed.clone() });
                    }
                    out.push_str(&format!("END:{}\r\n", closed));
                }
            }
        } else if stack.is_empty() {
            problems.push(Problem::PropertyOutsideComponent {
                line: number,
                property: name.to_ascii_uppercase(),
            });
        } else {
            for piece in &physical {
                out.push_str(piece);
                out.push_str("\r\n");
            }
        }
    }

    while let Some(unclosed) = stack.pop() {
        out.push_str(&format!("END:{}\r\n", unclosed));
        problems.push(Problem::Unclosed { component: unclosed });
    }

    let root = root.ok_or_else(|| IcsError::Parse("no BEGIN line found".to_string()))?;
    if root != VCALENDAR {
        problems.push(Problem::NotACalendar { component: root });
    }

    Ok(Scan { text: out, problems })
}

/// Non-blank physical lines grouped with their folded continuations, each
/// group numbered by the line it starts on.
fn content_lines(body: &str) -> Vec<(usize, Vec<&str>)> {
    let mut lines: Vec<(usize, Vec<&str>)> = Vec::new();

    for (index, raw) in body.split('\n').enumerate() {
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if raw.is_empty() {
            continue;
        }
        let continues = raw.starts_with([' ', '\t']);
        match lines.last_mut() {
            Some((_, pieces)) if continues => pieces.push(raw),
            _ => lines.push((index + 1, vec![raw])),
        }
    }

    lines
}

/// The name of `NAME;PARAM=VALUE:value`, or None if the line has no valid
/// name or no `:` separating the value.
fn content_line_name(line: &str) -> Option<&str> {
    let end = line.find([';', ':'])?;
    let name = &line[..end];
    let valid = !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    (valid && line[end..].contains(':')).then_some(name)
}
