//! Export and import scenarios run against both stores.

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::NaiveDate;

use calport_core::calendar::{CalendarMetadata, CalendarObjectBlob};
use calport_core::ics::{self, Component, Document, ParseMode};
use calport_core::store::FailurePlan;
use calport_core::{
    CalendarDescriptor, CalendarId, CalendarStore, Exporter, Importer, LocalStore, MemoryStore,
    MigrationError, MigratorConfig, StoreError, StoreResult,
};

fn may_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

fn event(uid: &str, summary: &str) -> String {
    format!(
        "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:-//Store//EN\r\n\
BEGIN:VEVENT\r\n\
UID:{uid}\r\n\
DTSTAMP:20240401T080000Z\r\n\
DTSTART:20240501T090000Z\r\n\
SUMMARY:{summary}\r\n\
END:VEVENT\r\n\
END:VCALENDAR\r\n"
    )
}

/// alice owns `Work Stuff!` holding two events
fn seed_work(store: &dyn CalendarStore) {
    let metadata = CalendarMetadata::new("Work Stuff!")
        .with_color("#ff8800")
        .with_components(["VEVENT"]);
    let id = store.create_calendar("alice", "work-stuff", &metadata).unwrap();
    store.create_object(&id, "standup.ics", &event("standup", "Standup")).unwrap();
    store.create_object(&id, "retro.ics", &event("retro", "Retro")).unwrap();
}

#[test]
fn export_scenario() {
    let store = MemoryStore::new();
    seed_work(&store);
    let config = MigratorConfig::default();

    let artifacts = Exporter::new(&store, &config)
        .export_user("alice", may_first())
        .unwrap();

    assert_eq!(artifacts.len(), 1);
    assert_eq!(artifacts[0].name, "Work Stuff-2024-05-01.ics");

    let text = String::from_utf8(artifacts[0].data.clone()).unwrap();
    let document = Document::parse(&text, ParseMode::Strict).unwrap();
    let split = ics::split(&document, &config.product_id);

    assert_eq!(split.display_name, "Work Stuff!");
    let uids: Vec<_> = split.base_components().filter_map(|c| c.uid()).collect();
    assert_eq!(uids, vec!["standup", "retro"]);
    assert!(split.base_components().all(|c| c.name == "VEVENT"));
}

#[test]
fn import_collision_scenario() {
    let store = MemoryStore::new();
    store.add_calendar("alice", "work-stuff", CalendarMetadata::new("Work Stuff!"));
    let config = MigratorConfig::default();

    let summary = Importer::new(&store, &config)
        .import_bytes("alice", "work-stuff-2024-05-01.ics", event("a", "A").as_bytes())
        .unwrap();

    assert_eq!(summary.uri, "work-stuff-1");
    assert_eq!(store.calendar_count("alice"), 2);
}

#[test]
fn invalid_import_scenario() {
    let store = MemoryStore::new();
    let config = MigratorConfig::default();
    let truncated = event("a", "A").replace("END:VCALENDAR\r\n", "");

    let err = Importer::new(&store, &config)
        .import_bytes("alice", "work-2024-05-01.ics", truncated.as_bytes())
        .unwrap_err();

    assert!(
        matches!(err, MigrationError::InvalidData { ref file, .. } if file == "work-2024-05-01.ics"),
        "Got: {:?}",
        err
    );
    assert_eq!(store.calendar_count("alice"), 0);
}

#[test]
fn import_is_all_or_nothing() {
    let store = MemoryStore::with_failures(FailurePlan::new().fail_object_creation(2));
    let config = MigratorConfig::default();
    let source = MemoryStore::new();
    let id = source.add_calendar("bob", "three", CalendarMetadata::new("Three"));
    for uid in ["one", "two", "three"] {
        source
            .add_object(&id, CalendarObjectBlob::new(format!("{uid}.ics"), event(uid, uid)))
            .unwrap();
    }
    let artifact = Exporter::new(&source, &config)
        .export_user("bob", may_first())
        .unwrap()
        .remove(0);

    let err = Importer::new(&store, &config)
        .import_bytes("alice", &artifact.name, &artifact.data)
        .unwrap_err();

    assert!(matches!(err, MigrationError::InvalidObject { .. }), "Got: {:?}", err);
    assert_eq!(store.calendar_count("alice"), 0);
    assert_eq!(store.object_count(), 0);
}

#[test]
fn export_omits_non_calendars_but_aborts_on_other_failures() {
    let config = MigratorConfig::default();

    let store = MemoryStore::with_failures(FailurePlan::new().not_a_calendar("deleted"));
    store.add_calendar("alice", "deleted", CalendarMetadata::new("Deleted"));
    seed_work(&store);
    let artifacts = Exporter::new(&store, &config)
        .export_user("alice", may_first())
        .unwrap();
    assert_eq!(artifacts.len(), 1);

    let store = MemoryStore::with_failures(FailurePlan::new().broken_metadata("work-stuff"));
    seed_work(&store);
    let err = Exporter::new(&store, &config)
        .export_user("alice", may_first())
        .unwrap_err();
    assert!(err.is_fatal());
    assert!(err.to_string().contains("work-stuff"), "Got: {}", err);
}

#[test]
fn merge_then_split_preserves_metadata_and_components() {
    let metadata = CalendarMetadata::new("Family; Friends, & more")
        .with_color("#00ff00")
        .with_components(["VEVENT", "VTODO"]);
    let todo = "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Store//EN\r\nBEGIN:VTODO\r\nUID:todo\r\nSUMMARY:Buy milk\\, eggs\r\nEND:VTODO\r\nEND:VCALENDAR\r\n";
    let blobs = vec![
        CalendarObjectBlob::new("a.ics", event("a", "Dinner with \u{e9}mile, a summary long enough to be folded over more than one content line")),
        CalendarObjectBlob::new("b.ics", todo),
    ];

    let merged = ics::merge(&metadata, &blobs, "-//calport//test//EN");
    let reparsed = Document::parse(&merged.to_ics(), ParseMode::Strict).unwrap();
    let split = ics::split(&reparsed, "-//calport//test//EN");

    assert_eq!(split.display_name, metadata.display_name);
    assert_eq!(Some(split.color.clone()), metadata.color);
    assert_eq!(split.component_types, metadata.components);

    let originals: Vec<_> = blobs
        .iter()
        .flat_map(|b| {
            Document::parse(b.data.as_deref().unwrap(), ParseMode::Strict)
                .unwrap()
                .calendar
                .components
        })
        .collect();
    let restored: Vec<_> = split.base_components().cloned().collect();
    assert_eq!(restored, originals);
}

fn calendar(body: &str) -> String {
    format!("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//Store//EN\r\n{body}END:VCALENDAR\r\n")
}

const BERLIN: &str = "BEGIN:VTIMEZONE\r\n\
TZID:Europe/Berlin\r\n\
BEGIN:STANDARD\r\n\
DTSTART:19701025T030000\r\n\
TZOFFSETFROM:+0200\r\n\
TZOFFSETTO:+0100\r\n\
END:STANDARD\r\n\
END:VTIMEZONE\r\n";

fn zoned_event(uid: &str) -> String {
    calendar(&format!(
        "{BERLIN}BEGIN:VEVENT\r\nUID:{uid}\r\nDTSTART;TZID=Europe/Berlin:20240501T100000\r\nEND:VEVENT\r\n"
    ))
}

struct RoundTrip {
    name: &'static str,
    blobs: Vec<String>,
    objects: usize,
    timezones: usize,
}

#[test]
fn merge_then_split_round_trips_components() {
    let cases = vec![
        RoundTrip {
            name: "shared timezone",
            blobs: vec![zoned_event("a"), zoned_event("b")],
            objects: 2,
            timezones: 1,
        },
        RoundTrip {
            name: "recurrence override",
            blobs: vec![calendar(
                "BEGIN:VEVENT\r\nUID:weekly\r\nDTSTART:20240501T100000Z\r\nRRULE:FREQ=WEEKLY\r\nEND:VEVENT\r\n\
BEGIN:VEVENT\r\nUID:weekly\r\nRECURRENCE-ID:20240508T100000Z\r\nDTSTART:20240508T120000Z\r\nEND:VEVENT\r\n",
            )],
            objects: 1,
            timezones: 0,
        },
        RoundTrip {
            name: "components without uid",
            blobs: vec![
                calendar("BEGIN:VJOURNAL\r\nSUMMARY:First\r\nEND:VJOURNAL\r\n"),
                calendar("BEGIN:VJOURNAL\r\nSUMMARY:Second\r\nEND:VJOURNAL\r\n"),
            ],
            objects: 2,
            timezones: 0,
        },
        RoundTrip {
            name: "quoted and comma params",
            blobs: vec![calendar(
                "BEGIN:VEVENT\r\n\
UID:meeting\r\n\
ATTENDEE;CN=\"Doe, Jane\";X-ROLES=a,b;DELEGATED-FROM=\"mailto:boss@example.com\":mailto:jane@example.com\r\n\
DESCRIPTION:Bring notes\\; slides\\, and\\nthe \\\\ key\r\n\
END:VEVENT\r\n",
            )],
            objects: 1,
            timezones: 0,
        },
    ];

    for case in cases {
        let blobs: Vec<_> = case
            .blobs
            .iter()
            .enumerate()
            .map(|(i, data)| CalendarObjectBlob::new(format!("{i}.ics"), data.as_str()))
            .collect();

        let merged = ics::merge(&CalendarMetadata::new("Round trip"), &blobs, "-//calport//test//EN");
        let text = merged.to_ics();
        assert_eq!(
            text.matches("BEGIN:VTIMEZONE").count(),
            case.timezones,
            "{}: timezones in\n{}",
            case.name,
            text
        );

        let reparsed = Document::parse(&text, ParseMode::Strict)
            .unwrap_or_else(|e| panic!("{}: {}", case.name, e));
        let split = ics::split(&reparsed, "-//calport//test//EN");
        assert_eq!(split.objects.len(), case.objects, "{}", case.name);

        let originals: Vec<Component> = case
            .blobs
            .iter()
            .flat_map(|data| Document::parse(data, ParseMode::Strict).unwrap().calendar.components)
            .filter(|c| c.name != "VTIMEZONE")
            .collect();
        let restored: Vec<Component> = split.base_components().cloned().collect();
        assert_eq!(restored, originals, "{}", case.name);

        for object in &split.objects {
            let stored = Document::parse(&object.data, ParseMode::Strict)
                .unwrap_or_else(|e| panic!("{}: {}\n{}", case.name, e, object.data));
            let timezones = stored.components().iter().filter(|c| c.name == "VTIMEZONE").count();
            assert!(timezones <= 1, "{}: {}", case.name, object.data);
            assert_eq!(&stored.components()[timezones..], object.components.as_slice(), "{}", case.name);
        }
    }
}

/// A [`LocalStore`] that turns down the second object it is asked to store.
struct RejectSecondObject {
    inner: LocalStore,
    created: AtomicUsize,
}

impl CalendarStore for RejectSecondObject {
    fn list_calendars(&self, principal: &str) -> StoreResult<Vec<CalendarDescriptor>> {
        self.inner.list_calendars(principal)
    }

    fn calendar_metadata(&self, id: &CalendarId) -> StoreResult<CalendarMetadata> {
        self.inner.calendar_metadata(id)
    }

    fn list_objects(&self, id: &CalendarId) -> StoreResult<Vec<CalendarObjectBlob>> {
        self.inner.list_objects(id)
    }

    fn create_calendar(
        &self,
        principal: &str,
        uri: &str,
        metadata: &CalendarMetadata,
    ) -> StoreResult<CalendarId> {
        self.inner.create_calendar(principal, uri, metadata)
    }

    fn create_object(&self, id: &CalendarId, name: &str, text: &str) -> StoreResult<()> {
        if self.created.fetch_add(1, Ordering::SeqCst) == 1 {
            return Err(StoreError::InvalidObject {
                name: name.to_string(),
                reason: "rejected".to_string(),
            });
        }
        self.inner.create_object(id, name, text)
    }

    fn delete_calendar(&self, id: &CalendarId, cascade: bool) -> StoreResult<()> {
        self.inner.delete_calendar(id, cascade)
    }
}

#[test]
fn local_store_import_rolls_back_on_rejected_object() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("store");
    let store = RejectSecondObject {
        inner: LocalStore::new(&root),
        created: AtomicUsize::new(0),
    };
    let config = MigratorConfig::default();
    store
        .inner
        .create_calendar("alice", "home", &CalendarMetadata::new("Home"))
        .unwrap();

    let source = MemoryStore::new();
    let id = source.add_calendar("bob", "three", CalendarMetadata::new("Three"));
    for uid in ["one", "two", "three"] {
        source
            .add_object(&id, CalendarObjectBlob::new(format!("{uid}.ics"), event(uid, uid)))
            .unwrap();
    }
    let artifact = Exporter::new(&source, &config)
        .export_user("bob", may_first())
        .unwrap()
        .remove(0);

    let err = Importer::new(&store, &config)
        .import_bytes("alice", &artifact.name, &artifact.data)
        .unwrap_err();

    assert!(matches!(err, MigrationError::InvalidObject { .. }), "Got: {:?}", err);
    assert!(!root.join("alice/Three").exists());
    let uris: Vec<_> = store
        .list_calendars("alice")
        .unwrap()
        .into_iter()
        .map(|c| c.uri)
        .collect();
    assert_eq!(uris, vec!["home"]);
}

#[test]
fn local_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path().join("store"));
    let config = MigratorConfig::default();
    seed_work(&store);

    let artifacts = Exporter::new(&store, &config)
        .export_user("alice", may_first())
        .unwrap();
    let path = artifacts[0].write_to(&dir.path().join("out")).unwrap();

    let summary = Importer::new(&store, &config)
        .import_path("alice", &path)
        .unwrap();

    assert_eq!(summary.uri, "Work Stuff");
    assert_eq!(summary.display_name, "Work Stuff!");
    assert_eq!(summary.objects, 2);

    let imported = store.calendar_metadata(&summary.calendar_id).unwrap();
    assert_eq!(imported.color.as_deref(), Some("#ff8800"));
    assert_eq!(imported.components.iter().collect::<Vec<_>>(), vec!["VEVENT"]);

    let mut summaries: Vec<_> = store
        .list_objects(&summary.calendar_id)
        .unwrap()
        .into_iter()
        .map(|blob| {
            let document = Document::parse(&blob.data.unwrap(), ParseMode::Strict).unwrap();
            document.components()[0].prop_value("SUMMARY").unwrap().to_string()
        })
        .collect();
    summaries.sort();
    assert_eq!(summaries, vec!["Retro", "Standup"]);

    // Importing the same file again never replaces the first import
    let again = Importer::new(&store, &config)
        .import_path("alice", &path)
        .unwrap();
    assert_eq!(again.uri, "Work Stuff-1");
    assert_eq!(store.list_calendars("alice").unwrap().len(), 3);
}
