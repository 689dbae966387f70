use anyhow::Result;
use calport_core::{CalendarStore, LocalStore};
use owo_colors::OwoColorize;

use crate::render::Render;

pub fn run(store: &LocalStore, user: &str) -> Result<()> {
    let calendars = store.list_calendars(user)?;

    if calendars.is_empty() {
        println!("No calendars found for '{}' in {}", user, store.root().display());
        return Ok(());
    }

    for calendar in &calendars {
        match store.calendar_metadata(&calendar.id) {
            Ok(metadata) => println!("{}  {}", calendar.uri.bold(), metadata.render()),
            Err(e) => println!("{}  {}", calendar.uri.bold(), e.to_string().red()),
        }
    }

    Ok(())
}
