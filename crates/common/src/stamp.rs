//! Date and file-name stamps.
//!
//! A print carries the date it was taken, formatted once at capture time,
//! and is exported under a name derived from the export instant.

use chrono::{DateTime, Datelike, TimeZone, Utc};

/// Format the date printed under the caption: `YYYY.MM.DD`.
pub fn print_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String {
    format!("{:04}.{:02}.{:02}", at.year(), at.month(), at.day())
}

/// Print date for the current local day.
pub fn today() -> String {
    print_date(&chrono::Local::now())
}

/// File name for an exported print: `polaroid-<unix millis>.png`.
pub fn export_file_name(at: &DateTime<Utc>) -> String {
    format!("polaroid-{}.png", at.timestamp_millis())
}
