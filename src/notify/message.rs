// src/notify/message.rs
use chrono::{DateTime, Utc};
use std::fmt::Write as _;

use crate::source::MonitoredItem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub subject: String,
    pub body: String,
}

pub fn vacancies(source_id: &str, url: &str, items: &[MonitoredItem], now: DateTime<Utc>) -> Message {
    let subject = format!("Vacancies available: {source_id}");
    let mut body = String::from("New openings since the last notice:\n\n");
    for it in items {
        let _ = writeln!(body, "- {}: {}", it.key, it.observed_status);
    }
    let _ = write!(
        body,
        "\nCheck the listing at {url}\n\nChecked at {} (UTC)\n",
        now.format("%Y-%m-%d %H:%M")
    );
    Message { subject, body }
}

pub fn page_changed(
    source_id: &str,
    url: &str,
    previous: &str,
    current: &str,
    now: DateTime<Utc>,
) -> Message {
    Message {
        subject: format!("Page updated: {source_id}"),
        body: format!(
            "The page at {url} changed.\n\nFingerprint {} -> {}\n\nChecked at {} (UTC)\n",
            short(previous),
            short(current),
            now.format("%Y-%m-%d %H:%M")
        ),
    }
}

fn short(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}
