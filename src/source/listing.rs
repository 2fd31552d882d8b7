// src/source/listing.rs
//! Itemized source: a page with one or more HTML tables where each watched
//! row carries its label in the first cell and its status in the third.

use async_trait::async_trait;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::HashSet;

use super::{contains_ci, http, normalize_ws, MonitoredItem, SourceAdapter, SourceSnapshot};
use crate::error::FetchError;

static ROW: Lazy<Selector> = Lazy::new(|| Selector::parse("table tr").unwrap());
static CELL: Lazy<Selector> = Lazy::new(|| Selector::parse("td").unwrap());

const LABEL_CELL: usize = 0;
const STATUS_CELL: usize = 2;

pub struct ListingPage {
    id: String,
    location: String,
    watch: Vec<String>,
    closed_sentinel: String,
    mode: Mode,
}

enum Mode {
    Fixture(String),
    Http { client: reqwest::Client },
}

impl ListingPage {
    pub fn from_url(
        id: &str,
        url: &str,
        watch: Vec<String>,
        closed_sentinel: &str,
        client: reqwest::Client,
    ) -> Self {
        Self {
            id: id.to_string(),
            location: url.to_string(),
            watch,
            closed_sentinel: closed_sentinel.to_string(),
            mode: Mode::Http { client },
        }
    }

    /// Serve a fixed HTML document instead of fetching; `location` is only
    /// used in rendered messages.
    pub fn from_fixture(
        id: &str,
        location: &str,
        html: &str,
        watch: Vec<String>,
        closed_sentinel: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            location: location.to_string(),
            watch,
            closed_sentinel: closed_sentinel.to_string(),
            mode: Mode::Fixture(html.to_string()),
        }
    }

    fn snapshot(&self, html: &str) -> SourceSnapshot {
        let items = extract_items(html, &self.watch, &self.closed_sentinel);
        for it in &items {
            tracing::info!(
                source = %self.id,
                key = %it.key,
                status = %it.observed_status,
                availability = ?it.availability,
                "found"
            );
        }
        SourceSnapshot::Itemized {
            source_id: self.id.clone(),
            items,
        }
    }
}

#[async_trait]
impl SourceAdapter for ListingPage {
    async fn fetch(&self) -> Result<SourceSnapshot, FetchError> {
        match &self.mode {
            Mode::Fixture(html) => Ok(self.snapshot(html)),
            Mode::Http { client } => {
                let body = http::get_text(client, &self.location).await?;
                Ok(self.snapshot(&body))
            }
        }
    }

    fn id(&self) -> &str {
        &self.id
    }

    fn location(&self) -> &str {
        &self.location
    }
}

/// Pull watched rows out of every table in `html`.
///
/// A row qualifies when it has at least three `td` cells and its label contains
/// one of the `watch` entries (case-insensitive). A label seen twice keeps its
/// first row. Returns an empty list when the markup no longer matches.
pub fn extract_items(html: &str, watch: &[String], closed_sentinel: &str) -> Vec<MonitoredItem> {
    let doc = Html::parse_document(html);
    let mut seen: HashSet<String> = HashSet::new();
    let mut out = Vec::new();

    for row in doc.select(&ROW) {
        let cells: Vec<String> = row
            .select(&CELL)
            .map(|c| normalize_ws(&c.text().collect::<String>()))
            .collect();
        if cells.len() <= STATUS_CELL {
            continue;
        }
        let label = &cells[LABEL_CELL];
        if !watch.iter().any(|w| contains_ci(label, w)) {
            continue;
        }
        if !seen.insert(label.clone()) {
            tracing::debug!(key = %label, "duplicate row ignored");
            continue;
        }
        out.push(MonitoredItem::classified(
            label.clone(),
            cells[STATUS_CELL].clone(),
            closed_sentinel,
        ));
    }
    out
}
