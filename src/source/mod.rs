// src/source/mod.rs
pub mod http;
pub mod listing;
pub mod notice;

use crate::config::watch::{SourceKind, WatchConfig};
use crate::error::FetchError;
use once_cell::sync::OnceCell;
use regex::Regex;

pub use listing::ListingPage;
pub use notice::NoticePage;

/// Whether a listing row can currently be applied for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Open,
    Closed,
}

/// A row is closed iff the sentinel appears in its status text (case-insensitive).
/// An empty sentinel never matches, so everything counts as open.
pub fn classify(status_text: &str, closed_sentinel: &str) -> Availability {
    let sentinel = closed_sentinel.trim();
    if !sentinel.is_empty() && contains_ci(status_text, sentinel) {
        Availability::Closed
    } else {
        Availability::Open
    }
}

pub(crate) fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitoredItem {
    /// Label as shown on the page, e.g. "3 Z-WHG (Nr. 12)".
    pub key: String,
    pub observed_status: String,
    pub availability: Availability,
}

impl MonitoredItem {
    pub fn classified(key: impl Into<String>, status: impl Into<String>, sentinel: &str) -> Self {
        let observed_status = status.into();
        let availability = classify(&observed_status, sentinel);
        Self {
            key: key.into(),
            observed_status,
            availability,
        }
    }

    pub fn is_open(&self) -> bool {
        self.availability == Availability::Open
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSnapshot {
    Itemized {
        source_id: String,
        items: Vec<MonitoredItem>,
    },
    Opaque {
        source_id: String,
        content_hash: String,
    },
}

impl SourceSnapshot {
    pub fn source_id(&self) -> &str {
        match self {
            SourceSnapshot::Itemized { source_id, .. } | SourceSnapshot::Opaque { source_id, .. } => {
                source_id
            }
        }
    }
}

#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch(&self) -> Result<SourceSnapshot, FetchError>;
    fn id(&self) -> &str;
    /// Where the operator can look at the page themselves.
    fn location(&self) -> &str;
}

/// Collapse runs of Unicode whitespace (NBSP included) into single spaces and trim.
pub fn normalize_ws(s: &str) -> String {
    static RE_WS: OnceCell<Regex> = OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| Regex::new(r"\s+").unwrap());
    re_ws.replace_all(s, " ").trim().to_string()
}

/// Build one HTTP-backed adapter per configured source, in config order.
pub fn build_sources(cfg: &WatchConfig) -> Vec<Box<dyn SourceAdapter>> {
    let client = reqwest::Client::new();
    cfg.sources
        .iter()
        .map(|s| -> Box<dyn SourceAdapter> {
            match s.kind {
                SourceKind::Itemized => Box::new(ListingPage::from_url(
                    &s.id,
                    &s.url,
                    s.watch.clone(),
                    &s.closed_sentinel,
                    client.clone(),
                )),
                SourceKind::Opaque => Box::new(NoticePage::from_url(&s.id, &s.url, client.clone())),
            }
        })
        .collect()
}
