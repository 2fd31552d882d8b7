// src/runner.rs
//! One watch cycle: fetch every source, decide, notify, persist once.

use chrono::Utc;
use std::fmt;

use crate::change_detector::{detect, Detection};
use crate::gatekeeper::reconcile;
use crate::notify::{message, Notifier};
use crate::source::{MonitoredItem, SourceAdapter, SourceSnapshot};
use crate::state::{PersistedState, StateStore};

#[derive(Debug, Clone, Copy)]
pub struct RunOptions {
    /// Write the state file at the end of the run.
    pub persist: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self { persist: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Notified { count: usize },
    NothingNew,
    /// Zero watched rows found; the page layout may have changed.
    NoMatches,
    FirstObservation,
    Unchanged,
    Changed,
    FetchFailed(String),
    DeliveryFailed(String),
}

#[derive(Debug, Clone)]
pub struct SourceReport {
    pub source_id: String,
    pub outcome: SourceOutcome,
    pub open: Vec<MonitoredItem>,
    pub closed: Vec<MonitoredItem>,
}

impl SourceReport {
    fn bare(source_id: &str, outcome: SourceOutcome) -> Self {
        Self {
            source_id: source_id.to_string(),
            outcome,
            open: Vec::new(),
            closed: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistOutcome {
    Saved,
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub reports: Vec<SourceReport>,
    pub persisted: PersistOutcome,
}

impl RunSummary {
    pub fn report(&self, source_id: &str) -> Option<&SourceReport> {
        self.reports.iter().find(|r| r.source_id == source_id)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", "=".repeat(50))?;
        for r in &self.reports {
            writeln!(f, "[{}] {:?}", r.source_id, r.outcome)?;
            for it in r.open.iter().chain(r.closed.iter()) {
                writeln!(f, "  - {}: {}", it.key, it.observed_status)?;
            }
        }
        write!(f, "state: {:?}", self.persisted)
    }
}

/// Process every source in order, then save state once.
///
/// Precondition: no other run works on the same state file concurrently.
pub async fn run_once(
    sources: &[Box<dyn SourceAdapter>],
    notifier: &dyn Notifier,
    store: &StateStore,
    opts: RunOptions,
) -> RunSummary {
    let mut state = store.load();
    let mut reports = Vec::with_capacity(sources.len());

    for src in sources {
        let report = match src.fetch().await {
            Ok(snapshot) => process(src.as_ref(), snapshot, notifier, &mut state).await,
            Err(e) => {
                tracing::warn!(source = src.id(), error = %e, "fetch failed, skipping source");
                SourceReport::bare(src.id(), SourceOutcome::FetchFailed(e.to_string()))
            }
        };
        reports.push(report);
    }

    let persisted = if opts.persist {
        state.updated_at = Some(Utc::now());
        match store.save(&state) {
            Ok(()) => PersistOutcome::Saved,
            Err(e) => {
                tracing::error!(path = %store.path().display(), error = %e, "saving state failed");
                PersistOutcome::Failed(e.to_string())
            }
        }
    } else {
        PersistOutcome::Skipped
    };

    RunSummary { reports, persisted }
}

async fn process(
    src: &dyn SourceAdapter,
    snapshot: SourceSnapshot,
    notifier: &dyn Notifier,
    state: &mut PersistedState,
) -> SourceReport {
    tracing::debug!(source = snapshot.source_id(), "fetched");
    match snapshot {
        SourceSnapshot::Itemized { source_id, items } => {
            process_itemized(src, &source_id, &items, notifier, state).await
        }
        SourceSnapshot::Opaque {
            source_id,
            content_hash,
        } => process_opaque(src, &source_id, &content_hash, notifier, state).await,
    }
}

async fn process_itemized(
    src: &dyn SourceAdapter,
    source_id: &str,
    items: &[MonitoredItem],
    notifier: &dyn Notifier,
    state: &mut PersistedState,
) -> SourceReport {
    if items.is_empty() {
        tracing::warn!(
            source = source_id,
            "no watched items found; the page structure may have changed"
        );
        return SourceReport::bare(source_id, SourceOutcome::NoMatches);
    }

    let rec = reconcile(source_id, items, state.ledger_for(source_id));
    tracing::info!(
        source = source_id,
        open = rec.open.len(),
        closed = rec.closed.len(),
        new = rec.to_notify.len(),
        "reconciled"
    );

    let outcome = if !rec.needs_notification() {
        SourceOutcome::NothingNew
    } else {
        let msg = message::vacancies(source_id, src.location(), &rec.to_notify, Utc::now());
        match notifier.send(&msg.subject, &msg.body).await {
            Ok(()) => {
                let count = rec.to_notify.len();
                state.commit_ledger(source_id, rec.updated_ledger);
                SourceOutcome::Notified { count }
            }
            Err(e) => {
                tracing::error!(source = source_id, error = %e, "notification failed, ledger unchanged");
                SourceOutcome::DeliveryFailed(e.to_string())
            }
        }
    };

    SourceReport {
        source_id: source_id.to_string(),
        outcome,
        open: rec.open,
        closed: rec.closed,
    }
}

async fn process_opaque(
    src: &dyn SourceAdapter,
    source_id: &str,
    current: &str,
    notifier: &dyn Notifier,
    state: &mut PersistedState,
) -> SourceReport {
    let previous = state.fingerprint(source_id).map(str::to_string);
    let outcome = match detect(current, previous.as_deref()) {
        Detection::FirstObservation => {
            tracing::info!(source = source_id, hash = current, "first observation, fingerprint seeded");
            state.set_fingerprint(source_id, current);
            SourceOutcome::FirstObservation
        }
        Detection::Unchanged => {
            tracing::info!(source = source_id, "unchanged");
            SourceOutcome::Unchanged
        }
        Detection::Changed => {
            let prev = previous.as_deref().unwrap_or_default();
            let msg = message::page_changed(source_id, src.location(), prev, current, Utc::now());
            match notifier.send(&msg.subject, &msg.body).await {
                Ok(()) => {
                    state.set_fingerprint(source_id, current);
                    SourceOutcome::Changed
                }
                Err(e) => {
                    tracing::error!(source = source_id, error = %e, "notification failed, fingerprint kept");
                    SourceOutcome::DeliveryFailed(e.to_string())
                }
            }
        }
    };
    SourceReport::bare(source_id, outcome)
}
