// src/gatekeeper.rs
//! Decides which open items still need a notification.
//!
//! `reconcile` does NOT touch persisted state. The returned ledger is meant to
//! be committed with [`PersistedState::commit_ledger`](crate::state::PersistedState::commit_ledger)
//! only after a successful send, so a failed delivery is retried next run.
//! Entries are never cleared: an item that closes and reopens stays notified.

use std::collections::HashSet;

use crate::source::MonitoredItem;
use crate::state::DedupLedger;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciliation {
    pub source_id: String,
    /// Open and not yet notified, in page order.
    pub to_notify: Vec<MonitoredItem>,
    /// Every open item, including already notified ones.
    pub open: Vec<MonitoredItem>,
    /// Reported for visibility only.
    pub closed: Vec<MonitoredItem>,
    pub updated_ledger: DedupLedger,
}

impl Reconciliation {
    pub fn needs_notification(&self) -> bool {
        !self.to_notify.is_empty()
    }
}

pub fn reconcile(
    source_id: &str,
    items: &[MonitoredItem],
    ledger: Option<&DedupLedger>,
) -> Reconciliation {
    let mut updated_ledger = ledger.cloned().unwrap_or_default();
    let mut open = Vec::new();
    let mut closed = Vec::new();
    let mut to_notify = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for it in items {
        if !seen.insert(it.key.as_str()) {
            continue;
        }
        if !it.is_open() {
            closed.push(it.clone());
            continue;
        }
        open.push(it.clone());
        let already = ledger
            .and_then(|l| l.get(&it.key))
            .copied()
            .unwrap_or(false);
        if already {
            tracing::debug!(source = source_id, key = %it.key, "already notified");
            continue;
        }
        to_notify.push(it.clone());
        updated_ledger.insert(it.key.clone(), true);
    }

    Reconciliation {
        source_id: source_id.to_string(),
        to_notify,
        open,
        closed,
        updated_ledger,
    }
}
