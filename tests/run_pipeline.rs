// tests/run_pipeline.rs
use async_trait::async_trait;
use vacancy_watch::error::FetchError;
use vacancy_watch::runner::{PersistOutcome, SourceOutcome};
use vacancy_watch::source::{ListingPage, NoticePage, SourceAdapter, SourceSnapshot};
use vacancy_watch::{run_once, MemoryNotifier, RunOptions, StateStore};

const ANGEBOT: &str = include_str!("fixtures/angebot.html");

fn listing(html: &str) -> Box<dyn SourceAdapter> {
    let watch = vec!["3 Z-WHG".to_string(), "4 Z-WHG".to_string(), "5 Z-REFH".to_string()];
    Box::new(ListingPage::from_fixture(
        "wg-ill",
        "https://example.org/angebot",
        html,
        watch,
        "geschlossen",
    ))
}

fn notice(body: &str) -> Box<dyn SourceAdapter> {
    Box::new(NoticePage::from_fixture("soca", "https://example.org/aktuell", body))
}

struct DownSource;

#[async_trait]
impl SourceAdapter for DownSource {
    async fn fetch(&self) -> Result<SourceSnapshot, FetchError> {
        Err(FetchError::Status {
            url: "https://example.org/down".into(),
            status: 503,
        })
    }
    fn id(&self) -> &str {
        "down"
    }
    fn location(&self) -> &str {
        "https://example.org/down"
    }
}

#[tokio::test]
async fn open_items_are_mailed_once_across_runs() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));
    let mail = MemoryNotifier::new();
    let sources = vec![listing(ANGEBOT)];

    let first = run_once(&sources, &mail, &store, RunOptions::default()).await;
    assert_eq!(
        first.report("wg-ill").unwrap().outcome,
        SourceOutcome::Notified { count: 2 }
    );
    assert_eq!(first.persisted, PersistOutcome::Saved);
    {
        let sent = mail.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains("- 3 Z-WHG: offen"));
        assert!(sent[0].1.contains("- 5 Z-REFH: Anmeldung offen"));
        assert!(!sent[0].1.contains("4 Z-WHG"));
    }

    let second = run_once(&sources, &mail, &store, RunOptions::default()).await;
    let report = second.report("wg-ill").unwrap();
    assert_eq!(report.outcome, SourceOutcome::NothingNew);
    assert_eq!(report.open.len(), 2);
    assert_eq!(report.closed.len(), 1);
    assert_eq!(mail.sent.lock().unwrap().len(), 1);

    let st = store.load();
    assert!(st.is_notified("wg-ill", "3 Z-WHG"));
    assert!(st.is_notified("wg-ill", "5 Z-REFH"));
    assert!(!st.is_notified("wg-ill", "4 Z-WHG"));
}

#[tokio::test]
async fn failed_delivery_leaves_ledger_for_retry() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));
    let mail = MemoryNotifier::failing();
    let sources = vec![listing(ANGEBOT)];

    let failed = run_once(&sources, &mail, &store, RunOptions::default()).await;
    assert!(matches!(
        failed.report("wg-ill").unwrap().outcome,
        SourceOutcome::DeliveryFailed(_)
    ));
    assert!(!store.load().is_notified("wg-ill", "3 Z-WHG"));

    mail.set_failing(false);
    let retried = run_once(&sources, &mail, &store, RunOptions::default()).await;
    assert_eq!(
        retried.report("wg-ill").unwrap().outcome,
        SourceOutcome::Notified { count: 2 }
    );
    assert!(store.load().is_notified("wg-ill", "3 Z-WHG"));
}

#[tokio::test]
async fn notice_page_seeds_then_reports_change() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));
    let mail = MemoryNotifier::new();

    let seed = run_once(&[notice("Stand: Januar")], &mail, &store, RunOptions::default()).await;
    assert_eq!(seed.report("soca").unwrap().outcome, SourceOutcome::FirstObservation);
    assert!(mail.sent.lock().unwrap().is_empty());
    let seeded = store.load().fingerprint("soca").map(str::to_string);
    assert!(seeded.is_some());

    let same = run_once(&[notice("Stand: Januar")], &mail, &store, RunOptions::default()).await;
    assert_eq!(same.report("soca").unwrap().outcome, SourceOutcome::Unchanged);

    let changed = run_once(&[notice("Stand: Februar")], &mail, &store, RunOptions::default()).await;
    assert_eq!(changed.report("soca").unwrap().outcome, SourceOutcome::Changed);
    assert_eq!(mail.sent_subjects(), vec!["Page updated: soca".to_string()]);
    assert_ne!(store.load().fingerprint("soca").map(str::to_string), seeded);
}

#[tokio::test]
async fn failed_change_notice_keeps_old_fingerprint() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));
    let mail = MemoryNotifier::new();

    run_once(&[notice("alt")], &mail, &store, RunOptions::default()).await;
    let before = store.load().fingerprint("soca").map(str::to_string);

    mail.set_failing(true);
    let out = run_once(&[notice("neu")], &mail, &store, RunOptions::default()).await;
    assert!(matches!(
        out.report("soca").unwrap().outcome,
        SourceOutcome::DeliveryFailed(_)
    ));
    assert_eq!(store.load().fingerprint("soca").map(str::to_string), before);

    mail.set_failing(false);
    let out = run_once(&[notice("neu")], &mail, &store, RunOptions::default()).await;
    assert_eq!(out.report("soca").unwrap().outcome, SourceOutcome::Changed);
}

#[tokio::test]
async fn one_failing_source_does_not_block_the_others() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));
    let mail = MemoryNotifier::new();
    let sources: Vec<Box<dyn SourceAdapter>> =
        vec![Box::new(DownSource), listing(ANGEBOT), notice("Stand: Januar")];

    let summary = run_once(&sources, &mail, &store, RunOptions::default()).await;
    assert!(matches!(
        summary.report("down").unwrap().outcome,
        SourceOutcome::FetchFailed(ref e) if e.contains("503")
    ));
    assert_eq!(
        summary.report("wg-ill").unwrap().outcome,
        SourceOutcome::Notified { count: 2 }
    );
    assert_eq!(summary.report("soca").unwrap().outcome, SourceOutcome::FirstObservation);
    assert_eq!(summary.persisted, PersistOutcome::Saved);
}

#[tokio::test]
async fn changed_markup_is_a_warning_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path().join("state.json"));
    let mail = MemoryNotifier::new();
    let sources = vec![listing(include_str!("fixtures/angebot_relaunch.html"))];

    let summary = run_once(&sources, &mail, &store, RunOptions::default()).await;
    assert_eq!(summary.report("wg-ill").unwrap().outcome, SourceOutcome::NoMatches);
    assert!(mail.sent.lock().unwrap().is_empty());
    assert_eq!(summary.persisted, PersistOutcome::Saved);
}

#[tokio::test]
async fn save_failure_is_reported_and_run_completes() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "not a directory").unwrap();
    let store = StateStore::new(blocker.join("state.json"));
    let mail = MemoryNotifier::new();

    let summary = run_once(&[listing(ANGEBOT)], &mail, &store, RunOptions::default()).await;
    assert!(matches!(summary.persisted, PersistOutcome::Failed(_)));
    assert_eq!(mail.sent.lock().unwrap().len(), 1);
    assert!(summary.to_string().contains("[wg-ill]"));
}

#[tokio::test]
async fn dry_run_does_not_touch_state() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state.json");
    let store = StateStore::new(&path);
    let mail = MemoryNotifier::new();

    let summary = run_once(&[listing(ANGEBOT)], &mail, &store, RunOptions { persist: false }).await;
    assert_eq!(summary.persisted, PersistOutcome::Skipped);
    assert!(!path.exists());
}
