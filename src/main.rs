//! vacancy-watch — binary entrypoint.
//! Loads config + env, runs one watch cycle (or one per `--every` tick).

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vacancy_watch::{
    run_once, source, DryRunNotifier, EmailNotifier, Notifier, RunOptions, StateStore, WatchConfig,
};

#[derive(Debug, Parser)]
#[command(name = "vacancy-watch", version, about)]
struct Cli {
    /// Config file; defaults to $WATCH_CONFIG_PATH, then config/watch.toml
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print messages instead of sending them and leave the state file alone
    #[arg(long)]
    dry_run: bool,

    /// Repeat every N seconds instead of running once
    #[arg(long, value_name = "SECS")]
    every: Option<u64>,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("vacancy_watch=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env if present; SMTP credentials usually live there.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let cfg = WatchConfig::load_default(cli.config.as_deref()).context("loading config")?;

    let notifier: Box<dyn Notifier> = if cli.dry_run {
        Box::new(DryRunNotifier)
    } else {
        Box::new(EmailNotifier::from_env(&cfg.operator).context("configuring SMTP")?)
    };
    let sources = source::build_sources(&cfg);
    let store = StateStore::new(&cfg.state_path);
    let opts = RunOptions {
        persist: !cli.dry_run,
    };

    match cli.every {
        None => {
            let summary = run_once(&sources, notifier.as_ref(), &store, opts).await;
            println!("{summary}");
        }
        Some(secs) => {
            tracing::info!(interval_secs = secs, "watching");
            let mut ticker = tokio::time::interval(Duration::from_secs(secs.max(1)));
            // Cycles never overlap: the next tick is awaited only after a run finishes.
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let summary = run_once(&sources, notifier.as_ref(), &store, opts).await;
                println!("{summary}");
            }
        }
    }

    Ok(())
}
