// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod change_detector;
pub mod config;
pub mod error;
pub mod gatekeeper;
pub mod notify;
pub mod runner;
pub mod source;
pub mod state;

pub use crate::config::WatchConfig;
pub use crate::notify::{DryRunNotifier, EmailNotifier, MemoryNotifier, Notifier};
pub use crate::runner::{run_once, RunOptions, RunSummary};
pub use crate::state::{PersistedState, StateStore};
