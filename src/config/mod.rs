// src/config/mod.rs
pub mod watch;

pub use watch::{OperatorConfig, SourceConfig, SourceKind, WatchConfig};
