// src/config/watch.rs
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::state::DEFAULT_STATE_PATH;

pub const ENV_CONFIG_PATH: &str = "WATCH_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/watch.toml";

fn default_closed_sentinel() -> String {
    "geschlossen".to_string()
}
fn default_state_path() -> PathBuf {
    PathBuf::from(DEFAULT_STATE_PATH)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Itemized,
    Opaque,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    pub kind: SourceKind,
    pub url: String,
    /// Label substrings to watch (itemized only).
    #[serde(default)]
    pub watch: Vec<String>,
    #[serde(default = "default_closed_sentinel")]
    pub closed_sentinel: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OperatorConfig {
    /// Overridden by NOTIFY_EMAIL_TO.
    pub to: Option<String>,
    /// Overridden by NOTIFY_EMAIL_FROM; falls back to SMTP_USER.
    pub from: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WatchConfig {
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
    #[serde(default)]
    pub operator: OperatorConfig,
    pub sources: Vec<SourceConfig>,
}

impl WatchConfig {
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let cfg: WatchConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        cfg.validated()
    }

    /// Resolve the config path in order:
    /// 1) `explicit` (e.g. from `--config`)
    /// 2) $WATCH_CONFIG_PATH
    /// 3) config/watch.toml
    pub fn load_default(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => std::env::var(ENV_CONFIG_PATH)
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH)),
        };
        if !path.exists() {
            return Err(ConfigError::Missing(path));
        }
        Self::load_from(&path)
    }

    pub fn source(&self, id: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.id == id)
    }

    fn validated(mut self) -> Result<Self, ConfigError> {
        if self.sources.is_empty() {
            return Err(ConfigError::Invalid("no sources configured".into()));
        }
        let mut ids = HashSet::new();
        for s in &mut self.sources {
            s.id = s.id.trim().to_string();
            if s.id.is_empty() {
                return Err(ConfigError::Invalid("source with empty id".into()));
            }
            if !ids.insert(s.id.clone()) {
                return Err(ConfigError::Invalid(format!("duplicate source id {}", s.id)));
            }
            if s.url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("source {} has no url", s.id)));
            }
            if s.kind == SourceKind::Itemized {
                s.watch = clean_list(std::mem::take(&mut s.watch));
                if s.watch.is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "itemized source {} needs a non-empty watch list",
                        s.id
                    )));
                }
                if s.closed_sentinel.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "itemized source {} needs a closed_sentinel",
                        s.id
                    )));
                }
            }
        }
        Ok(self)
    }
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut set = BTreeSet::new();
    for it in items {
        let t = it.trim();
        if !t.is_empty() {
            set.insert(t.to_string());
        }
    }
    set.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Result<WatchConfig, ConfigError> {
        let cfg: WatchConfig = toml::from_str(s).expect("toml");
        cfg.validated()
    }

    #[test]
    fn watch_list_is_trimmed_and_deduped() {
        let cfg = parse(
            r#"
            [[sources]]
            id = "wg-ill"
            kind = "itemized"
            url = "https://example.org/angebot"
            watch = [" 3 Z-WHG ", "", "2 Z-WHG", "3 Z-WHG"]
            "#,
        )
        .unwrap();
        let s = cfg.source("wg-ill").unwrap();
        assert_eq!(s.watch, vec!["2 Z-WHG".to_string(), "3 Z-WHG".to_string()]);
        assert_eq!(s.closed_sentinel, "geschlossen");
        assert_eq!(cfg.state_path, PathBuf::from(DEFAULT_STATE_PATH));
    }

    #[test]
    fn itemized_without_watch_is_rejected() {
        let err = parse(
            r#"
            [[sources]]
            id = "wg-ill"
            kind = "itemized"
            url = "https://example.org/angebot"
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = parse(
            r#"
            [[sources]]
            id = "soca"
            kind = "opaque"
            url = "https://example.org/a"
            [[sources]]
            id = " soca"
            kind = "opaque"
            url = "https://example.org/b"
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("duplicate"));
    }

    #[test]
    fn empty_source_list_is_rejected() {
        assert!(parse("sources = []").is_err());
    }
}
