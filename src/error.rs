// src/error.rs
//! Error taxonomy of a watch run. Each kind is recovered at a different point:
//! fetch failures skip one source, delivery failures skip one ledger commit,
//! store failures are logged and the run still completes.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("reading body of {url} failed: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("building message failed: {0}")]
    Build(String),
    #[error("transport rejected message: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum PersistStoreError {
    #[error("creating state dir {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("serializing state: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("writing {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("replacing {path}: {source}")]
    Rename {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("config path {0} does not exist")]
    Missing(PathBuf),
    #[error("invalid config: {0}")]
    Invalid(String),
    #[error("missing environment variable {0}")]
    MissingEnv(&'static str),
    #[error("invalid address in {var}: {reason}")]
    Address { var: &'static str, reason: String },
}
