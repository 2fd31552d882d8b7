// src/source/notice.rs
//! Opaque source: only the SHA-256 of the body matters.

use async_trait::async_trait;

use super::{http, SourceAdapter, SourceSnapshot};
use crate::change_detector::content_hash;
use crate::error::FetchError;

pub struct NoticePage {
    id: String,
    location: String,
    mode: Mode,
}

enum Mode {
    Fixture(Vec<u8>),
    Http { client: reqwest::Client },
}

impl NoticePage {
    pub fn from_url(id: &str, url: &str, client: reqwest::Client) -> Self {
        Self {
            id: id.to_string(),
            location: url.to_string(),
            mode: Mode::Http { client },
        }
    }

    pub fn from_fixture(id: &str, location: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            id: id.to_string(),
            location: location.to_string(),
            mode: Mode::Fixture(body.into()),
        }
    }

    fn snapshot(&self, body: &[u8]) -> SourceSnapshot {
        let hash = content_hash(body);
        tracing::debug!(source = %self.id, bytes = body.len(), hash = %hash, "hashed page");
        SourceSnapshot::Opaque {
            source_id: self.id.clone(),
            content_hash: hash,
        }
    }
}

#[async_trait]
impl SourceAdapter for NoticePage {
    async fn fetch(&self) -> Result<SourceSnapshot, FetchError> {
        match &self.mode {
            Mode::Fixture(body) => Ok(self.snapshot(body)),
            Mode::Http { client } => {
                let body = http::get_bytes(client, &self.location).await?;
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
