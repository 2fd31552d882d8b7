// src/source/http.rs
use reqwest::Client;

use crate::error::FetchError;

async fn get_ok(client: &Client, url: &str) -> Result<reqwest::Response, FetchError> {
    let resp = client.get(url).send().await.map_err(|source| FetchError::Transport {
        url: url.to_string(),
        source,
    })?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(resp)
}

/// GET `url` and decode the body as text (charset from headers, UTF-8 otherwise).
pub async fn get_text(client: &Client, url: &str) -> Result<String, FetchError> {
    get_ok(client, url)
        .await?
        .text()
        .await
        .map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })
}

/// GET `url` and return the raw body bytes.
pub async fn get_bytes(client: &Client, url: &str) -> Result<Vec<u8>, FetchError> {
    let bytes = get_ok(client, url)
        .await?
        .bytes()
        .await
        .map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;
    Ok(bytes.to_vec())
}
