// src/change_detector.rs
//! Whole-content change detection for opaque sources.

use sha2::{Digest, Sha256};
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// Nothing stored yet. Seeds the fingerprint, never notifies.
    FirstObservation,
    Unchanged,
    Changed,
}

/// Lowercase hex SHA-256 of `body`.
pub fn content_hash(body: &[u8]) -> String {
    let digest = Sha256::digest(body);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest.iter() {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Compare the current fingerprint against the stored one, byte for byte.
pub fn detect(current: &str, stored: Option<&str>) -> Detection {
    match stored {
        None => Detection::FirstObservation,
        Some(prev) if prev == current => Detection::Unchanged,
        Some(_) => Detection::Changed,
    }
}
