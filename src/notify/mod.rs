// src/notify/mod.rs
pub mod email;
pub mod message;

use std::sync::Mutex;

use crate::error::DeliveryError;

pub use email::EmailNotifier;
pub use message::Message;

/// Delivery is all-or-nothing from the caller's point of view: `Ok` means the
/// transport accepted the message and the ledger may be committed.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, subject: &str, body: &str) -> Result<(), DeliveryError>;
}

/// Logs instead of sending. Used by `--dry-run`.
pub struct DryRunNotifier;

#[async_trait::async_trait]
impl Notifier for DryRunNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), DeliveryError> {
        tracing::info!(%subject, "dry-run: message not sent");
        println!("--- {subject}\n{body}");
        Ok(())
    }
}

/// Keeps sent messages in memory; can be switched to fail every send.
#[derive(Default)]
pub struct MemoryNotifier {
    pub sent: Mutex<Vec<(String, String)>>,
    fail: Mutex<bool>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let n = Self::default();
        n.set_failing(true);
        n
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub fn sent_subjects(&self) -> Vec<String> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(s, _)| s.clone())
            .collect()
    }
}

#[async_trait::async_trait]
impl Notifier for MemoryNotifier {
    async fn send(&self, subject: &str, body: &str) -> Result<(), DeliveryError> {
        if *self.fail.lock().unwrap() {
            return Err(DeliveryError::Transport("simulated outage".into()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
        Ok(())
    }
}
