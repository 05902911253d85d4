//! Best-effort side channels: customer email and domain event publishing.
//!
//! Failures here are logged by the caller and never unwind the request that
//! triggered them.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::domain::events::DomainEvent;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Mail delivery failed: {0}")]
    Mail(String),
    #[error("Event publish failed: {0}")]
    Publish(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: Email) -> Result<(), NotifyError>;
}

/// Writes mail to the log instead of delivering it.
#[derive(Debug, Default, Clone)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: Email) -> Result<(), NotifyError> {
        info!(to = %email.to, subject = %email.subject, "email queued");
        Ok(())
    }
}

/// Publishes domain events to NATS when a connection is configured.
#[derive(Clone, Default)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
}

impl EventPublisher {
    pub fn new(nats: Option<async_nats::Client>) -> Self { Self { nats } }

    pub fn disabled() -> Self { Self::default() }

    pub async fn publish(&self, event: DomainEvent) {
        let Some(client) = &self.nats else { return };
        let subject = event.subject();
        let result = match serde_json::to_vec(&event) {
            Ok(payload) => client
                .publish(subject.to_string(), payload.into())
                .await
                .map_err(|e| NotifyError::Publish(e.to_string())),
            Err(e) => Err(NotifyError::Publish(e.to_string())),
        };
        if let Err(e) = result {
            warn!(subject, error = %e, "domain event dropped");
        }
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    /// Records every email; fails when `fail` is set.
    #[derive(Default)]
    pub struct RecordingMailer {
        pub sent: Mutex<Vec<Email>>,
        pub fail: bool,
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, email: Email) -> Result<(), NotifyError> {
            if self.fail {
                return Err(NotifyError::Mail("smtp unavailable".into()));
            }
            self.sent.lock().unwrap().push(email);
            Ok(())
        }
    }
}
