//! Delivery of one-time login codes.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::error::ServiceError;

#[async_trait]
pub trait OtpMailer: Send + Sync {
    async fn send_code(&self, email: &str, code: &str, expires_at: DateTime<Utc>) -> Result<(), ServiceError>;
}

/// Writes the delivery to the log instead of sending mail. The code itself
/// only appears at `debug`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl OtpMailer for LogMailer {
    async fn send_code(&self, email: &str, code: &str, expires_at: DateTime<Utc>) -> Result<(), ServiceError> {
        info!(email = %email, expires_at = %expires_at, "login code issued");
        debug!(email = %email, code = %code, "login code");
        Ok(())
    }
}

/// Keeps every delivered `(email, code)` pair. Used by tests to log in.
#[derive(Debug, Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent code delivered to `email`.
    pub fn last_code_for(&self, email: &str) -> Option<String> {
        let sent = self.sent.lock().ok()?;
        sent.iter()
            .rev()
            .find(|(to, _)| to == email)
            .map(|(_, code)| code.clone())
    }
}

#[async_trait]
impl OtpMailer for RecordingMailer {
    async fn send_code(&self, email: &str, code: &str, _expires_at: DateTime<Utc>) -> Result<(), ServiceError> {
        self.sent
            .lock()
            .map_err(|_| ServiceError::Internal("mailer lock poisoned".to_string()))?
            .push((email.to_string(), code.to_string()));
        Ok(())
    }
}
