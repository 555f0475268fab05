//! One-time login codes for the passwordless flow.
//!
//! A challenge is issued per email and consumed by a successful login. The
//! rules here are pure; storage and delivery live in infra.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use thiserror::Error;

pub const CODE_LEN: usize = 6;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OtpError {
    #[error("no login code was requested for this email")]
    NotRequested,

    #[error("login code has expired")]
    Expired,

    #[error("invalid login code")]
    Mismatch,

    #[error("too many attempts; request a new code")]
    TooManyAttempts,
}

/// Generate a zero-padded numeric code.
pub fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    format!("{:0width$}", rng.gen_range(0..1_000_000u32), width = CODE_LEN)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpChallenge {
    code: String,
    expires_at: DateTime<Utc>,
    attempts_left: u32,
}

impl OtpChallenge {
    pub fn issue(code: impl Into<String>, now: DateTime<Utc>, ttl: Duration, max_attempts: u32) -> Self {
        Self {
            code: code.into(),
            expires_at: now + ttl,
            attempts_left: max_attempts.max(1),
        }
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Check a submitted code. Every call burns one attempt; the caller
    /// discards the challenge on success or on any terminal error.
    pub fn verify(&mut self, submitted: &str, now: DateTime<Utc>) -> Result<(), OtpError> {
        if now >= self.expires_at {
            return Err(OtpError::Expired);
        }
        if self.attempts_left == 0 {
            return Err(OtpError::TooManyAttempts);
        }
        self.attempts_left -= 1;

        if submitted.trim() == self.code {
            Ok(())
        } else if self.attempts_left == 0 {
            Err(OtpError::TooManyAttempts)
        } else {
            Err(OtpError::Mismatch)
        }
    }
}
