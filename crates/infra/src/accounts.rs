//! Passwordless accounts: registration, one-time codes and token issue.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{info, warn};

use storefront_auth::{
    JwtIssuer, OtpChallenge, Principal, Role, User, derive_name_from_email, generate_code,
    normalize_email,
};

use crate::error::ServiceError;
use crate::mailer::OtpMailer;
use crate::store::{OtpStore, StoreError, UserStore};

/// Result of a successful login.
#[derive(Debug, Clone)]
pub struct Session {
    pub token: String,
    pub user: User,
}

pub struct AccountService {
    users: Arc<dyn UserStore>,
    otps: Arc<dyn OtpStore>,
    mailer: Arc<dyn OtpMailer>,
    issuer: Arc<dyn JwtIssuer>,
    otp_ttl: Duration,
    otp_max_attempts: u32,
    admin_emails: Vec<String>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserStore>,
        otps: Arc<dyn OtpStore>,
        mailer: Arc<dyn OtpMailer>,
        issuer: Arc<dyn JwtIssuer>,
    ) -> Self {
        Self {
            users,
            otps,
            mailer,
            issuer,
            otp_ttl: Duration::seconds(300),
            otp_max_attempts: 5,
            admin_emails: Vec::new(),
        }
    }

    pub fn with_otp_policy(mut self, ttl: Duration, max_attempts: u32) -> Self {
        self.otp_ttl = ttl;
        self.otp_max_attempts = max_attempts;
        self
    }

    pub fn with_admin_emails(mut self, emails: Vec<String>) -> Self {
        self.admin_emails = emails;
        self
    }

    fn role_for(&self, email: &str) -> Role {
        if self.admin_emails.iter().any(|e| e == email) {
            Role::ADMIN
        } else {
            Role::USER
        }
    }

    pub async fn register(&self, name: &str, email: &str) -> Result<User, ServiceError> {
        let email = normalize_email(email)?;
        if self.users.find_by_email(&email).await?.is_some() {
            return Err(already_exists());
        }

        let user = User::register(name, &email, self.role_for(&email), Utc::now())?;
        let user = self.users.insert(user).await.map_err(|e| match e {
            StoreError::Duplicate(_) => already_exists(),
            other => other.into(),
        })?;

        info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    /// Issue a fresh code for `email`, replacing any outstanding one.
    /// Returns when the code expires.
    pub async fn request_otp(&self, email: &str) -> Result<DateTime<Utc>, ServiceError> {
        let email = normalize_email(email)?;
        let code = generate_code(&mut rand::thread_rng());
        let challenge = OtpChallenge::issue(code.clone(), Utc::now(), self.otp_ttl, self.otp_max_attempts);
        let expires_at = challenge.expires_at();

        self.otps.put(&email, challenge).await?;
        self.mailer.send_code(&email, &code, expires_at).await?;
        Ok(expires_at)
    }

    /// Exchange a valid code for a signed token. Unknown emails get an
    /// account on first login.
    pub async fn login(&self, email: &str, otp: &str) -> Result<Session, ServiceError> {
        let email = normalize_email(email)?;
        let now = Utc::now();

        self.otps.verify_and_consume(&email, otp, now).await??;

        let user = match self.users.find_by_email(&email).await? {
            Some(user) => user,
            None => self.create_on_login(&email, now).await?,
        };

        let token = self.issuer.issue(user.id, &user.email, user.role.clone(), now)?;
        info!(user_id = %user.id, "user logged in");
        Ok(Session { token, user })
    }

    async fn create_on_login(&self, email: &str, now: DateTime<Utc>) -> Result<User, ServiceError> {
        let user = User::register(&derive_name_from_email(email), email, self.role_for(email), now)?;
        match self.users.insert(user).await {
            Ok(user) => {
                info!(user_id = %user.id, "account created at first login");
                Ok(user)
            }
            Err(StoreError::Duplicate(_)) => {
                warn!("concurrent first login; using the existing account");
                self.users
                    .find_by_email(email)
                    .await?
                    .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn me(&self, principal: &Principal) -> Result<User, ServiceError> {
        self.users
            .get(principal.user_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound("User not found".to_string()))
    }
}

/// The storefront matches on this exact message; it is a plain 400.
fn already_exists() -> ServiceError {
    ServiceError::Validation("User already exists".to_string())
}
