//! Runtime configuration, read from the environment.

use std::{env, fmt::Display, str::FromStr};

use anyhow::{Context, bail};
use chrono::Duration;
use tracing::{info, warn};

const DEV_JWT_SECRET: &str = "storefront-dev-secret";

/// How checkout and status changes touch stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StockMode {
    /// Check, insert, then decrement as separate store calls. Status changes
    /// read, adjust stock, then write without a version check.
    #[default]
    Baseline,
    /// Conditional per-line reservations before the insert, and a
    /// version-checked status write before any stock adjustment.
    Atomic,
}

impl FromStr for StockMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "baseline" => Ok(StockMode::Baseline),
            "atomic" => Ok(StockMode::Atomic),
            other => bail!("unknown stock mode '{other}' (expected 'baseline' or 'atomic')"),
        }
    }
}

impl Display for StockMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StockMode::Baseline => f.write_str("baseline"),
            StockMode::Atomic => f.write_str("atomic"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub otp_ttl: Duration,
    pub otp_max_attempts: u32,
    /// Normalized (lowercase) emails that get the admin role on account creation.
    pub admin_emails: Vec<String>,
    /// When set, Postgres stores are used; otherwise everything is in memory.
    pub database_url: Option<String>,
    pub stock_mode: StockMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl: Duration::days(30),
            otp_ttl: Duration::seconds(300),
            otp_max_attempts: 5,
            admin_emails: Vec::new(),
            database_url: None,
            stock_mode: StockMode::Baseline,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(s) if !s.trim().is_empty() => s,
            _ => {
                warn!("JWT_SECRET not set, using insecure development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let admin_emails = env::var("ADMIN_EMAILS")
            .map(|raw| parse_admin_emails(&raw))
            .unwrap_or_default();

        let database_url = env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty());
        if database_url.is_none() {
            info!("DATABASE_URL not set, using in-memory stores");
        }

        Ok(Self {
            bind_addr: try_load("BIND_ADDR", "0.0.0.0:8080")?,
            jwt_secret,
            token_ttl: Duration::seconds(try_load("TOKEN_TTL_SECS", "2592000")?),
            otp_ttl: Duration::seconds(try_load("OTP_TTL_SECS", "300")?),
            otp_max_attempts: try_load("OTP_MAX_ATTEMPTS", "5")?,
            admin_emails,
            database_url,
            stock_mode: try_load("STOCK_MODE", "baseline")?,
        })
    }
}

fn try_load<T>(key: &str, default: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });
    raw.parse()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("invalid {key} value '{raw}'"))
}

fn parse_admin_emails(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
        .collect()
}
