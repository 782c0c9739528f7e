use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::TimeDelta;
use tracing::warn;

/// Placeholder JWT secret used when none is configured outside production.
pub const DEV_JWT_SECRET: &str = "dev-secret-change-me";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

/// Runtime configuration, read from `QUILL_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub jwt_ttl: TimeDelta,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub environment: Environment,
    /// Accounts registered with one of these emails start as admins.
    pub admin_emails: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            db_path: "quill.db".into(),
            jwt_secret: DEV_JWT_SECRET.into(),
            jwt_ttl: TimeDelta::days(30),
            upload_dir: "./uploads".into(),
            max_upload_bytes: 10 * 1024 * 1024,
            environment: Environment::Development,
            admin_emails: vec![],
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; missing keys fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let environment = match lookup("QUILL_ENV").as_deref() {
            Some("production") => Environment::Production,
            _ => Environment::Development,
        };

        let jwt_secret = match lookup("QUILL_JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) if secret == DEV_JWT_SECRET && environment == Environment::Production => {
                bail!("QUILL_JWT_SECRET is still the development placeholder")
            }
            Some(secret) => secret,
            None if environment == Environment::Production => {
                bail!("QUILL_JWT_SECRET must be set in production")
            }
            None => {
                warn!("QUILL_JWT_SECRET unset, using the development placeholder");
                defaults.jwt_secret
            }
        };

        let port = match lookup("QUILL_PORT") {
            Some(p) => p.parse().with_context(|| format!("invalid QUILL_PORT '{}'", p))?,
            None => defaults.port,
        };

        let jwt_ttl = match lookup("QUILL_JWT_EXPIRES_IN") {
            Some(raw) => parse_ttl(&raw)?,
            None => defaults.jwt_ttl,
        };

        let max_upload_bytes = match lookup("QUILL_MAX_UPLOAD_BYTES") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("invalid QUILL_MAX_UPLOAD_BYTES '{}'", raw))?,
            None => defaults.max_upload_bytes,
        };

        let admin_emails = lookup("QUILL_ADMIN_EMAILS")
            .map(|raw| {
                raw.split(',')
                    .map(|e| e.trim().to_lowercase())
                    .filter(|e| !e.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            host: lookup("QUILL_HOST").unwrap_or(defaults.host),
            port,
            db_path: lookup("QUILL_DB_PATH").map(PathBuf::from).unwrap_or(defaults.db_path),
            jwt_secret,
            jwt_ttl,
            upload_dir: lookup("QUILL_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes,
            environment,
            admin_emails,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails.iter().any(|e| e == email)
    }
}

/// `"30d"`, `"12h"`, `"45m"`, `"90s"` or bare seconds.
pub fn parse_ttl(raw: &str) -> Result<TimeDelta> {
    let raw = raw.trim();
    let (digits, unit) = match raw.char_indices().last() {
        Some((idx, c)) if c.is_ascii_alphabetic() => (&raw[..idx], c),
        _ => (raw, 's'),
    };
    let n: i64 = digits
        .parse()
        .with_context(|| format!("invalid token lifetime '{}'", raw))?;
    if n <= 0 {
        bail!("token lifetime must be positive, got '{}'", raw);
    }

    let ttl = match unit {
        's' => TimeDelta::try_seconds(n),
        'm' => TimeDelta::try_minutes(n),
        'h' => TimeDelta::try_hours(n),
        'd' => TimeDelta::try_days(n),
        other => bail!("unknown token lifetime unit '{}' in '{}'", other, raw),
    };
    ttl.with_context(|| format!("token lifetime '{}' out of range", raw))
}
