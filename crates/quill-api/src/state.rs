use std::sync::Arc;

use tracing::error;
use uuid::Uuid;

use quill_db::Database;

use crate::config::Config;
use crate::error::ApiError;
use crate::password::Passwords;
use crate::token;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub db: Database,
    pub config: Config,
    pub passwords: Passwords,
}

impl AppStateInner {
    pub fn new(db: Database, config: Config, passwords: Passwords) -> AppState {
        Arc::new(Self {
            db,
            config,
            passwords,
        })
    }

    /// Run blocking store work off the async runtime.
    pub async fn query<F, T>(self: &Arc<Self>, f: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let state = Arc::clone(self);
        let result = tokio::task::spawn_blocking(move || f(&state.db))
            .await
            .map_err(|e| {
                error!("spawn_blocking join error: {}", e);
                ApiError::Internal(e.into())
            })?;
        Ok(result?)
    }

    /// Argon2 is deliberately slow, so it gets a blocking thread too.
    pub async fn hash_password(&self, password: String) -> Result<String, ApiError> {
        let passwords = self.passwords.clone();
        let hash = tokio::task::spawn_blocking(move || passwords.hash(&password))
            .await
            .map_err(|e| ApiError::Internal(e.into()))??;
        Ok(hash)
    }

    pub async fn verify_password(&self, password: String, hash: String) -> Result<bool, ApiError> {
        let passwords = self.passwords.clone();
        let ok = tokio::task::spawn_blocking(move || passwords.verify(&password, &hash))
            .await
            .map_err(|e| ApiError::Internal(e.into()))??;
        Ok(ok)
    }

    pub fn issue_token(&self, user_id: Uuid) -> Result<String, ApiError> {
        Ok(token::issue(&self.config.jwt_secret, user_id, self.config.jwt_ttl)?)
    }
}
