//! Authentication for the spreadsheet API.
//!
//! Only bearer tokens are supported. A token comes from `CHANTAG_ACCESS_TOKEN`
//! or `auth.token` in the config file; signing in activates it and signing out
//! forgets it for the rest of the process.

use async_trait::async_trait;
use parking_lot::RwLock;
use secrecy::{ExposeSecret, SecretString};

use crate::config::Config;
use crate::error::{ChantagError, Result};

/// Identity provider used to gate every remote call.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    fn is_authenticated(&self) -> bool;

    /// The active bearer token, if signed in.
    fn token(&self) -> Option<SecretString>;

    async fn sign_in(&self) -> Result<()>;

    async fn sign_out(&self) -> Result<()>;
}

/// Bearer-token provider.
pub struct TokenAuth {
    configured: Option<SecretString>,
    active: RwLock<Option<SecretString>>,
}

impl TokenAuth {
    /// Signed in already when a token is configured.
    pub fn from_config(config: &Config) -> Self {
        match config.access_token() {
            Some(token) => Self::signed_in(token),
            None => Self::signed_out(),
        }
    }

    pub fn signed_in(token: impl Into<String>) -> Self {
        let token: String = token.into();
        Self {
            configured: Some(SecretString::from(token.clone())),
            active: RwLock::new(Some(SecretString::from(token))),
        }
    }

    /// No token available; `sign_in` fails.
    pub fn signed_out() -> Self {
        Self {
            configured: None,
            active: RwLock::new(None),
        }
    }
}

impl std::fmt::Debug for TokenAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenAuth")
            .field("configured", &self.configured.is_some())
            .field("active", &self.is_authenticated())
            .finish()
    }
}

#[async_trait]
impl AuthProvider for TokenAuth {
    fn is_authenticated(&self) -> bool {
        self.active.read().is_some()
    }

    fn token(&self) -> Option<SecretString> {
        self.active
            .read()
            .as_ref()
            .map(|t| SecretString::from(t.expose_secret().to_string()))
    }

    async fn sign_in(&self) -> Result<()> {
        if self.is_authenticated() {
            return Ok(());
        }
        let token = self
            .configured
            .as_ref()
            .ok_or(ChantagError::AuthRequired)?;
        *self.active.write() = Some(SecretString::from(token.expose_secret().to_string()));
        tracing::info!("Signed in with configured access token");
        Ok(())
    }

    async fn sign_out(&self) -> Result<()> {
        *self.active.write() = None;
        tracing::info!("Signed out");
        Ok(())
    }
}
