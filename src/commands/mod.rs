mod auth;
mod cache;
mod config;
mod ls;
mod refresh;
mod stats;
mod suggest;
mod tag;
mod tags;

pub use auth::{cmd_auth_login, cmd_auth_logout, cmd_auth_status};
pub use cache::{cmd_cache_clear, cmd_cache_status};
pub use config::{cmd_config_get, cmd_config_set, cmd_config_show};
pub use ls::{LsOptions, cmd_ls};
pub use refresh::cmd_refresh;
pub use stats::cmd_stats;
pub use suggest::cmd_suggest;
pub use tag::cmd_tag;
pub use tags::cmd_tags;

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;

use crate::auth::{AuthProvider, TokenAuth};
use crate::cache::{CacheStore, FileBackend, SystemClock};
use crate::cli::OutputOptions;
use crate::config::Config;
use crate::error::Result;
use crate::notify::ConsoleNotifier;
use crate::paths;
use crate::remote::{MemorySheet, SheetSource, SheetsClient};
use crate::session::Session;

/// Flags accepted before or after any subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub offline: Option<PathBuf>,
    pub assume_yes: bool,
}

/// A command result with a JSON form and an optional human form.
pub struct CommandOutput {
    json: Value,
    text: Option<String>,
}

impl CommandOutput {
    pub fn new(json: Value) -> Self {
        Self { json, text: None }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Print JSON when asked for, else the text form (falling back to JSON).
    pub fn print(self, output: OutputOptions) -> Result<()> {
        match self.text {
            Some(text) if !output.json => {
                println!("{text}");
                Ok(())
            }
            _ => print_json(&self.json),
        }
    }
}

pub fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// The on-disk cache shared by every CLI invocation.
pub fn open_cache(config: &Config) -> CacheStore {
    CacheStore::new(
        Arc::new(FileBackend::new(paths::cache_file_path())),
        Arc::new(SystemClock),
        config.cache_ttl(),
    )
}

/// Build a session from config and flags, without loading it.
///
/// Offline runs read and write the fixture file and need no token.
pub fn open_session(global: &GlobalOptions, output: OutputOptions) -> Result<Session> {
    let config = Config::load()?;

    let (remote, auth): (Arc<dyn SheetSource>, Arc<dyn AuthProvider>) = match &global.offline {
        Some(fixture) => {
            tracing::debug!("Running offline against {}", fixture.display());
            (
                Arc::new(MemorySheet::open(fixture)?),
                Arc::new(TokenAuth::signed_in("offline")),
            )
        }
        None => {
            let auth: Arc<dyn AuthProvider> = Arc::new(TokenAuth::from_config(&config));
            let client = SheetsClient::from_config(&config, auth.clone())?;
            (Arc::new(client), auth)
        }
    };

    let notifier = Arc::new(ConsoleNotifier::new(global.assume_yes).quiet(output.json));
    Ok(Session::from_config(
        &config,
        remote,
        auth,
        open_cache(&config),
        notifier,
    ))
}

/// [`open_session`] then load it.
pub async fn load_session(global: &GlobalOptions, output: OutputOptions) -> Result<Session> {
    let mut session = open_session(global, output)?;
    session.load().await?;
    Ok(session)
}
