//! Token management. The token lives in the config file so it survives
//! between invocations; `CHANTAG_ACCESS_TOKEN` still takes precedence.

use std::env;

use serde_json::json;

use super::{CommandOutput, open_cache};
use crate::cli::OutputOptions;
use crate::config::{Config, TOKEN_ENV, mask_sensitive_value};
use crate::error::{ChantagError, Result};

/// Store `token` (from `--token` or the environment) in the config file.
pub fn cmd_auth_login(token: Option<String>, output: OutputOptions) -> Result<()> {
    let token = token
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or(ChantagError::AuthRequired)?;

    let mut config = Config::load()?;
    config.set("auth.token", &token)?;
    config.save()?;

    let masked = mask_sensitive_value(&token);
    CommandOutput::new(json!({
        "action": "login",
        "token": masked,
        "success": true,
    }))
    .with_text(format!("Signed in with token {masked}"))
    .print(output)
}

/// Forget the stored token and clear cached sheet data.
pub fn cmd_auth_logout(output: OutputOptions) -> Result<()> {
    let mut config = Config::load()?;
    let had_token = config.auth.token.take().is_some();
    config.save()?;
    open_cache(&config).clear_all();

    let mut text = "Signed out".to_string();
    if env::var(TOKEN_ENV).is_ok_and(|t| !t.is_empty()) {
        text.push_str(&format!("\nNote: {TOKEN_ENV} is still set in the environment"));
    }

    CommandOutput::new(json!({
        "action": "logout",
        "removed_token": had_token,
        "success": true,
    }))
    .with_text(text)
    .print(output)
}

pub fn cmd_auth_status(output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let source = if env::var(TOKEN_ENV).is_ok_and(|t| !t.is_empty()) {
        Some("environment")
    } else if config.auth.token.as_deref().is_some_and(|t| !t.is_empty()) {
        Some("config")
    } else {
        None
    };

    let text = match source {
        Some(source) => format!("Signed in (token from {source})"),
        None => "Not signed in".to_string(),
    };

    CommandOutput::new(json!({
        "authenticated": source.is_some(),
        "source": source,
    }))
    .with_text(text)
    .print(output)
}
