//! Configuration commands.
//!
//! - `config show`: Display current configuration
//! - `config get`: Print one value
//! - `config set`: Set a configuration value

use owo_colors::OwoColorize;
use serde_json::json;

use super::CommandOutput;
use crate::cli::OutputOptions;
use crate::config::{CONFIG_KEYS, Config};
use crate::error::Result;

/// Show current configuration
pub fn cmd_config_show(output: OutputOptions) -> Result<()> {
    let config = Config::load()?;

    let mut values = serde_json::Map::new();
    let mut text_output = format!("{}\n\n", "Configuration:".cyan().bold());
    for key in CONFIG_KEYS {
        let value = config.get(key)?;
        let shown = match &value {
            Some(v) => v.clone(),
            None => "not configured".dimmed().to_string(),
        };
        text_output.push_str(&format!("  {}: {shown}\n", key.cyan()));
        values.insert(key.to_string(), json!(value));
    }

    let token_available = config.access_token().is_some();
    values.insert("token_available".to_string(), json!(token_available));
    values.insert(
        "config_file".to_string(),
        json!(Config::config_path().to_string_lossy()),
    );

    text_output.push('\n');
    text_output.push_str(&format!(
        "{}",
        format!("Config file: {}", Config::config_path().display()).dimmed()
    ));

    CommandOutput::new(json!(values))
        .with_text(text_output)
        .print(output)
}

/// Print a single configuration value
pub fn cmd_config_get(key: &str, output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let value = config.get(key)?;

    CommandOutput::new(json!({
        "key": key,
        "value": value,
    }))
    .with_text(value.unwrap_or_default())
    .print(output)
}

/// Set a configuration value
pub fn cmd_config_set(key: &str, value: &str, output: OutputOptions) -> Result<()> {
    let mut config = Config::load()?;
    config.set(key, value)?;
    config.save()?;

    // Read back so secrets come out masked.
    let shown = config.get(key)?.unwrap_or_default();

    CommandOutput::new(json!({
        "action": "config_set",
        "key": key,
        "value": shown,
        "success": true,
    }))
    .with_text(format!("Set {} = {}", key.cyan(), shown))
    .print(output)
}
