use serde_json::json;

use super::{CommandOutput, open_cache};
use crate::cli::OutputOptions;
use crate::config::Config;
use crate::error::Result;
use crate::paths;

pub fn cmd_cache_status(output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let cache = open_cache(&config);
    let path = paths::cache_file_path();
    let mut entries = cache.entries();
    entries.sort();

    let mut text = String::from("Cache status:\n");
    text.push_str(&format!("  Path: {}\n", path.display()));
    text.push_str(&format!("  TTL: {}s\n", config.cache_ttl_secs));
    if entries.is_empty() {
        text.push_str("  Entries: none");
    } else {
        text.push_str(&format!("  Entries: {}", entries.join(", ")));
    }

    CommandOutput::new(json!({
        "path": path.to_string_lossy(),
        "ttl_secs": config.cache_ttl_secs,
        "entries": entries,
    }))
    .with_text(text)
    .print(output)
}

pub fn cmd_cache_clear(output: OutputOptions) -> Result<()> {
    let config = Config::load()?;
    let cache = open_cache(&config);
    let removed = cache.entries().len();
    cache.clear_all();

    CommandOutput::new(json!({
        "action": "cleared",
        "removed": removed,
    }))
    .with_text(format!("Cleared {removed} cache entr{}", if removed == 1 { "y" } else { "ies" }))
    .print(output)
}
